//! Concurrent lookup of external document metadata.

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata request for document {id} failed: {message}")]
    Request { id: u64, message: String },
    #[error("metadata for document {id} could not be decoded: {message}")]
    Decode { id: u64, message: String },
}

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, id: u64) -> Result<DocumentMetadata, MetadataError>;
}

/// Fetch metadata for every id concurrently.
///
/// Results keep the order of `ids`. The first failure fails the whole batch
/// and the remaining in-flight requests are dropped.
pub async fn fetch_all_metadata(
    fetcher: &dyn MetadataFetcher,
    ids: &[u64],
) -> Result<Vec<DocumentMetadata>, MetadataError> {
    let results = try_join_all(ids.iter().map(|id| fetcher.fetch(*id))).await?;
    for metadata in &results {
        info!(
            target = "notifier::application::metadata",
            document_id = metadata.id,
            "[METADATA] Doc {}: {}",
            metadata.id,
            metadata.title
        );
    }
    Ok(results)
}
