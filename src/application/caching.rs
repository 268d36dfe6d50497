//! Read-through cache for the document listing payload.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::repos::{DocumentsRepo, RepoError};
use crate::cache::{CacheBackend, get_or_set};

/// Fixed key under which the listing payload is stored.
pub const DOCUMENT_LIST_CACHE_KEY: &str = "notifier.documents:list";

/// Default lifetime of the cached listing.
pub const DOCUMENT_LIST_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub title: String,
    pub description: String,
}

/// Serves `{title, description}` pairs for every document, newest first.
///
/// Within the TTL window repeated reads return the stored sequence without
/// touching the repository. Writers call [`DocumentPayloadCache::invalidate`].
#[derive(Clone)]
pub struct DocumentPayloadCache {
    backend: Arc<dyn CacheBackend>,
    documents: Arc<dyn DocumentsRepo>,
    ttl: Duration,
}

impl DocumentPayloadCache {
    pub fn new(backend: Arc<dyn CacheBackend>, documents: Arc<dyn DocumentsRepo>) -> Self {
        Self {
            backend,
            documents,
            ttl: DOCUMENT_LIST_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn cached_payload(&self) -> Result<Vec<DocumentSummary>, RepoError> {
        get_or_set(
            self.backend.as_ref(),
            DOCUMENT_LIST_CACHE_KEY,
            self.ttl,
            || async {
                let documents = self.documents.list_documents().await?;
                info!(
                    target = "notifier::application::caching",
                    count = documents.len(),
                    "document listing recomputed"
                );
                Ok::<_, RepoError>(
                    documents
                        .into_iter()
                        .map(|doc| DocumentSummary {
                            title: doc.title,
                            description: doc.description,
                        })
                        .collect(),
                )
            },
        )
        .await
    }

    /// Drop the stored payload so the next read recomputes it.
    pub async fn invalidate(&self) {
        if let Err(err) = self.backend.delete(DOCUMENT_LIST_CACHE_KEY).await {
            warn!(
                target = "notifier::application::caching",
                key = DOCUMENT_LIST_CACHE_KEY,
                error = %err,
                "failed to invalidate cached document listing"
            );
        }
    }
}
