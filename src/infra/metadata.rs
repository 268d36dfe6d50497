//! HTTP-backed document metadata lookups.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::application::metadata::{DocumentMetadata, MetadataError, MetadataFetcher};
use crate::infra::error::InfraError;

#[derive(Debug, Deserialize)]
struct PostPayload {
    title: String,
}

/// Fetches `{base_url}/posts/{id}` and reads its `title`.
#[derive(Debug, Clone)]
pub struct HttpMetadataFetcher {
    client: Client,
    base: Url,
}

impl HttpMetadataFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InfraError> {
        let mut base = Url::parse(base_url).map_err(|err| {
            InfraError::configuration(format!("invalid metadata base url `{base_url}`: {err}"))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(concat!("notifier/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn post_url(&self, id: u64) -> Result<Url, MetadataError> {
        self.base
            .join(&format!("posts/{id}"))
            .map_err(|err| MetadataError::Request {
                id,
                message: err.to_string(),
            })
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, id: u64) -> Result<DocumentMetadata, MetadataError> {
        let request_error = |err: reqwest::Error| MetadataError::Request {
            id,
            message: err.to_string(),
        };

        let response = self
            .client
            .get(self.post_url(id)?)
            .send()
            .await
            .map_err(request_error)?
            .error_for_status()
            .map_err(request_error)?;
        let bytes = response.bytes().await.map_err(request_error)?;
        let payload: PostPayload =
            serde_json::from_slice(&bytes).map_err(|err| MetadataError::Decode {
                id,
                message: err.to_string(),
            })?;

        Ok(DocumentMetadata {
            id,
            title: payload.title,
        })
    }
}
