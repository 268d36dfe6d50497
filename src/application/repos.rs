//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{DocumentRecord, NotificationRecord};
use crate::domain::types::NotificationStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateDocumentParams {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UpdateDocumentParams {
    pub id: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreateNotificationParams {
    pub recipient_email: String,
    pub document_id: Option<i64>,
    pub subject: String,
    pub message: String,
    pub status: NotificationStatus,
    pub metadata: JsonValue,
    pub sent_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait DocumentsRepo: Send + Sync {
    /// All documents, newest upload first.
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, RepoError>;

    async fn find_document(&self, id: i64) -> Result<Option<DocumentRecord>, RepoError>;
}

#[async_trait]
pub trait DocumentsWriteRepo: Send + Sync {
    async fn create_document(
        &self,
        params: CreateDocumentParams,
    ) -> Result<DocumentRecord, RepoError>;

    /// Returns `None` when no document has the given id.
    async fn update_document(
        &self,
        params: UpdateDocumentParams,
    ) -> Result<Option<DocumentRecord>, RepoError>;

    /// Returns `false` when no document has the given id.
    async fn delete_document(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait NotificationsRepo: Send + Sync {
    /// Most recent notifications first.
    async fn list_notifications(&self, limit: u32) -> Result<Vec<NotificationRecord>, RepoError>;

    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError>;

    async fn count_notifications(&self, status: NotificationStatus) -> Result<u64, RepoError>;
}
