use serde::{Deserialize, Serialize};

use crate::application::caching::DocumentSummary;
use crate::domain::entities::DocumentRecord;

#[derive(Debug, Deserialize, Serialize)]
pub struct DocumentCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DocumentReplaceRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentPatchRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentRecord>,
}

#[derive(Debug, Serialize)]
pub struct CachedDocumentsResponse {
    pub documents: Vec<DocumentSummary>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LastDocumentRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct LastDocumentResponse {
    pub last_document_title: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DeliverNotificationRequest {
    pub recipient_email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub document_id: Option<i64>,
}
