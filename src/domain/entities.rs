//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

use crate::domain::types::NotificationStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "crate::domain::documents::serialize_utc_timestamp")]
    pub uploaded_at: OffsetDateTime,
}

/// A notification queued for, or delivered to, a single recipient.
///
/// The related document is optional; its title is denormalised on read so list
/// views do not need a second lookup per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub recipient_email: String,
    pub document_id: Option<i64>,
    pub document_title: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: NotificationStatus,
    pub metadata: JsonValue,
    pub created_at: OffsetDateTime,
    pub sent_at: Option<OffsetDateTime>,
}
