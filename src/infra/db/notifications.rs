use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateNotificationParams, NotificationsRepo, RepoError},
    domain::{entities::NotificationRecord, types::NotificationStatus},
};

use super::{PostgresRepositories, map_sqlx_error, util::convert_count};

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_email: String,
    document_id: Option<i64>,
    document_title: Option<String>,
    subject: String,
    message: String,
    status: NotificationStatus,
    metadata: Json<JsonValue>,
    created_at: OffsetDateTime,
    sent_at: Option<OffsetDateTime>,
}

impl From<NotificationRow> for NotificationRecord {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            recipient_email: row.recipient_email,
            document_id: row.document_id,
            document_title: row.document_title,
            subject: row.subject,
            message: row.message,
            status: row.status,
            metadata: row.metadata.0,
            created_at: row.created_at,
            sent_at: row.sent_at,
        }
    }
}

#[async_trait]
impl NotificationsRepo for PostgresRepositories {
    async fn list_notifications(&self, limit: u32) -> Result<Vec<NotificationRecord>, RepoError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT
                n.id,
                n.recipient_email,
                n.document_id,
                d.title AS document_title,
                n.subject,
                n.message,
                n.status,
                n.metadata,
                n.created_at,
                n.sent_at
            FROM notifications n
            LEFT JOIN documents d ON d.id = n.document_id
            ORDER BY n.created_at DESC, n.id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NotificationRecord::from).collect())
    }

    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            WITH inserted AS (
                INSERT INTO notifications
                    (recipient_email, document_id, subject, message, status, metadata, sent_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT
                i.id,
                i.recipient_email,
                i.document_id,
                d.title AS document_title,
                i.subject,
                i.message,
                i.status,
                i.metadata,
                i.created_at,
                i.sent_at
            FROM inserted i
            LEFT JOIN documents d ON d.id = i.document_id
            "#,
        )
        .bind(params.recipient_email)
        .bind(params.document_id)
        .bind(params.subject)
        .bind(params.message)
        .bind(params.status)
        .bind(Json(params.metadata))
        .bind(params.sent_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn count_notifications(&self, status: NotificationStatus) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE status = $1")
            .bind(status)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}
