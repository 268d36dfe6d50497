use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info};

use crate::application::delivery::{
    DeliveryError, DeliveryResult, NotificationRequest, NotificationSender, send_notification,
};
use crate::application::repos::{
    CreateNotificationParams, DocumentsRepo, NotificationsRepo, RepoError,
};
use crate::domain::entities::NotificationRecord;
use crate::domain::error::DomainError;
use crate::domain::types::NotificationStatus;

const DEFAULT_LIST_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct DeliverNotificationCommand {
    pub request: NotificationRequest,
    pub document_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NotificationListing {
    pub notifications: Vec<NotificationRecord>,
    pub total_sent: u64,
    pub total_failed: u64,
}

#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationsRepo>,
    documents: Arc<dyn DocumentsRepo>,
    sender: Arc<dyn NotificationSender>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationsRepo>,
        documents: Arc<dyn DocumentsRepo>,
        sender: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            notifications,
            documents,
            sender,
        }
    }

    pub async fn list_with_totals(&self) -> Result<NotificationListing, NotificationError> {
        let notifications = self
            .notifications
            .list_notifications(DEFAULT_LIST_LIMIT)
            .await?;
        let total_sent = self
            .notifications
            .count_notifications(NotificationStatus::Sent)
            .await?;
        let total_failed = self
            .notifications
            .count_notifications(NotificationStatus::Failed)
            .await?;

        Ok(NotificationListing {
            notifications,
            total_sent,
            total_failed,
        })
    }

    /// Attempt delivery and record the classified outcome.
    ///
    /// Invalid requests and unexpected sender faults are returned without
    /// recording anything. A failure to record is logged and does not replace
    /// the outcome.
    pub async fn deliver(
        &self,
        command: DeliverNotificationCommand,
    ) -> Result<DeliveryResult, NotificationError> {
        let DeliverNotificationCommand {
            request,
            document_id,
        } = command;

        if let Some(id) = document_id {
            if self.documents.find_document(id).await?.is_none() {
                return Err(DomainError::not_found("document", id).into());
            }
        }

        let outcome = send_notification(&request, self.sender.as_ref()).await?;

        let (status, metadata, sent_at) = match &outcome {
            DeliveryResult::Success { message_id } => (
                NotificationStatus::Sent,
                json!({ "message_id": message_id }),
                Some(OffsetDateTime::now_utc()),
            ),
            DeliveryResult::Error { .. } => (NotificationStatus::Failed, json!({}), None),
        };

        let recorded = self
            .notifications
            .create_notification(CreateNotificationParams {
                recipient_email: request.recipient_email.trim().to_string(),
                document_id,
                subject: request.subject,
                message: request.message,
                status,
                metadata,
                sent_at,
            })
            .await;

        match recorded {
            Ok(record) => info!(
                target = "notifier::application::notifications",
                notification_id = record.id,
                status = status.as_str(),
                "notification recorded"
            ),
            // The send already happened; the caller still gets its outcome.
            Err(err) => error!(
                target = "notifier::application::notifications",
                status = status.as_str(),
                message_id = message_id_of(&outcome),
                recipient = %request.recipient_email,
                error = %err,
                "notification outcome could not be recorded"
            ),
        }

        Ok(outcome)
    }
}

fn message_id_of(outcome: &DeliveryResult) -> &str {
    match outcome {
        DeliveryResult::Success { message_id } => message_id.as_str(),
        DeliveryResult::Error { .. } => "",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use time::macros::datetime;
    use tracing_test::traced_test;

    use super::*;
    use crate::application::delivery::{MessageId, SendError};
    use crate::domain::entities::DocumentRecord;

    #[derive(Default)]
    struct MemoryNotifications {
        rows: Mutex<Vec<NotificationRecord>>,
    }

    #[async_trait]
    impl NotificationsRepo for MemoryNotifications {
        async fn list_notifications(
            &self,
            limit: u32,
        ) -> Result<Vec<NotificationRecord>, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().rev().take(limit as usize).cloned().collect())
        }

        async fn create_notification(
            &self,
            params: CreateNotificationParams,
        ) -> Result<NotificationRecord, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let record = NotificationRecord {
                id: rows.len() as i64 + 1,
                recipient_email: params.recipient_email,
                document_id: params.document_id,
                document_title: None,
                subject: params.subject,
                message: params.message,
                status: params.status,
                metadata: params.metadata,
                created_at: OffsetDateTime::now_utc(),
                sent_at: params.sent_at,
            };
            rows.push(record.clone());
            Ok(record)
        }

        async fn count_notifications(
            &self,
            status: NotificationStatus,
        ) -> Result<u64, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().filter(|row| row.status == status).count() as u64)
        }
    }

    struct SingleDocument;

    #[async_trait]
    impl DocumentsRepo for SingleDocument {
        async fn list_documents(&self) -> Result<Vec<DocumentRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_document(&self, id: i64) -> Result<Option<DocumentRecord>, RepoError> {
            Ok((id == 1).then(|| DocumentRecord {
                id: 1,
                title: "Plan".to_string(),
                description: String::new(),
                uploaded_at: datetime!(2024-01-01 0:00 UTC),
            }))
        }
    }

    struct FlakySender;

    #[async_trait]
    impl NotificationSender for FlakySender {
        async fn send(&self, request: &NotificationRequest) -> Result<MessageId, SendError> {
            if request.recipient_email.ends_with("@bounce.test") {
                Err(SendError::delivery_failed("mailbox does not exist"))
            } else {
                Ok(MessageId::new("abc"))
            }
        }
    }

    fn service(repo: Arc<MemoryNotifications>) -> NotificationService {
        NotificationService::new(repo, Arc::new(SingleDocument), Arc::new(FlakySender))
    }

    fn command(recipient: &str, document_id: Option<i64>) -> DeliverNotificationCommand {
        DeliverNotificationCommand {
            request: NotificationRequest {
                recipient_email: recipient.to_string(),
                subject: "Hello".to_string(),
                message: "Body".to_string(),
            },
            document_id,
        }
    }

    #[tokio::test]
    async fn outcomes_are_recorded_and_totalled() {
        let repo = Arc::new(MemoryNotifications::default());
        let service = service(repo.clone());

        assert!(service.deliver(command("a@example.com", Some(1))).await.unwrap().is_success());
        assert!(!service.deliver(command("b@bounce.test", None)).await.unwrap().is_success());
        service.deliver(command("c@example.com", None)).await.unwrap();

        let listing = service.list_with_totals().await.unwrap();
        assert_eq!(listing.total_sent, 2);
        assert_eq!(listing.total_failed, 1);
        assert_eq!(listing.notifications[0].recipient_email, "c@example.com");
        assert_eq!(listing.notifications[2].metadata["message_id"], "abc");
        assert!(listing.notifications[1].sent_at.is_none());
    }

    #[tokio::test]
    async fn invalid_request_records_nothing() {
        let repo = Arc::new(MemoryNotifications::default());
        let err = service(repo.clone())
            .deliver(command(" ", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NotificationError::Delivery(DeliveryError::InvalidRequest(_))
        ));
        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_document_is_rejected() {
        let repo = Arc::new(MemoryNotifications::default());
        let err = service(repo)
            .deliver(command("a@example.com", Some(9)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NotificationError::Domain(DomainError::NotFound { .. })
        ));
    }

    struct UnavailableNotifications;

    #[async_trait]
    impl NotificationsRepo for UnavailableNotifications {
        async fn list_notifications(
            &self,
            _limit: u32,
        ) -> Result<Vec<NotificationRecord>, RepoError> {
            Err(RepoError::Timeout)
        }

        async fn create_notification(
            &self,
            _params: CreateNotificationParams,
        ) -> Result<NotificationRecord, RepoError> {
            Err(RepoError::Timeout)
        }

        async fn count_notifications(
            &self,
            _status: NotificationStatus,
        ) -> Result<u64, RepoError> {
            Err(RepoError::Timeout)
        }
    }

    #[derive(Default)]
    struct CountingSender {
        sends: AtomicUsize,
    }

    #[async_trait]
    impl NotificationSender for CountingSender {
        async fn send(&self, _request: &NotificationRequest) -> Result<MessageId, SendError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(MessageId::new("msg-1"))
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn sent_outcome_survives_a_recording_failure() {
        let sender = Arc::new(CountingSender::default());
        let service = NotificationService::new(
            Arc::new(UnavailableNotifications),
            Arc::new(SingleDocument),
            sender.clone(),
        );

        let outcome = service
            .deliver(command("a@example.com", None))
            .await
            .expect("classified outcome is returned");

        assert_eq!(
            outcome,
            DeliveryResult::Success {
                message_id: MessageId::new("msg-1")
            }
        );
        assert_eq!(sender.sends.load(Ordering::SeqCst), 1);
        assert!(logs_contain("notification outcome could not be recorded"));
        assert!(logs_contain("msg-1"));
    }

    #[tokio::test]
    async fn failed_outcome_survives_a_recording_failure() {
        let service = NotificationService::new(
            Arc::new(UnavailableNotifications),
            Arc::new(SingleDocument),
            Arc::new(FlakySender),
        );

        let outcome = service
            .deliver(command("b@bounce.test", None))
            .await
            .expect("classified outcome is returned");
        assert!(!outcome.is_success());
    }
}
