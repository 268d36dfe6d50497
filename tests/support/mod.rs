#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use tower::ServiceExt;

use notifier::application::{
    caching::DocumentPayloadCache,
    delivery::{MessageId, NotificationRequest, NotificationSender, SendError},
    documents::DocumentService,
    metadata::MetadataFetcher,
    notifications::NotificationService,
    notifier::UploadNotifier,
    recipients::RecipientService,
    repos::{
        CreateDocumentParams, CreateNotificationParams, DocumentsRepo, DocumentsWriteRepo,
        NotificationsRepo, RepoError, UpdateDocumentParams,
    },
    sessions::SessionStore,
};
use notifier::cache::{CacheBackend, CacheConfig, MemoryCache};
use notifier::domain::{
    entities::{DocumentRecord, NotificationRecord},
    types::NotificationStatus,
};
use notifier::infra::http::{HttpState, NotifyViewConfig, build_router};

#[derive(Default)]
pub struct MemoryDocuments {
    records: Mutex<Vec<DocumentRecord>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryDocuments {
    pub fn seed(&self, title: &str, description: &str) -> DocumentRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let record = DocumentRecord {
            id,
            title: title.to_string(),
            description: description.to_string(),
            uploaded_at: OffsetDateTime::now_utc(),
        };
        self.records.lock().unwrap().push(record.clone());
        record
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentsRepo for MemoryDocuments {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }

    async fn find_document(&self, id: i64) -> Result<Option<DocumentRecord>, RepoError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|doc| doc.id == id)
            .cloned())
    }
}

#[async_trait]
impl DocumentsWriteRepo for MemoryDocuments {
    async fn create_document(
        &self,
        params: CreateDocumentParams,
    ) -> Result<DocumentRecord, RepoError> {
        Ok(self.seed(&params.title, &params.description))
    }

    async fn update_document(
        &self,
        params: UpdateDocumentParams,
    ) -> Result<Option<DocumentRecord>, RepoError> {
        let mut records = self.records.lock().unwrap();
        Ok(records.iter_mut().find(|doc| doc.id == params.id).map(|doc| {
            doc.title = params.title;
            doc.description = params.description;
            doc.clone()
        }))
    }

    async fn delete_document(&self, id: i64) -> Result<bool, RepoError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|doc| doc.id != id);
        Ok(records.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryNotifications {
    records: Mutex<Vec<NotificationRecord>>,
}

impl MemoryNotifications {
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationsRepo for MemoryNotifications {
    async fn list_notifications(&self, limit: u32) -> Result<Vec<NotificationRecord>, RepoError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError> {
        let mut records = self.records.lock().unwrap();
        let record = NotificationRecord {
            id: records.len() as i64 + 1,
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
        records.push(record.clone());
        Ok(record)
    }

    async fn count_notifications(&self, status: NotificationStatus) -> Result<u64, RepoError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| r.status == status).count() as u64)
    }
}

/// Sender that always accepts and hands out a fixed id.
pub struct AcceptingSender;

#[async_trait]
impl NotificationSender for AcceptingSender {
    async fn send(&self, _request: &NotificationRequest) -> Result<MessageId, SendError> {
        Ok(MessageId::new("msg-42"))
    }
}

/// Sender whose provider always refuses the message.
pub struct RefusingSender;

#[async_trait]
impl NotificationSender for RefusingSender {
    async fn send(&self, _request: &NotificationRequest) -> Result<MessageId, SendError> {
        Err(SendError::DeliveryFailed("mailbox unavailable".to_string()))
    }
}

/// Sender whose transport fails in a way the classifier cannot map.
pub struct CrashingSender;

#[async_trait]
impl NotificationSender for CrashingSender {
    async fn send(&self, _request: &NotificationRequest) -> Result<MessageId, SendError> {
        Err(SendError::unexpected(std::io::Error::other(
            "socket reset by 10.0.0.7",
        )))
    }
}

pub struct TestApp {
    pub router: Router,
    pub documents: Arc<MemoryDocuments>,
    pub notifications: Arc<MemoryNotifications>,
    pub sessions: SessionStore,
}

pub struct TestAppBuilder {
    sender: Arc<dyn NotificationSender>,
    metadata: Option<Arc<dyn MetadataFetcher>>,
    activity_log: PathBuf,
    upload_limit_bytes: usize,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            sender: Arc::new(AcceptingSender),
            metadata: None,
            activity_log: PathBuf::from("target/tests/missing-activity.log"),
            upload_limit_bytes: 1024 * 1024,
        }
    }
}

impl TestAppBuilder {
    pub fn sender(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.sender = sender;
        self
    }

    pub fn metadata(mut self, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        self.metadata = Some(fetcher);
        self
    }

    pub fn activity_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.activity_log = path.into();
        self
    }

    pub fn upload_limit_bytes(mut self, limit: usize) -> Self {
        self.upload_limit_bytes = limit;
        self
    }

    pub fn build(self) -> TestApp {
        let documents = Arc::new(MemoryDocuments::default());
        let notifications = Arc::new(MemoryNotifications::default());

        let reader: Arc<dyn DocumentsRepo> = documents.clone();
        let writer: Arc<dyn DocumentsWriteRepo> = documents.clone();
        let notifications_repo: Arc<dyn NotificationsRepo> = notifications.clone();

        let backend: Arc<dyn CacheBackend> =
            Arc::new(MemoryCache::new(&CacheConfig::default()));
        let listing = DocumentPayloadCache::new(backend, reader.clone());
        let sessions = SessionStore::default();

        let state = HttpState {
            documents: Arc::new(DocumentService::new(reader.clone(), writer, listing)),
            notifications: Arc::new(NotificationService::new(
                notifications_repo,
                reader,
                self.sender,
            )),
            notifier: Arc::new(UploadNotifier::with_default_subscribers()),
            sessions: sessions.clone(),
            recipients: Arc::new(RecipientService::new(sessions.clone())),
            metadata: self.metadata,
            notify: NotifyViewConfig {
                actor_kind: "admin".to_string(),
                actor_name: "Ben".to_string(),
                document_name: "project_plan.pdf".to_string(),
                activity_log: self.activity_log,
                metadata_ids: vec![1, 2, 3],
            },
            db: None,
            upload_limit_bytes: self.upload_limit_bytes,
        };

        TestApp {
            router: build_router(state),
            documents,
            notifications,
            sessions,
        }
    }
}

pub fn test_app() -> TestApp {
    TestAppBuilder::default().build()
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }
}

pub fn json_request(method: &str, uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
}

pub async fn body_json(response: Response<Body>) -> JsonValue {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be json")
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).expect("body should be utf-8")
}

/// `name=value` pair from the response's `Set-Cookie` header, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub const BOUNDARY: &str = "X-NOTIFIER-TEST-BOUNDARY";

/// Multipart form with a single file field.
pub fn multipart_upload(uri: &str, field: &str, file_name: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request should build")
}
