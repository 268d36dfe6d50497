use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::caching::DocumentPayloadCache;
use crate::application::repos::{
    CreateDocumentParams, DocumentsRepo, DocumentsWriteRepo, RepoError, UpdateDocumentParams,
};
use crate::domain::documents::{normalize_description, normalize_title};
use crate::domain::entities::DocumentRecord;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateDocumentCommand {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReplaceDocumentCommand {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct PatchDocumentCommand {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Document CRUD that keeps the cached listing coherent with writes.
#[derive(Clone)]
pub struct DocumentService {
    reader: Arc<dyn DocumentsRepo>,
    writer: Arc<dyn DocumentsWriteRepo>,
    listing: DocumentPayloadCache,
}

impl DocumentService {
    pub fn new(
        reader: Arc<dyn DocumentsRepo>,
        writer: Arc<dyn DocumentsWriteRepo>,
        listing: DocumentPayloadCache,
    ) -> Self {
        Self {
            reader,
            writer,
            listing,
        }
    }

    pub fn listing(&self) -> &DocumentPayloadCache {
        &self.listing
    }

    pub async fn list(&self) -> Result<Vec<DocumentRecord>, DocumentError> {
        self.reader
            .list_documents()
            .await
            .map_err(DocumentError::from)
    }

    pub async fn get(&self, id: i64) -> Result<DocumentRecord, DocumentError> {
        self.reader
            .find_document(id)
            .await?
            .ok_or_else(|| DomainError::not_found("document", id).into())
    }

    pub async fn create(
        &self,
        command: CreateDocumentCommand,
    ) -> Result<DocumentRecord, DocumentError> {
        let params = CreateDocumentParams {
            title: normalize_title(&command.title)?,
            description: normalize_description(command.description.as_deref().unwrap_or_default()),
        };

        let document = self.writer.create_document(params).await?;
        self.listing.invalidate().await;
        info!(
            target = "notifier::application::documents",
            document_id = document.id,
            title = %document.title,
            "document created"
        );
        Ok(document)
    }

    pub async fn replace(
        &self,
        command: ReplaceDocumentCommand,
    ) -> Result<DocumentRecord, DocumentError> {
        let params = UpdateDocumentParams {
            id: command.id,
            title: normalize_title(&command.title)?,
            description: normalize_description(command.description.as_deref().unwrap_or_default()),
        };
        self.write_update(params).await
    }

    pub async fn patch(
        &self,
        command: PatchDocumentCommand,
    ) -> Result<DocumentRecord, DocumentError> {
        let current = self.get(command.id).await?;
        let title = match command.title {
            Some(title) => normalize_title(&title)?,
            None => current.title,
        };
        let description = command
            .description
            .map(|value| normalize_description(&value))
            .unwrap_or(current.description);

        self.write_update(UpdateDocumentParams {
            id: command.id,
            title,
            description,
        })
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), DocumentError> {
        if !self.writer.delete_document(id).await? {
            return Err(DomainError::not_found("document", id).into());
        }
        self.listing.invalidate().await;
        info!(
            target = "notifier::application::documents",
            document_id = id,
            "document deleted"
        );
        Ok(())
    }

    async fn write_update(
        &self,
        params: UpdateDocumentParams,
    ) -> Result<DocumentRecord, DocumentError> {
        let id = params.id;
        let document = self
            .writer
            .update_document(params)
            .await?
            .ok_or_else(|| DomainError::not_found("document", id))?;
        self.listing.invalidate().await;
        info!(
            target = "notifier::application::documents",
            document_id = id,
            "document updated"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::cache::MemoryCache;

    #[derive(Default)]
    struct MemoryDocs {
        rows: Mutex<Vec<DocumentRecord>>,
    }

    #[async_trait]
    impl DocumentsRepo for MemoryDocs {
        async fn list_documents(&self) -> Result<Vec<DocumentRecord>, RepoError> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
            Ok(rows)
        }

        async fn find_document(&self, id: i64) -> Result<Option<DocumentRecord>, RepoError> {
            Ok(self.rows.lock().unwrap().iter().find(|d| d.id == id).cloned())
        }
    }

    #[async_trait]
    impl DocumentsWriteRepo for MemoryDocs {
        async fn create_document(
            &self,
            params: CreateDocumentParams,
        ) -> Result<DocumentRecord, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as i64 + 1;
            let record = DocumentRecord {
                id,
                title: params.title,
                description: params.description,
                uploaded_at: OffsetDateTime::UNIX_EPOCH + Duration::minutes(id),
            };
            rows.push(record.clone());
            Ok(record)
        }

        async fn update_document(
            &self,
            params: UpdateDocumentParams,
        ) -> Result<Option<DocumentRecord>, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            Ok(rows.iter_mut().find(|d| d.id == params.id).map(|doc| {
                doc.title = params.title;
                doc.description = params.description;
                doc.clone()
            }))
        }

        async fn delete_document(&self, id: i64) -> Result<bool, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|d| d.id != id);
            Ok(rows.len() != before)
        }
    }

    fn service() -> DocumentService {
        let docs = Arc::new(MemoryDocs::default());
        let listing = DocumentPayloadCache::new(Arc::new(MemoryCache::default()), docs.clone());
        DocumentService::new(docs.clone(), docs, listing)
    }

    fn create(title: &str) -> CreateDocumentCommand {
        CreateDocumentCommand {
            title: title.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn writes_invalidate_cached_listing() {
        let service = service();
        service.create(create("First")).await.unwrap();
        assert_eq!(service.listing().cached_payload().await.unwrap().len(), 1);

        let second = service.create(create("Second")).await.unwrap();
        let payload = service.listing().cached_payload().await.unwrap();
        assert_eq!(payload[0].title, "Second");

        service
            .patch(PatchDocumentCommand {
                id: second.id,
                title: Some("Second (rev)".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            service.listing().cached_payload().await.unwrap()[0].title,
            "Second (rev)"
        );

        service.delete(second.id).await.unwrap();
        assert_eq!(service.listing().cached_payload().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn patch_keeps_absent_fields() {
        let service = service();
        let doc = service
            .create(CreateDocumentCommand {
                title: "Plan".to_string(),
                description: Some("  draft  ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(doc.description, "draft");

        let patched = service
            .patch(PatchDocumentCommand {
                id: doc.id,
                description: Some("final".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(patched.title, "Plan");
        assert_eq!(patched.description, "final");
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let service = service();
        assert!(matches!(
            service.get(42).await,
            Err(DocumentError::Domain(DomainError::NotFound { .. }))
        ));
        assert!(matches!(
            service.delete(42).await,
            Err(DocumentError::Domain(DomainError::NotFound { .. }))
        ));
        let replaced = service
            .replace(ReplaceDocumentCommand {
                id: 42,
                title: "Ghost".to_string(),
                description: None,
            })
            .await;
        assert!(matches!(
            replaced,
            Err(DocumentError::Domain(DomainError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_writing() {
        let service = service();
        let err = service.create(create("  ")).await.unwrap_err();
        assert!(matches!(err, DocumentError::Domain(DomainError::Validation { .. })));
        assert!(service.list().await.unwrap().is_empty());
    }
}
