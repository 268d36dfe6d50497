use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateDocumentParams, DocumentsRepo, DocumentsWriteRepo, RepoError, UpdateDocumentParams,
    },
    domain::entities::DocumentRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: i64,
    title: String,
    description: String,
    uploaded_at: OffsetDateTime,
}

impl From<DocumentRow> for DocumentRecord {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[async_trait]
impl DocumentsRepo for PostgresRepositories {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, description, uploaded_at
            FROM documents
            ORDER BY uploaded_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(DocumentRecord::from).collect())
    }

    async fn find_document(&self, id: i64) -> Result<Option<DocumentRecord>, RepoError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, description, uploaded_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(DocumentRecord::from))
    }
}

#[async_trait]
impl DocumentsWriteRepo for PostgresRepositories {
    async fn create_document(
        &self,
        params: CreateDocumentParams,
    ) -> Result<DocumentRecord, RepoError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (title, description)
            VALUES ($1, $2)
            RETURNING id, title, description, uploaded_at
            "#,
        )
        .bind(params.title)
        .bind(params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_document(
        &self,
        params: UpdateDocumentParams,
    ) -> Result<Option<DocumentRecord>, RepoError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET title = $2, description = $3
            WHERE id = $1
            RETURNING id, title, description, uploaded_at
            "#,
        )
        .bind(params.id)
        .bind(params.title)
        .bind(params.description)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(DocumentRecord::from))
    }

    async fn delete_document(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
