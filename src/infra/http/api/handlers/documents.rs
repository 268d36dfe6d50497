//! Document handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::documents::{
    CreateDocumentCommand, PatchDocumentCommand, ReplaceDocumentCommand,
};

use super::{document_to_api, json_rejection_to_api, repo_to_api};
use crate::infra::http::HttpState;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;

fn document_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::not_found("document not found"))
}

pub async fn list_documents(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state.documents.list().await.map_err(document_to_api)?;
    Ok(Json(DocumentListResponse { documents }))
}

pub async fn cached_documents(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state
        .documents
        .listing()
        .cached_payload()
        .await
        .map_err(repo_to_api)?;
    Ok(Json(CachedDocumentsResponse { documents }))
}

pub async fn create_document(
    State(state): State<HttpState>,
    payload: Result<Json<DocumentCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;

    let document = state
        .documents
        .create(CreateDocumentCommand {
            title: payload.title,
            description: payload.description,
        })
        .await
        .map_err(document_to_api)?;

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_document(
    State(state): State<HttpState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = document_id(path)?;
    let document = state.documents.get(id).await.map_err(document_to_api)?;
    Ok(Json(document))
}

pub async fn replace_document(
    State(state): State<HttpState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DocumentReplaceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = document_id(path)?;
    let Json(payload) = payload.map_err(json_rejection_to_api)?;

    let document = state
        .documents
        .replace(ReplaceDocumentCommand {
            id,
            title: payload.title,
            description: payload.description,
        })
        .await
        .map_err(document_to_api)?;

    Ok(Json(document))
}

pub async fn patch_document(
    State(state): State<HttpState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DocumentPatchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = document_id(path)?;
    let Json(payload) = payload.map_err(json_rejection_to_api)?;

    let document = state
        .documents
        .patch(PatchDocumentCommand {
            id,
            title: payload.title,
            description: payload.description,
        })
        .await
        .map_err(document_to_api)?;

    Ok(Json(document))
}

pub async fn delete_document(
    State(state): State<HttpState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = document_id(path)?;
    state
        .documents
        .delete(id)
        .await
        .map_err(document_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
