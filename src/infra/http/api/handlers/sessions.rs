//! Session handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::sessions::{self, last_document};

use super::{json_rejection_to_api, session_to_api};
use crate::infra::http::HttpState;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::session::CurrentSession;

pub async fn remember_last_document(
    State(state): State<HttpState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    payload: Result<Json<LastDocumentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let stored = sessions::remember_last_document(&state.sessions, session, &payload.title)
        .map_err(session_to_api)?;
    Ok(Json(stored))
}

pub async fn show_last_document(
    State(state): State<HttpState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> impl IntoResponse {
    Json(LastDocumentResponse {
        last_document_title: last_document(&state.sessions, session),
    })
}
