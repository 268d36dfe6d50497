pub mod api;
mod middleware;
pub mod session;
mod views;

pub use middleware::{METRIC_HTTP_LATENCY_MS, RequestContext};

use std::{path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use sqlx::Error as SqlxError;

use crate::{
    application::{
        documents::DocumentService,
        error::{ErrorReport, HttpError},
        metadata::MetadataFetcher,
        notifications::NotificationService,
        notifier::UploadNotifier,
        recipients::RecipientService,
        repos::RepoError,
        sessions::SessionStore,
    },
    infra::db::PostgresRepositories,
};

use self::middleware::{log_responses, set_request_context};

/// Inputs for the notify page: who uploads what, where the activity log
/// lives, and which remote documents to describe.
#[derive(Debug, Clone)]
pub struct NotifyViewConfig {
    pub actor_kind: String,
    pub actor_name: String,
    pub document_name: String,
    pub activity_log: PathBuf,
    pub metadata_ids: Vec<u64>,
}

#[derive(Clone)]
pub struct HttpState {
    pub documents: Arc<DocumentService>,
    pub notifications: Arc<NotificationService>,
    pub notifier: Arc<UploadNotifier>,
    pub sessions: SessionStore,
    pub recipients: Arc<RecipientService>,
    pub metadata: Option<Arc<dyn MetadataFetcher>>,
    pub notify: NotifyViewConfig,
    pub db: Option<Arc<PostgresRepositories>>,
    pub upload_limit_bytes: usize,
}

pub fn build_router(state: HttpState) -> Router {
    let session_routes = api::build_session_router()
        .merge(views::build_recipient_router())
        .layer(axum_middleware::from_fn_with_state(
            state.sessions.clone(),
            session::attach_session,
        ));

    let upload_limit = state.upload_limit_bytes;

    api::build_api_router()
        .merge(session_routes)
        .merge(views::build_view_router())
        .route("/_health/db", get(db_health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn db_health(State(state): State<HttpState>) -> Response {
    match &state.db {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Map a repository error to a consistent HTTP error response for HTML routes.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}
