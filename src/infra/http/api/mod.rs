pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    Router,
    routing::{get, post},
};

use crate::infra::http::HttpState;

/// JSON routes for documents and notification delivery.
pub fn build_api_router() -> Router<HttpState> {
    Router::new()
        .route(
            "/api/documents/",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route("/api/documents/cached/", get(handlers::cached_documents))
        .route(
            "/api/documents/{id}/",
            get(handlers::get_document)
                .put(handlers::replace_document)
                .patch(handlers::patch_document)
                .delete(handlers::delete_document),
        )
        .route(
            "/notifications/deliver/",
            post(handlers::deliver_notification),
        )
}

/// JSON routes that read or write the visitor's session.
pub fn build_session_router() -> Router<HttpState> {
    Router::new().route(
        "/session/last-document/",
        get(handlers::show_last_document).post(handlers::remember_last_document),
    )
}
