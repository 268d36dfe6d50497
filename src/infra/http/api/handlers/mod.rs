mod documents;
mod notifications;
mod sessions;

pub use documents::{
    cached_documents, create_document, delete_document, get_document, list_documents,
    patch_document, replace_document,
};
pub use notifications::deliver_notification;
pub use sessions::{remember_last_document, show_last_document};

// ----- Shared error conversions -----

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::application::delivery::DeliveryError;
use crate::application::documents::DocumentError;
use crate::application::notifications::NotificationError;
use crate::application::repos::RepoError;
use crate::application::sessions::SessionError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => {
            ApiError::internal(codes::REPO, "Persistence error", Some(msg))
        }
    }
}

pub(crate) fn domain_to_api(err: DomainError, not_found: &'static str) -> ApiError {
    match err {
        DomainError::NotFound { .. } => ApiError::not_found(not_found),
        DomainError::Validation { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
    }
}

pub(crate) fn document_to_api(err: DocumentError) -> ApiError {
    match err {
        DocumentError::Domain(domain) => domain_to_api(domain, "document not found"),
        DocumentError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn notification_to_api(err: NotificationError) -> ApiError {
    match err {
        NotificationError::Delivery(DeliveryError::InvalidRequest(reason)) => {
            ApiError::bad_request("Invalid notification request", Some(reason.to_string()))
        }
        NotificationError::Delivery(err @ DeliveryError::Unexpected(_)) => {
            ApiError::internal(codes::DELIVERY, "Notification could not be sent", None)
                .with_source(&err)
        }
        NotificationError::Delivery(DeliveryError::Render(render)) => {
            ApiError::internal(codes::RENDER, "Template rendering failed", None)
                .with_source(&render)
        }
        NotificationError::Domain(domain) => domain_to_api(domain, "document not found"),
        NotificationError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn session_to_api(err: SessionError) -> ApiError {
    match err {
        SessionError::EmptyTitle => ApiError::bad_request(
            "Invalid input",
            Some("title must not be empty".to_string()),
        ),
        SessionError::Encode(inner) => {
            ApiError::internal(codes::SESSION, "Session could not be updated", None)
                .with_source(&inner)
        }
    }
}

pub(crate) fn json_rejection_to_api(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("Invalid request body", Some(rejection.body_text()))
}
