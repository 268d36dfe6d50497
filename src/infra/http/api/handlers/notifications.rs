//! Notification delivery handler

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;

use crate::application::delivery::NotificationRequest;
use crate::application::notifications::DeliverNotificationCommand;

use super::{json_rejection_to_api, notification_to_api};
use crate::infra::http::HttpState;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;

pub async fn deliver_notification(
    State(state): State<HttpState>,
    payload: Result<Json<DeliverNotificationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;

    let command = DeliverNotificationCommand {
        request: NotificationRequest {
            recipient_email: payload.recipient_email,
            subject: payload.subject,
            message: payload.message,
        },
        document_id: payload.document_id,
    };

    let outcome = state
        .notifications
        .deliver(command)
        .await
        .map_err(notification_to_api)?;

    Ok(Json(outcome))
}
