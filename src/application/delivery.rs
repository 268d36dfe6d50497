//! Outcome classification for outbound notifications.
//!
//! A sender either returns a message id, reports an expected delivery failure
//! or fails in some other way. Only the expected failure is turned into a
//! renderable error fragment; everything else propagates to the caller.

use std::error::Error as StdError;

use askama::Template;
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::presentation::views::{NotificationErrorTemplate, TemplateRenderError};

pub const METRIC_DELIVERY_TOTAL: &str = "notifier_delivery_total";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient_email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum SendError {
    /// The recognised failure mode: the provider refused or could not deliver.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
    #[error("unexpected sender failure: {0}")]
    Unexpected(#[source] Box<dyn StdError + Send + Sync>),
}

impl SendError {
    pub fn delivery_failed(detail: impl Into<String>) -> Self {
        Self::DeliveryFailed(detail.into())
    }

    pub fn unexpected(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Unexpected(error.into())
    }
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, request: &NotificationRequest) -> Result<MessageId, SendError>;
}

/// Classified outcome, serialised as `{"status": "success" | "error", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryResult {
    Success { message_id: MessageId },
    Error { template: String },
}

impl DeliveryResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryResult::Success { .. })
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid notification request: {0}")]
    InvalidRequest(&'static str),
    #[error("unexpected sender failure")]
    Unexpected(#[source] Box<dyn StdError + Send + Sync>),
    #[error(transparent)]
    Render(#[from] TemplateRenderError),
}

/// Send `request` and classify the outcome.
///
/// A blank or whitespace-only recipient is rejected before the sender is called.
pub async fn send_notification(
    request: &NotificationRequest,
    sender: &dyn NotificationSender,
) -> Result<DeliveryResult, DeliveryError> {
    if request.recipient_email.trim().is_empty() {
        return Err(DeliveryError::InvalidRequest("recipient_email is required"));
    }

    match sender.send(request).await {
        Ok(message_id) => {
            counter!(METRIC_DELIVERY_TOTAL, "outcome" => "success").increment(1);
            Ok(DeliveryResult::Success { message_id })
        }
        Err(SendError::DeliveryFailed(details)) => {
            counter!(METRIC_DELIVERY_TOTAL, "outcome" => "failed").increment(1);
            error!(
                target = "notifier::application::delivery",
                event = "notification_delivery_failed",
                recipient = %request.recipient_email,
                subject = %request.subject,
                details = %details,
                "notification_delivery_failed"
            );
            let template = NotificationErrorTemplate {
                recipient_email: &request.recipient_email,
                subject: &request.subject,
                details: &details,
            }
            .render()
            .map_err(|err| {
                TemplateRenderError::new(
                    "application::delivery::send_notification",
                    "Template rendering failed",
                    err,
                )
            })?;
            Ok(DeliveryResult::Error { template })
        }
        Err(SendError::Unexpected(err)) => {
            counter!(METRIC_DELIVERY_TOTAL, "outcome" => "unexpected").increment(1);
            Err(DeliveryError::Unexpected(err))
        }
    }
}
