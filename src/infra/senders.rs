//! Outbound notification transports.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::application::delivery::{
    MessageId, NotificationRequest, NotificationSender, SendError,
};
use crate::infra::error::InfraError;

fn user_agent() -> &'static str {
    concat!("notifier/", env!("CARGO_PKG_VERSION"))
}

/// Accepts every request and records it in the application log.
#[derive(Debug, Clone, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, request: &NotificationRequest) -> Result<MessageId, SendError> {
        let message_id = MessageId::new(Uuid::new_v4().to_string());
        info!(
            target = "notifier::infra::senders",
            recipient = %request.recipient_email,
            subject = %request.subject,
            message_id = message_id.as_str(),
            "notification accepted by log sender"
        );
        Ok(message_id)
    }
}

#[derive(Debug, Deserialize)]
struct WebhookReceipt {
    message_id: String,
}

/// Posts each request as JSON to a delivery webhook.
///
/// Transport errors and non-success statuses are delivery failures; a success
/// response without a readable `message_id` is unexpected.
#[derive(Debug, Clone)]
pub struct WebhookSender {
    client: Client,
    endpoint: Url,
}

impl WebhookSender {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, InfraError> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            InfraError::configuration(format!("invalid delivery webhook url `{endpoint}`: {err}"))
        })?;
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send(&self, request: &NotificationRequest) -> Result<MessageId, SendError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| SendError::delivery_failed(format!("webhook unreachable: {err}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| SendError::delivery_failed(format!("webhook response lost: {err}")))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(SendError::delivery_failed(format!(
                "webhook responded with {status}: {}",
                text.trim()
            )));
        }

        let receipt: WebhookReceipt = serde_json::from_slice(&bytes).map_err(SendError::unexpected)?;
        Ok(MessageId::new(receipt.message_id))
    }
}
