//! In-process fan-out of document upload events.

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{info, warn};

use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "application::notifier";

#[derive(Debug, Error)]
#[error("{0}")]
pub struct SubscriberError(String);

impl SubscriberError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Receiver of upload events.
pub trait UploadSubscriber: Send + Sync {
    fn name(&self) -> &str;

    fn on_upload(&self, document_name: &str) -> Result<(), SubscriberError>;
}

/// Adapts a closure into an [`UploadSubscriber`].
pub struct FnSubscriber<F> {
    name: String,
    handler: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&str) -> Result<(), SubscriberError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> UploadSubscriber for FnSubscriber<F>
where
    F: Fn(&str) -> Result<(), SubscriberError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_upload(&self, document_name: &str) -> Result<(), SubscriberError> {
        (self.handler)(document_name)
    }
}

pub struct AlertAdmin;

impl UploadSubscriber for AlertAdmin {
    fn name(&self) -> &str {
        "alert_admin"
    }

    fn on_upload(&self, document_name: &str) -> Result<(), SubscriberError> {
        info!(
            target = "notifier::application::notifier",
            document = document_name,
            "[ALERT] Admin notified: '{document_name}' uploaded."
        );
        Ok(())
    }
}

pub struct LogUpload;

impl UploadSubscriber for LogUpload {
    fn name(&self) -> &str {
        "log_upload"
    }

    fn on_upload(&self, document_name: &str) -> Result<(), SubscriberError> {
        info!(
            target = "notifier::application::notifier",
            document = document_name,
            "[LOG] Document '{document_name}' was uploaded."
        );
        Ok(())
    }
}

/// Ordered list of subscribers notified synchronously on every upload.
///
/// Subscribers are never removed or de-duplicated. A failing subscriber is
/// logged and the remaining ones still run.
#[derive(Default)]
pub struct UploadNotifier {
    subscribers: RwLock<Vec<Arc<dyn UploadSubscriber>>>,
}

impl UploadNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier pre-wired with [`AlertAdmin`] then [`LogUpload`].
    pub fn with_default_subscribers() -> Self {
        let notifier = Self::new();
        notifier.subscribe(AlertAdmin);
        notifier.subscribe(LogUpload);
        notifier
    }

    pub fn subscribe(&self, subscriber: impl UploadSubscriber + 'static) {
        self.subscribe_arc(Arc::new(subscriber));
    }

    pub fn subscribe_arc(&self, subscriber: Arc<dyn UploadSubscriber>) {
        rw_write(&self.subscribers, SOURCE, "subscribe").push(subscriber);
    }

    pub fn subscribe_fn<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&str) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.subscribe(FnSubscriber::new(name, handler));
    }

    pub fn subscriber_count(&self) -> usize {
        rw_read(&self.subscribers, SOURCE, "subscriber_count").len()
    }

    pub fn notify(&self, document_name: &str) {
        // Snapshot so subscribers may register others without deadlocking.
        let subscribers = rw_read(&self.subscribers, SOURCE, "notify").clone();
        for subscriber in subscribers {
            if let Err(err) = subscriber.on_upload(document_name) {
                warn!(
                    target = "notifier::application::notifier",
                    subscriber = subscriber.name(),
                    document = document_name,
                    error = %err,
                    "upload subscriber failed"
                );
            }
        }
    }
}
