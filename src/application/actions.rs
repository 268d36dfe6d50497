//! Actor-attributed operations.
//!
//! [`ActionLogger::wrap`] turns any operation that takes an actor first into a
//! [`LoggedAction`] that records who performed it before delegating.

use std::sync::Arc;

use tracing::info;

use crate::application::notifier::UploadNotifier;
use crate::domain::users::Actor;

pub struct ActionLogger;

impl ActionLogger {
    pub fn wrap<F>(action: &'static str, operation: F) -> LoggedAction<F> {
        LoggedAction { action, operation }
    }
}

pub struct LoggedAction<F> {
    action: &'static str,
    operation: F,
}

impl<F> LoggedAction<F> {
    pub fn action(&self) -> &'static str {
        self.action
    }

    /// Log the actor line, then run the operation and hand back its result as is.
    pub fn call<Args, R>(&self, actor: &dyn Actor, args: Args) -> R
    where
        F: Fn(&dyn Actor, Args) -> R,
    {
        info!(
            target = "notifier::application::actions",
            actor = actor.name(),
            role = actor.role(),
            action = self.action,
            "[ACTION] {} ({}) is performing {}",
            actor.name(),
            actor.role(),
            self.action
        );
        (self.operation)(actor, args)
    }
}

/// Logged producer that announces an uploaded document to every subscriber.
pub fn upload_document(
    notifier: Arc<UploadNotifier>,
) -> LoggedAction<impl Fn(&dyn Actor, &str) + Send + Sync> {
    ActionLogger::wrap(
        "upload_document",
        move |_actor: &dyn Actor, document_name: &str| notifier.notify(document_name),
    )
}
