//! Per-visitor key/value state keyed by an opaque session id.

use std::{fmt, sync::Arc, time::Duration};

use dashmap::DashMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

pub const LAST_DOCUMENT_KEY: &str = "last_document_title";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("session value could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sessions untouched for two weeks are dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Debug, Default)]
struct SessionData {
    values: JsonMap<String, JsonValue>,
    last_seen: Option<Instant>,
}

impl SessionData {
    fn touch(&mut self, now: Instant) {
        self.last_seen = Some(now);
    }

    fn is_idle(&self, now: Instant, idle_timeout: Duration) -> bool {
        self.last_seen
            .is_some_and(|seen| now.saturating_duration_since(seen) >= idle_timeout)
    }
}

/// In-memory session data shared by all request handlers.
///
/// Every read or write refreshes a session. Idle sessions are treated as
/// absent and are swept whenever a new session is stored.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<SessionId, SessionData>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Resolve the id presented by the client, issuing a fresh one when it is
    /// missing, unknown, or idle. The flag is `true` when a new id was issued.
    ///
    /// A fresh session is only stored once something is written to it.
    pub fn resolve(&self, presented: Option<&str>) -> (SessionId, bool) {
        if let Some(id) = presented.and_then(SessionId::parse) {
            if self.contains(id) {
                return (id, false);
            }
        }
        (SessionId::generate(), true)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        let now = Instant::now();
        self.sessions.remove_if(&id, |_, data| data.is_idle(now, self.idle_timeout));
        self.sessions.contains_key(&id)
    }

    pub fn get<T: DeserializeOwned>(&self, id: SessionId, key: &str) -> Option<T> {
        let value = {
            let now = Instant::now();
            let mut data = self.sessions.get_mut(&id)?;
            if data.is_idle(now, self.idle_timeout) {
                return None;
            }
            data.touch(now);
            data.values.get(key).cloned()?
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(
                    target = "notifier::application::sessions",
                    key,
                    error = %err,
                    "ignoring undecodable session value"
                );
                None
            }
        }
    }

    pub fn insert<T: Serialize>(
        &self,
        id: SessionId,
        key: &str,
        value: &T,
    ) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let now = Instant::now();
        if !self.contains(id) {
            self.prune_idle();
        }
        let mut data = self.sessions.entry(id).or_default();
        data.touch(now);
        data.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&self, id: SessionId, key: &str) -> Option<JsonValue> {
        let now = Instant::now();
        let mut data = self.sessions.get_mut(&id)?;
        if data.is_idle(now, self.idle_timeout) {
            return None;
        }
        data.touch(now);
        data.values.remove(key)
    }

    /// Drop every idle session, returning how many were removed.
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, data| !data.is_idle(now, self.idle_timeout));
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            debug!(
                target = "notifier::application::sessions",
                pruned,
                remaining = self.sessions.len(),
                "idle sessions dropped"
            );
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub stored: String,
}

/// Remember the title of the document the visitor last looked at.
pub fn remember_last_document(
    store: &SessionStore,
    id: SessionId,
    title: &str,
) -> Result<StoredDocument, SessionError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SessionError::EmptyTitle);
    }
    store.insert(id, LAST_DOCUMENT_KEY, &title)?;
    Ok(StoredDocument {
        stored: title.to_string(),
    })
}

pub fn last_document(store: &SessionStore, id: SessionId) -> Option<String> {
    store.get(id, LAST_DOCUMENT_KEY)
}
