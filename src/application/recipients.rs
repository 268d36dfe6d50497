//! Recipient list uploads staged in the visitor's session.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::application::pagination::{Page, paginate};
use crate::application::sessions::{SessionError, SessionId, SessionStore};
use crate::domain::recipients::{Recipient, RecipientParseError, parse_recipients};

pub const RECIPIENTS_PER_PAGE: usize = 10;
pub const RECIPIENTS_SESSION_KEY: &str = "recipients";
const FLASH_SESSION_KEY: &str = "flash";

#[derive(Debug, Error)]
pub enum RecipientUploadError {
    #[error("Please choose a CSV file to upload.")]
    MissingFile,
    #[error(transparent)]
    Parse(#[from] RecipientParseError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

#[derive(Clone)]
pub struct RecipientService {
    sessions: SessionStore,
}

impl RecipientService {
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }

    /// Parse an uploaded file and stage its rows in the session.
    ///
    /// On success the previous list is replaced and a success flash is queued.
    pub fn import(
        &self,
        session: SessionId,
        upload: Option<&[u8]>,
    ) -> Result<usize, RecipientUploadError> {
        let bytes = upload.ok_or(RecipientUploadError::MissingFile)?;
        let recipients = parse_recipients(bytes)?;
        let count = recipients.len();

        self.sessions
            .insert(session, RECIPIENTS_SESSION_KEY, &recipients)?;
        self.sessions.insert(
            session,
            FLASH_SESSION_KEY,
            &FlashMessage {
                level: FlashLevel::Success,
                text: format!("Uploaded {count} recipients successfully."),
            },
        )?;

        info!(
            target = "notifier::application::recipients",
            %session,
            count,
            "recipient list staged"
        );
        Ok(count)
    }

    pub fn staged(&self, session: SessionId) -> Vec<Recipient> {
        self.sessions
            .get(session, RECIPIENTS_SESSION_KEY)
            .unwrap_or_default()
    }

    pub fn preview(&self, session: SessionId, page: Option<&str>) -> Page<Recipient> {
        paginate(&self.staged(session), RECIPIENTS_PER_PAGE, page)
    }

    /// Pop the pending flash message, if any.
    pub fn take_flash(&self, session: SessionId) -> Option<FlashMessage> {
        let value = self.sessions.remove(session, FLASH_SESSION_KEY)?;
        serde_json::from_value(value).ok()
    }
}
