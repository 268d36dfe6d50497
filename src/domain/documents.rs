//! Document invariants and wire formatting helpers.

use serde::Serializer;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

use super::error::DomainError;

/// Maximum number of characters accepted for a document title.
pub const TITLE_MAX_CHARS: usize = 255;

const UTC_TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Trim and validate a document title.
pub fn normalize_title(raw: &str) -> Result<String, DomainError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

/// Descriptions are free text; only surrounding whitespace is dropped.
pub fn normalize_description(raw: &str) -> String {
    raw.trim().to_string()
}

/// Render an instant as `YYYY-MM-DDTHH:MM:SSZ` in UTC, dropping sub-second precision.
pub fn format_utc_timestamp(timestamp: OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(UTC_TIMESTAMP_FORMAT)
}

/// `serialize_with` adapter for [`format_utc_timestamp`].
pub fn serialize_utc_timestamp<S>(timestamp: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = format_utc_timestamp(*timestamp).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}
