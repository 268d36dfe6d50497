//! Cache configuration.

use std::{num::NonZeroUsize, time::Duration};

use serde::Deserialize;

const DEFAULT_CAPACITY: usize = 256;
const DEFAULT_DOCUMENT_TTL_SECONDS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of keys kept by the in-memory backend.
    pub capacity: usize,
    /// Lifetime of the cached document listing.
    pub document_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            document_ttl_seconds: DEFAULT_DOCUMENT_TTL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            capacity: settings.capacity.get() as usize,
            document_ttl_seconds: settings.document_ttl_seconds.get(),
        }
    }
}

impl CacheConfig {
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn document_ttl(&self) -> Duration {
        Duration::from_secs(self.document_ttl_seconds.max(1))
    }
}
