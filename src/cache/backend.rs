//! Cache backend contract and the read-through helper built on it.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

pub const METRIC_CACHE_HIT: &str = "notifier_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "notifier_cache_miss_total";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),
    #[error("cached value could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key/value store with per-entry time-to-live.
///
/// Values are JSON so that in-process and out-of-process backends can be
/// swapped without changing callers.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, CacheError>;

    async fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a key, reporting whether it was present.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;
}

/// Return the cached value for `key`, or compute, store and return it.
///
/// A failing `compute` propagates and nothing is stored. Backend faults and
/// undecodable entries degrade to a miss; concurrent misses may each compute.
pub async fn get_or_set<T, E, F, Fut>(
    backend: &dyn CacheBackend,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match backend.get(key).await {
        Ok(Some(value)) => match serde_json::from_value::<T>(value) {
            Ok(hit) => {
                counter!(METRIC_CACHE_HIT, "key" => key.to_string()).increment(1);
                debug!(target = "notifier::cache", key, "cache hit");
                return Ok(hit);
            }
            Err(err) => warn!(
                target = "notifier::cache",
                key,
                error = %err,
                "discarding undecodable cache entry"
            ),
        },
        Ok(None) => {}
        Err(err) => warn!(
            target = "notifier::cache",
            key,
            error = %err,
            "cache read failed; computing value"
        ),
    }

    counter!(METRIC_CACHE_MISS, "key" => key.to_string()).increment(1);
    debug!(target = "notifier::cache", key, "cache miss");

    let value = compute().await?;

    let stored = match serde_json::to_value(&value) {
        Ok(encoded) => backend.set(key, encoded, ttl).await,
        Err(err) => Err(CacheError::from(err)),
    };
    if let Err(err) = stored {
        warn!(
            target = "notifier::cache",
            key,
            error = %err,
            "cache write failed; value served uncached"
        );
    }

    Ok(value)
}
