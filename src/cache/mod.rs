//! Key/value caching with per-entry expiry.
//!
//! [`CacheBackend`] is the contract callers depend on; [`MemoryCache`] is the
//! in-process implementation used by default. [`get_or_set`] layers the
//! read-through behaviour and the hit/miss counters on top of any backend.

mod backend;
mod config;
mod store;

pub use backend::{CacheBackend, CacheError, METRIC_CACHE_HIT, METRIC_CACHE_MISS, get_or_set};
pub use config::CacheConfig;
pub use store::MemoryCache;
