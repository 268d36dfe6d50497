//! Application services layer.

pub mod actions;
pub mod activity;
pub mod caching;
pub mod delivery;
pub mod documents;
pub mod error;
pub mod metadata;
pub mod notifications;
pub mod notifier;
pub mod pagination;
pub mod recipients;
pub mod repos;
pub mod sessions;
