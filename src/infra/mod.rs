//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod error;
pub mod http;
pub mod metadata;
pub mod senders;
pub mod telemetry;
