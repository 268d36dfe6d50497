//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{CliArgs, Command, DatabaseOverride, MigrateArgs, ServeArgs, ServeOverrides};

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "notifier";
const ENV_PREFIX: &str = "NOTIFIER";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_CAPACITY: u64 = 256;
const DEFAULT_CACHE_DOCUMENT_TTL_SECS: u64 = 60;
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_METADATA_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
const DEFAULT_METADATA_IDS: [u64; 3] = [1, 2, 3];
const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 5;
const DEFAULT_ACTIVITY_LOG_PATH: &str = "activity.log";
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 2 * 1024 * 1024;
const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 14 * 24 * 60 * 60;
const DEFAULT_DEMO_ACTOR_KIND: &str = "admin";
const DEFAULT_DEMO_ACTOR_NAME: &str = "Ben";
const DEFAULT_DEMO_DOCUMENT: &str = "project_plan.pdf";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub delivery: DeliverySettings,
    pub metadata: MetadataSettings,
    pub activity: ActivitySettings,
    pub uploads: UploadSettings,
    pub sessions: SessionSettings,
    pub demo: DemoSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub capacity: NonZeroU32,
    pub document_ttl_seconds: NonZeroU64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Log the message and hand out a random message id.
    Log,
    /// POST the message to an HTTP endpoint.
    Webhook { url: String },
}

#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub mode: DeliveryMode,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MetadataSettings {
    pub enabled: bool,
    pub base_url: String,
    pub ids: Vec<u64>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ActivitySettings {
    pub log_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Sessions untouched for this long are dropped.
    pub idle_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DemoSettings {
    pub actor_kind: String,
    pub actor_name: String,
    pub document: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("metadata.ids")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    delivery: RawDeliverySettings,
    metadata: RawMetadataSettings,
    activity: RawActivitySettings,
    uploads: RawUploadSettings,
    sessions: RawSessionSettings,
    demo: RawDemoSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(ttl) = overrides.cache_document_ttl_seconds {
            self.cache.document_ttl_seconds = Some(ttl);
        }
        if let Some(mode) = overrides.delivery_mode.as_ref() {
            self.delivery.mode = Some(mode.clone());
        }
        if let Some(url) = overrides.delivery_webhook_url.as_ref() {
            self.delivery.webhook_url = Some(url.clone());
        }
        if let Some(enabled) = overrides.metadata_enabled {
            self.metadata.enabled = Some(enabled);
        }
        if let Some(path) = overrides.activity_log_path.as_ref() {
            self.activity.log_path = Some(path.clone());
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            delivery,
            metadata,
            activity,
            uploads,
            sessions,
            demo,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            delivery: build_delivery_settings(delivery)?,
            metadata: build_metadata_settings(metadata)?,
            activity: build_activity_settings(activity)?,
            uploads: build_upload_settings(uploads)?,
            sessions: build_session_settings(sessions)?,
            demo: build_demo_settings(demo)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = non_zero_u32(
        cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        "cache.capacity",
    )?;
    let document_ttl_seconds = NonZeroU64::new(
        cache
            .document_ttl_seconds
            .unwrap_or(DEFAULT_CACHE_DOCUMENT_TTL_SECS),
    )
    .ok_or_else(|| LoadError::invalid("cache.document_ttl_seconds", "must be greater than zero"))?;

    Ok(CacheSettings {
        capacity,
        document_ttl_seconds,
    })
}

fn build_delivery_settings(delivery: RawDeliverySettings) -> Result<DeliverySettings, LoadError> {
    let mode_name = delivery
        .mode
        .map(|mode| mode.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "log".to_string());

    let mode = match mode_name.as_str() {
        "log" => DeliveryMode::Log,
        "webhook" => {
            let url = non_blank(delivery.webhook_url).ok_or_else(|| {
                LoadError::invalid(
                    "delivery.webhook_url",
                    "required when delivery.mode is `webhook`",
                )
            })?;
            DeliveryMode::Webhook { url }
        }
        other => {
            return Err(LoadError::invalid(
                "delivery.mode",
                format!("unknown mode `{other}`, expected `log` or `webhook`"),
            ));
        }
    };

    let timeout = positive_seconds(
        delivery
            .timeout_seconds
            .unwrap_or(DEFAULT_DELIVERY_TIMEOUT_SECS),
        "delivery.timeout_seconds",
    )?;

    Ok(DeliverySettings { mode, timeout })
}

fn build_metadata_settings(metadata: RawMetadataSettings) -> Result<MetadataSettings, LoadError> {
    let base_url =
        non_blank(metadata.base_url).unwrap_or_else(|| DEFAULT_METADATA_BASE_URL.to_string());
    let ids = metadata
        .ids
        .unwrap_or_else(|| DEFAULT_METADATA_IDS.to_vec());
    let timeout = positive_seconds(
        metadata
            .timeout_seconds
            .unwrap_or(DEFAULT_METADATA_TIMEOUT_SECS),
        "metadata.timeout_seconds",
    )?;

    Ok(MetadataSettings {
        enabled: metadata.enabled.unwrap_or(false),
        base_url,
        ids,
        timeout,
    })
}

fn build_activity_settings(activity: RawActivitySettings) -> Result<ActivitySettings, LoadError> {
    let log_path = activity
        .log_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ACTIVITY_LOG_PATH));
    if log_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "activity.log_path",
            "path must not be empty",
        ));
    }

    Ok(ActivitySettings { log_path })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings { max_request_bytes })
}

fn build_session_settings(sessions: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    let idle_timeout = positive_seconds(
        sessions
            .idle_timeout_seconds
            .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
        "sessions.idle_timeout_seconds",
    )?;

    Ok(SessionSettings { idle_timeout })
}

fn build_demo_settings(demo: RawDemoSettings) -> Result<DemoSettings, LoadError> {
    Ok(DemoSettings {
        actor_kind: non_blank(demo.actor_kind)
            .unwrap_or_else(|| DEFAULT_DEMO_ACTOR_KIND.to_string()),
        actor_name: non_blank(demo.actor_name)
            .unwrap_or_else(|| DEFAULT_DEMO_ACTOR_NAME.to_string()),
        document: non_blank(demo.document).unwrap_or_else(|| DEFAULT_DEMO_DOCUMENT.to_string()),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    capacity: Option<u64>,
    document_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDeliverySettings {
    mode: Option<String>,
    webhook_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMetadataSettings {
    enabled: Option<bool>,
    base_url: Option<String>,
    ids: Option<Vec<u64>>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawActivitySettings {
    log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    idle_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDemoSettings {
    actor_kind: Option<String>,
    actor_name: Option<String>,
    document: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn positive_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

#[cfg(test)]
mod tests;
