use std::{process, sync::Arc, time::Duration};

use notifier::{
    application::{
        caching::DocumentPayloadCache,
        delivery::NotificationSender,
        documents::DocumentService,
        error::AppError,
        metadata::MetadataFetcher,
        notifications::NotificationService,
        notifier::UploadNotifier,
        recipients::RecipientService,
        repos::{DocumentsRepo, DocumentsWriteRepo, NotificationsRepo},
        sessions::SessionStore,
    },
    cache::{CacheBackend, CacheConfig, MemoryCache},
    config::{self, DeliveryMode},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState, NotifyViewConfig},
        metadata::HttpMetadataFetcher,
        senders::{LogSender, WebhookSender},
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;
    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings)?;
    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(target = "notifier::migrate", "Migrations applied");
    Ok(())
}

async fn connect_pool(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = connect_pool(settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_sender(settings: &config::Settings) -> Result<Arc<dyn NotificationSender>, AppError> {
    let sender: Arc<dyn NotificationSender> = match &settings.delivery.mode {
        DeliveryMode::Log => Arc::new(LogSender),
        DeliveryMode::Webhook { url } => {
            Arc::new(WebhookSender::new(url, settings.delivery.timeout).map_err(AppError::from)?)
        }
    };
    Ok(sender)
}

fn build_metadata_fetcher(
    settings: &config::Settings,
) -> Result<Option<Arc<dyn MetadataFetcher>>, AppError> {
    if !settings.metadata.enabled {
        return Ok(None);
    }
    let fetcher = HttpMetadataFetcher::new(&settings.metadata.base_url, settings.metadata.timeout)
        .map_err(AppError::from)?;
    Ok(Some(Arc::new(fetcher)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let documents_repo: Arc<dyn DocumentsRepo> = repositories.clone();
    let documents_write_repo: Arc<dyn DocumentsWriteRepo> = repositories.clone();
    let notifications_repo: Arc<dyn NotificationsRepo> = repositories.clone();

    let cache_config = CacheConfig::from(&settings.cache);
    let backend: Arc<dyn CacheBackend> = Arc::new(MemoryCache::new(&cache_config));
    let listing = DocumentPayloadCache::new(backend, documents_repo.clone())
        .with_ttl(cache_config.document_ttl());

    let documents = Arc::new(DocumentService::new(
        documents_repo.clone(),
        documents_write_repo,
        listing,
    ));
    let notifications = Arc::new(NotificationService::new(
        notifications_repo,
        documents_repo,
        build_sender(settings)?,
    ));

    let sessions = SessionStore::with_idle_timeout(settings.sessions.idle_timeout);
    let recipients = Arc::new(RecipientService::new(sessions.clone()));

    let upload_limit_bytes = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| AppError::unexpected("upload limit exceeds usize"))?;

    Ok(HttpState {
        documents,
        notifications,
        notifier: Arc::new(UploadNotifier::with_default_subscribers()),
        sessions,
        recipients,
        metadata: build_metadata_fetcher(settings)?,
        notify: NotifyViewConfig {
            actor_kind: settings.demo.actor_kind.clone(),
            actor_name: settings.demo.actor_name.clone(),
            document_name: settings.demo.document.clone(),
            activity_log: settings.activity.log_path.clone(),
            metadata_ids: settings.metadata.ids.clone(),
        },
        db: Some(repositories),
        upload_limit_bytes,
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "notifier::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let grace = settings.server.graceful_shutdown;
    let (draining_tx, draining_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = draining_tx.send(());
        },
    );

    tokio::select! {
        result = async { server.await } => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        _ = drain_deadline(draining_rx, grace) => {
            warn!(
                target = "notifier::serve",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out"
            );
            Ok(())
        }
    }
}

/// Resolves `grace` after shutdown starts; never resolves otherwise.
async fn drain_deadline(draining: oneshot::Receiver<()>, grace: Duration) {
    if draining.await.is_ok() {
        tokio::time::sleep(grace).await;
    } else {
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "notifier::serve", error = %err, "failed to listen for shutdown signal");
    }
    info!(target = "notifier::serve", "Shutdown signal received");
}
