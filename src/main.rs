use std::{process, sync::Arc};

use eesa_api_types::{Envelope, SnapshotResponse};
use eesa_catalog::{
    application::{error::AppError, repos::CatalogRepo, snapshot::SnapshotService},
    cache::{CacheConfig, SnapshotCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tokio::sync::Notify;
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
        config::Command::Snapshot(args) => run_snapshot(settings, args).await,
        config::Command::Invalidate(_) => run_invalidate(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings, settings.database.run_migrations).await?;
    let snapshots = build_snapshot_service(repositories.clone(), &settings)?;

    if settings.cache.warm_on_startup {
        if let Err(err) = snapshots.warm().await {
            warn!(error = %err, "Startup snapshot warm failed");
        }
    }

    let state = HttpState {
        snapshots,
        store: repositories,
    };
    serve_http(&settings, state).await
}

async fn run_snapshot(
    settings: config::Settings,
    args: config::SnapshotArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings, false).await?;
    let snapshots = build_snapshot_service(repositories, &settings)?;

    let snapshot = snapshots
        .get_batch_snapshot_for_query(&args.query())
        .await
        .map_err(AppError::from)?;

    let output = SnapshotResponse {
        envelope: Envelope::clone(&snapshot.envelope),
        meta: snapshot.meta,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .map_err(|err| AppError::unexpected(format!("failed to encode snapshot: {err}")))?;

    println!("{json}");
    Ok(())
}

async fn run_invalidate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings, false).await?;
    let version = repositories
        .bump_version()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(
        target = "eesa_catalog::invalidate",
        version, "Catalog version bumped"
    );
    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings, true).await?;
    info!(target = "eesa_catalog::migrate", "Migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
    run_migrations: bool,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    if run_migrations {
        PostgresRepositories::run_migrations(&pool)
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    }

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_snapshot_service(
    store: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<Arc<SnapshotService>, AppError> {
    let cache_config = CacheConfig::from(&settings.cache);
    let cache = SnapshotCache::from_config(&cache_config)
        .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
    info!(
        backend = cache.backend_name(),
        ttl_seconds = cache_config.ttl_seconds,
        "Snapshot cache configured"
    );

    let store: Arc<dyn CatalogRepo> = store;
    Ok(Arc::new(SnapshotService::new(
        store,
        cache,
        settings.snapshot.miss_timeout,
    )))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "Listening");

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown({
        let shutdown = Arc::clone(&shutdown);
        async move { shutdown.notified().await }
    });
    let mut handle = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut handle => return server_result(joined),
        _ = shutdown_signal() => {
            info!("Shutdown signal received, draining connections");
            shutdown.notify_one();
        }
    }

    match tokio::time::timeout(settings.server.graceful_shutdown, &mut handle).await {
        Ok(joined) => server_result(joined),
        Err(_) => {
            warn!(
                timeout_secs = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out"
            );
            handle.abort();
            Ok(())
        }
    }
}

fn server_result(
    joined: Result<Result<(), std::io::Error>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    joined
        .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
