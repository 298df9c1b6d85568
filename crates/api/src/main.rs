use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill_api::background::{CleanupQueue, CleanupWorker, Reconciler};
use quill_api::config::{CleanupConfig, ServerConfig};
use quill_api::router::build_app_router;
use quill_api::service::ArticleService;
use quill_api::state::AppState;
use quill_cloud::StorageConfig;
use quill_identity::{HttpIdentityResolver, IdentityConfig, IdentityResolver};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let storage_config = StorageConfig::from_env();
    let identity_config = IdentityConfig::from_env();
    let cleanup_config = CleanupConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = quill_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    quill_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    quill_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Object store ---
    let store = quill_cloud::build_object_store(&storage_config)
        .await
        .expect("Failed to initialise object store");

    // --- Identity resolver ---
    let identities: Arc<dyn IdentityResolver> = Arc::new(
        HttpIdentityResolver::new(&identity_config).expect("Failed to build identity resolver"),
    );
    tracing::info!(base_url = %identity_config.base_url, "Identity resolver configured");

    // --- Attachment cleanup ---
    let cancel = CancellationToken::new();
    let (cleanup_queue, cleanup_rx) = CleanupQueue::bounded(cleanup_config.queue_capacity);

    let worker = CleanupWorker::new(pool.clone(), Arc::clone(&store), &cleanup_config);
    let worker_handle = tokio::spawn(worker.run(cleanup_rx, cancel.clone()));

    let reconciler = Reconciler::new(pool.clone(), cleanup_queue.clone(), &cleanup_config);
    let reconciler_handle = tokio::spawn(reconciler.run(cancel.clone()));

    tracing::info!("Attachment cleanup worker and reconciler started");

    // --- App state ---
    let articles = Arc::new(ArticleService::new(
        pool.clone(),
        store,
        identities,
        cleanup_queue,
    ));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        articles,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, stopping background tasks");

    cancel.cancel();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(grace, worker_handle).await.is_err() {
        tracing::warn!("Cleanup worker did not stop in time");
    }
    if tokio::time::timeout(grace, reconciler_handle).await.is_err() {
        tracing::warn!("Reconciler did not stop in time");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Install the global subscriber. `LOG_FORMAT=json` selects JSON output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quill_api=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Wait for SIGINT or SIGTERM to start graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
