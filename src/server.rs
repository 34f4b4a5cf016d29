use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Config,
    handlers::{self, AppState},
    metrics,
    signals::setup_signal_handlers,
    store::EventStore,
    sweeper::{spawn_sweep_task, SweepConfig},
};

/// Largest webhook body accepted (GitLab pipeline hooks embed all builds)
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Start the exporter server
///
/// This function:
/// 1. Initializes process metrics
/// 2. Creates the event store and its sweep task
/// 3. Sets up signal handlers for graceful shutdown
/// 4. Binds to the configured address
/// 5. Serves requests until shutdown, then stops the sweeper
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics()?);

    let store = Arc::new(EventStore::new(config.cache.ttl()));

    // Setup signal handlers (SIGTERM, SIGINT for shutdown)
    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let sweep_handle = spawn_sweep_task(
        store.clone(),
        SweepConfig {
            interval: config.cache.sweep_interval(),
        },
        shutdown_tx.subscribe(),
    );

    let app = create_router(AppState {
        store,
        metrics_handle,
    });

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting GitLab CI exporter on {}", addr);
    info!(
        ttl_seconds = config.cache.ttl_seconds,
        sweep_interval_ms = config.cache.sweep_interval_ms,
        "Cache configured"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    // Wait for background tasks to complete
    signal_handle.await?;
    sweep_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Webhook intake and scrape share the root path
        .route(
            "/",
            get(handlers::metrics_handler::metrics).post(handlers::webhook::handle_webhook),
        )
        .route("/webhook", post(handlers::webhook::handle_webhook))
        .route("/metrics", get(handlers::metrics_handler::metrics))
        .route("/health", get(handlers::health::health_check))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
