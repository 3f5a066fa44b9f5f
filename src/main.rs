mod app_state;
mod config;
mod models;
mod routes;
mod services;

use std::sync::Arc;

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::clock::SystemClock;
use services::provider::DeepLClient;
use services::registry::JobRegistry;
use services::runner::JobRunner;
use services::storage::FileStore;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing doc-translate server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("translation_jobs_total", "Total translation jobs accepted");
    metrics::describe_counter!(
        "translation_jobs_completed",
        "Total translation jobs completed"
    );
    metrics::describe_counter!("translation_jobs_failed", "Total translation jobs that failed");
    metrics::describe_histogram!(
        "translation_duration_seconds",
        "Wall time from job start to completion"
    );

    // Initialize the flat file store for uploads and results
    tracing::info!(upload_dir = %config.upload_dir, "Initializing file store");
    let storage =
        Arc::new(FileStore::new(&config.upload_dir).expect("Failed to initialize file store"));

    // Initialize the DeepL client
    tracing::info!(api_url = %config.deepl_api_url, "Initializing DeepL client");
    let provider = Arc::new(DeepLClient::new(
        config.deepl_api_url.clone(),
        config.deepl_api_key.clone(),
    ));

    let registry = Arc::new(JobRegistry::new());
    let clock = Arc::new(SystemClock::new());

    let runner = JobRunner::new(
        Arc::clone(&registry),
        provider,
        Arc::clone(&storage),
        clock,
        config.runner_config(),
    );

    // Create shared application state
    let state = AppState::new(registry, storage, runner);

    // Build API routes
    let app = routes::router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(30 * 1024 * 1024)); // 30 MB upload limit

    tracing::info!("Starting doc-translate on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
