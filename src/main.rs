use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use nim_vision::{app_state::AppState, config::AppConfig, routes};

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

    tracing::info!("Initializing nim-vision server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("detection_jobs_total", "Detection jobs started");
    metrics::describe_counter!("detection_jobs_completed", "Detection jobs that produced an image");
    metrics::describe_counter!("detection_jobs_failed", "Detection jobs that failed at any stage");
    metrics::describe_counter!("detection_poll_attempts", "Status requests issued while polling");
    metrics::describe_histogram!(
        "detection_processing_seconds",
        "Time from upload to unpacked result image"
    );
    metrics::describe_counter!("describe_requests_total", "Image description requests");
    metrics::describe_counter!(
        "describe_stream_decode_warnings_total",
        "Stream chunks skipped because they were not valid JSON"
    );

    std::fs::create_dir_all(&config.output_dir).expect("Failed to create output directory");

    tracing::info!(
        detection_url = %config.detection_url,
        describe_url = %config.describe_url,
        max_poll_retries = config.max_poll_retries,
        "Initializing NVCF clients"
    );
    let state = AppState::from_config(&config).expect("Failed to build HTTP client");

    let app = routes::api_router(state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes));

    tracing::info!("Starting nim-vision on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
