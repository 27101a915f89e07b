//! Dashboard HTTP API
//!
//! HTTP layer for the population dashboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Dashboard
//! - `GET /` - Dashboard page with the chart inlined
//! - `GET /chart.svg` - Current chart
//!
//! ## Series
//! - `GET /api/v1/series` - Charted series as JSON
//! - `GET /api/v1/status` - Poller status
//! - `POST /api/v1/refresh` - Fetch immediately
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Real-time update stream
//!
//! # Example
//!
//! ```rust,no_run
//! use popchart::api::{serve, AppState};
//! use popchart::chart::ChartOptions;
//! use popchart::config::Config;
//! use popchart::poller::Poller;
//! use popchart::source::source_from_config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let source = source_from_config(&config.source)?;
//!     let label = source.describe();
//!     let handle = Poller::new(source, config.poller.clone()).mount();
//!
//!     let state = AppState::new(
//!         handle.client(),
//!         label,
//!         config.poller.interval().as_secs(),
//!         ChartOptions::from(&config.chart),
//!         &config.api,
//!     );
//!     serve(state, &config.api).await?;
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use crate::config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::{spawn_publisher, websocket_handler};

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/series", get(routes::series::get_series))
        .route("/status", get(routes::series::get_status))
        .route("/refresh", post(routes::refresh::trigger_refresh));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::dashboard::dashboard))
        .route("/chart.svg", get(routes::chart::chart_svg))
        .route("/ws", get(websocket_handler))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the dashboard server
///
/// Runs until Ctrl+C or SIGTERM. Poller changes are pushed to WebSocket
/// subscribers for as long as the server runs.
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let publisher = spawn_publisher(state.poller.subscribe(), Arc::clone(&state.ws_hub));
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Dashboard listening on http://{}", addr);

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)));

    publisher.abort();
    result?;

    tracing::info!("Dashboard shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
