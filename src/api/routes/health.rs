//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (a series is being shown)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::poller::PollStatus;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 once at least one fetch has succeeded.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.poller.snapshot().applied_tick.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.poller.snapshot();
    let poller = snapshot.status();

    let overall = match poller {
        PollStatus::Ready => "healthy",
        PollStatus::Degraded => "degraded",
        PollStatus::Waiting => "starting",
        PollStatus::Failing => "unhealthy",
    };

    Json(HealthResponse {
        status: overall.to_string(),
        poller,
        samples: snapshot.series.len(),
        ws_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
