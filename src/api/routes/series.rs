//! Series Routes
//!
//! - GET /api/v1/series - Charted series as JSON
//! - GET /api/v1/status - Poller status and last failure

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{SeriesResponse, StatusResponse};
use crate::api::state::AppState;

/// GET /api/v1/series
pub async fn get_series(State(state): State<Arc<AppState>>) -> Json<SeriesResponse> {
    Json(SeriesResponse::from(&state.poller.snapshot()))
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.poller.snapshot();

    Json(StatusResponse {
        status: snapshot.status(),
        source: state.source.clone(),
        interval_secs: state.interval_secs,
        samples: snapshot.series.len(),
        applied_tick: snapshot.applied_tick,
        ticks_started: snapshot.ticks_started,
        last_success_at: snapshot.last_success_at,
        last_failure: snapshot.last_failure,
    })
}
