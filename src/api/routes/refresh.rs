//! Refresh Route
//!
//! - POST /api/v1/refresh - Fetch now instead of waiting for the next tick

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::RefreshResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/refresh
///
/// Returns as soon as the tick is scheduled; the result arrives through the
/// usual series update.
pub async fn trigger_refresh(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<RefreshResponse>)> {
    let tick = state.poller.refresh().await?;

    tracing::info!(tick, "Refresh accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            status: "accepted".to_string(),
            tick,
        }),
    ))
}
