//! Chart Route
//!
//! - GET /chart.svg - The current chart as a standalone SVG document

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::chart::render_svg;

/// GET /chart.svg
pub async fn chart_svg(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let snapshot = state.poller.snapshot();
    let svg = render_svg(snapshot.series.samples(), &state.chart)?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        svg,
    ))
}
