//! Data Transfer Objects
//!
//! Response types for the API endpoints, serialized to JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::poller::{PollFailure, PollSnapshot, PollStatus};
use crate::series::{AnimalCount, SeriesSummary};

// ============================================
// SERIES DTOs
// ============================================

/// Series response, a superset of the result document
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    /// Samples in series order, same shape as `/result.json`
    pub res: Vec<AnimalCount>,
    pub summary: SeriesSummary,
    /// Tick whose result is shown, absent before the first success
    pub tick: Option<u64>,
}

impl From<&PollSnapshot> for SeriesResponse {
    fn from(snapshot: &PollSnapshot) -> Self {
        Self {
            res: snapshot.series.samples().to_vec(),
            summary: snapshot.series.summary(),
            tick: snapshot.applied_tick,
        }
    }
}

// ============================================
// STATUS DTOs
// ============================================

/// Poller status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: PollStatus,
    /// Where results are fetched from
    pub source: String,
    pub interval_secs: u64,
    pub samples: usize,
    pub applied_tick: Option<u64>,
    pub ticks_started: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure: Option<PollFailure>,
}

/// Manual refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Status: "accepted"
    pub status: String,
    /// Tick number assigned to the refresh
    pub tick: u64,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded, starting, unhealthy
    pub status: String,
    /// Poller status
    pub poller: PollStatus,
    /// Samples currently charted
    pub samples: usize,
    /// Open WebSocket connections
    pub ws_connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateMode;
    use crate::series::Series;

    #[test]
    fn test_series_response_keeps_result_shape() {
        let mut snapshot = PollSnapshot::default();
        snapshot.apply_success(
            3,
            Series::new(vec![AnimalCount::new(2020, 10, 2)]),
            UpdateMode::Replace,
        );

        let json = serde_json::to_value(SeriesResponse::from(&snapshot)).unwrap();
        assert_eq!(json["res"][0]["year"], 2020);
        assert_eq!(json["res"][0]["num_herbs"], 10);
        assert_eq!(json["res"][0]["num_carns"], 2);
        assert_eq!(json["tick"], 3);
        assert_eq!(json["summary"]["samples"], 1);
    }

    #[test]
    fn test_empty_series_response() {
        let json = serde_json::to_value(SeriesResponse::from(&PollSnapshot::default())).unwrap();
        assert_eq!(json["res"], serde_json::json!([]));
        assert!(json["tick"].is_null());
    }
}
