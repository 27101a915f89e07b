//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::chart::ChartOptions;
use crate::config::ApiConfig;
use crate::poller::PollerClient;
use crate::websocket::{ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Read access to the mounted poller
    pub poller: PollerClient,
    /// Where the poller fetches from, for status output
    pub source: String,
    /// Poll interval, for status output
    pub interval_secs: u64,
    /// Chart surface and line styles
    pub chart: Arc<ChartOptions>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for real-time updates
    pub ws_hub: Arc<ConnectionHub>,
}

impl AppState {
    pub fn new(
        poller: PollerClient,
        source: impl Into<String>,
        interval_secs: u64,
        chart: ChartOptions,
        config: &ApiConfig,
    ) -> Self {
        let hub_config = HubConfig {
            max_connections: config.max_ws_connections,
        };

        Self {
            poller,
            source: source.into(),
            interval_secs,
            chart: Arc::new(chart),
            start_time: Instant::now(),
            ws_hub: Arc::new(ConnectionHub::new(hub_config)),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
