//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! dashboard pages and the popchart server.

use serde::{Deserialize, Serialize};

use crate::poller::{PollFailure, PollSnapshot, PollStatus};
use crate::series::SeriesSummary;
use crate::source::FailureKind;

/// Topic carrying series changes
pub const TOPIC_SERIES: &str = "series";
/// Topic carrying poll failures
pub const TOPIC_STATUS: &str = "status";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// Topics to subscribe to (`series`, `status`)
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The charted series changed; clients should re-render
    SeriesUpdated {
        /// Tick whose result is now shown
        tick: u64,
        /// Number of samples charted
        samples: usize,
        summary: SeriesSummary,
        /// Poller status after the update; a newer failure keeps it degraded
        status: PollStatus,
    },
    /// A fetch failed; the chart keeps its previous data
    PollFailed {
        tick: u64,
        kind: FailureKind,
        message: String,
        status: PollStatus,
    },
    /// Subscription confirmed
    Subscribed { topics: Vec<String> },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
    /// Connection established
    Connected { connection_id: String },
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub topic: String,
    pub message: ServerMessage,
}

impl WsEvent {
    /// Series changed event built from the poller state
    pub fn series_updated(snapshot: &PollSnapshot) -> Self {
        Self {
            topic: TOPIC_SERIES.to_string(),
            message: ServerMessage::SeriesUpdated {
                tick: snapshot.applied_tick.unwrap_or(0),
                samples: snapshot.series.len(),
                summary: snapshot.series.summary(),
                status: snapshot.status(),
            },
        }
    }

    /// Failure event, with the poller status it left behind
    pub fn poll_failed(failure: &PollFailure, status: PollStatus) -> Self {
        Self {
            topic: TOPIC_STATUS.to_string(),
            message: ServerMessage::PollFailed {
                tick: failure.tick,
                kind: failure.kind,
                message: failure.message.clone(),
                status,
            },
        }
    }
}
