//! Poll State
//!
//! The observable state of a mounted poller and the sequencing rules for
//! applying fetch results to it. Results are tagged with the tick that
//! started them; a result only lands if it is newer than what is shown.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::config::UpdateMode;
use crate::series::Series;
use crate::source::{FailureKind, FetchError};

/// Point-in-time view of the poller
#[derive(Debug, Clone, Default)]
pub struct PollSnapshot {
    /// Series currently shown
    pub series: Arc<Series>,
    /// Tick whose result produced `series`
    pub applied_tick: Option<u64>,
    /// Number of ticks started so far
    pub ticks_started: u64,
    /// When `series` was last replaced
    pub last_success_at: Option<DateTime<Utc>>,
    /// Most recent failure newer than the shown data
    pub last_failure: Option<PollFailure>,
}

/// Overall health of the poller
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    /// Nothing fetched yet and nothing failed
    Waiting,
    /// Data shown, newest attempt succeeded
    Ready,
    /// Data shown, but a newer attempt failed
    Degraded,
    /// No data, and attempts are failing
    Failing,
}

impl std::fmt::Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollStatus::Waiting => write!(f, "waiting"),
            PollStatus::Ready => write!(f, "ready"),
            PollStatus::Degraded => write!(f, "degraded"),
            PollStatus::Failing => write!(f, "failing"),
        }
    }
}

/// A failed fetch attempt
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PollFailure {
    pub tick: u64,
    pub kind: FailureKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl PollFailure {
    pub fn from_error(tick: u64, error: &FetchError) -> Self {
        Self {
            tick,
            kind: error.kind(),
            message: error.to_string(),
            at: Utc::now(),
        }
    }
}

/// Whether a result changed the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// An equal or newer tick already landed
    Stale,
}

impl PollSnapshot {
    /// Derive the overall status
    pub fn status(&self) -> PollStatus {
        match (self.applied_tick, &self.last_failure) {
            (None, None) => PollStatus::Waiting,
            (None, Some(_)) => PollStatus::Failing,
            (Some(applied), Some(failure)) if failure.tick > applied => PollStatus::Degraded,
            (Some(_), _) => PollStatus::Ready,
        }
    }

    /// True if `tick` is newer than the data shown
    pub fn is_newer(&self, tick: u64) -> bool {
        self.applied_tick.map_or(true, |applied| tick > applied)
    }

    /// Apply a successful fetch for `tick`
    pub fn apply_success(&mut self, tick: u64, fetched: Series, mode: UpdateMode) -> ApplyOutcome {
        if !self.is_newer(tick) {
            return ApplyOutcome::Stale;
        }

        let series = match mode {
            UpdateMode::Replace => fetched,
            UpdateMode::Merge => self.series.merged_with(&fetched),
        };

        self.series = Arc::new(series);
        self.applied_tick = Some(tick);
        self.last_success_at = Some(Utc::now());

        if self
            .last_failure
            .as_ref()
            .is_some_and(|failure| failure.tick < tick)
        {
            self.last_failure = None;
        }

        ApplyOutcome::Applied
    }

    /// Record a failed fetch; the shown series is never touched
    pub fn apply_failure(&mut self, failure: PollFailure) -> ApplyOutcome {
        let newer_than_recorded = self
            .last_failure
            .as_ref()
            .map_or(true, |recorded| failure.tick > recorded.tick);

        if !self.is_newer(failure.tick) || !newer_than_recorded {
            return ApplyOutcome::Stale;
        }

        self.last_failure = Some(failure);
        ApplyOutcome::Applied
    }
}
