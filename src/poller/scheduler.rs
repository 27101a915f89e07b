//! Poll Scheduler
//!
//! Runs the repeating fetch timer for one mounted dashboard.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use super::state::{ApplyOutcome, PollFailure, PollSnapshot};
use crate::config::PollerConfig;
use crate::series::Series;
use crate::source::{DataSource, FetchError};

/// Capacity of the manual refresh queue
const REFRESH_QUEUE: usize = 8;

/// Errors from talking to a poller
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Poller has stopped")]
    Stopped,
}

/// Polls a source on a fixed interval
pub struct Poller {
    source: Arc<dyn DataSource>,
    config: PollerConfig,
}

impl Poller {
    pub fn new(source: Arc<dyn DataSource>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// Start the timer
    ///
    /// The returned handle owns the timer: dropping it stops all further
    /// ticks and aborts fetches still in flight.
    pub fn mount(self) -> PollerHandle {
        let (state_tx, state_rx) = watch::channel(PollSnapshot::default());
        let (refresh_tx, refresh_rx) = mpsc::channel(REFRESH_QUEUE);

        tracing::info!(
            source = %self.source.describe(),
            interval_secs = self.config.interval().as_secs(),
            "Mounting poller"
        );

        let task = tokio::spawn(run(self.source, self.config, state_tx, refresh_rx));

        PollerHandle {
            client: PollerClient {
                state: state_rx,
                refresh: refresh_tx,
            },
            task,
        }
    }
}

/// Owner of a mounted poller
pub struct PollerHandle {
    client: PollerClient,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// A cloneable client that does not keep the poller alive
    pub fn client(&self) -> PollerClient {
        self.client.clone()
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.client.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.client.subscribe()
    }

    pub async fn refresh(&self) -> Result<u64, PollerError> {
        self.client.refresh().await
    }

    /// Stop the timer and wait for the task to finish
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        tracing::info!("Poller unmounted");
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Read access and refresh requests for a mounted poller
#[derive(Clone)]
pub struct PollerClient {
    state: watch::Receiver<PollSnapshot>,
    refresh: mpsc::Sender<oneshot::Sender<u64>>,
}

impl PollerClient {
    /// Current state
    pub fn snapshot(&self) -> PollSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.state.clone()
    }

    /// Request an immediate out-of-band tick, returning its tick number
    pub async fn refresh(&self) -> Result<u64, PollerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.refresh
            .send(reply_tx)
            .await
            .map_err(|_| PollerError::Stopped)?;
        reply_rx.await.map_err(|_| PollerError::Stopped)
    }
}

type FetchOutcome = (u64, Result<Series, FetchError>);

async fn run(
    source: Arc<dyn DataSource>,
    config: PollerConfig,
    state: watch::Sender<PollSnapshot>,
    mut refresh: mpsc::Receiver<oneshot::Sender<u64>>,
) {
    let period = config.interval();
    let start = if config.fetch_on_start {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut timer = tokio::time::interval_at(start, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Dropped with this task, which aborts any fetch still running
    let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
    let mut next_tick: u64 = 0;

    loop {
        tokio::select! {
            _ = timer.tick() => {
                next_tick += 1;
                start_fetch(&source, &state, &mut in_flight, next_tick);
            }
            request = refresh.recv() => {
                let Some(reply) = request else {
                    break;
                };
                next_tick += 1;
                tracing::info!(tick = next_tick, "Manual refresh requested");
                start_fetch(&source, &state, &mut in_flight, next_tick);
                let _ = reply.send(next_tick);
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                match joined {
                    Ok((tick, result)) => apply_result(&state, &config, tick, result),
                    Err(e) => tracing::error!(error = %e, "Fetch task failed"),
                }
            }
        }
    }

    tracing::debug!("Poller loop exited");
}

fn start_fetch(
    source: &Arc<dyn DataSource>,
    state: &watch::Sender<PollSnapshot>,
    in_flight: &mut JoinSet<FetchOutcome>,
    tick: u64,
) {
    state.send_modify(|snapshot| snapshot.ticks_started = tick);
    tracing::debug!(tick, in_flight = in_flight.len(), "Tick");

    let source = Arc::clone(source);
    in_flight.spawn(async move { (tick, source.fetch().await) });
}

fn apply_result(
    state: &watch::Sender<PollSnapshot>,
    config: &PollerConfig,
    tick: u64,
    result: Result<Series, FetchError>,
) {
    match result {
        Ok(series) => {
            if let Err(e) = series.check_order() {
                tracing::warn!(tick, error = %e, "Fetched series is not in year order");
            }
            let samples = series.len();

            let mut outcome = ApplyOutcome::Stale;
            state.send_if_modified(|snapshot| {
                outcome = snapshot.apply_success(tick, series, config.update_mode);
                outcome == ApplyOutcome::Applied
            });

            match outcome {
                ApplyOutcome::Applied => tracing::info!(tick, samples, "Series updated"),
                ApplyOutcome::Stale => {
                    tracing::debug!(tick, "Discarding response older than shown data")
                }
            }
        }
        Err(e) => {
            tracing::warn!(tick, kind = %e.kind(), error = %e, "Fetch failed");

            let failure = PollFailure::from_error(tick, &e);
            state.send_if_modified(|snapshot| {
                snapshot.apply_failure(failure) == ApplyOutcome::Applied
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateMode;
    use crate::poller::PollStatus;
    use crate::series::{AnimalCount, SeriesError};
    use crate::source::FailureKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source that plays back scripted responses, then a fallback
    struct ScriptedSource {
        calls: AtomicUsize,
        script: Mutex<VecDeque<(Duration, Result<Series, FetchError>)>>,
        fallback: Series,
    }

    impl ScriptedSource {
        fn new(script: Vec<(Duration, Result<Series, FetchError>)>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
                fallback: series(&[100]),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        async fn fetch(&self) -> Result<Series, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some((delay, result)) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    result
                }
                None => Ok(self.fallback.clone()),
            }
        }
    }

    fn series(years: &[u32]) -> Series {
        Series::new(years.iter().map(|&y| AnimalCount::new(y, y + 1, y + 2)).collect())
    }

    fn malformed() -> FetchError {
        FetchError::Decode(SeriesError::Malformed("expected `res`".into()))
    }

    fn config(fetch_on_start: bool) -> PollerConfig {
        PollerConfig {
            interval_secs: 10,
            fetch_on_start,
            update_mode: UpdateMode::Replace,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval() {
        let source = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(series(&[0]))),
            (Duration::ZERO, Ok(series(&[0, 10]))),
        ]);
        let handle = Poller::new(source.clone(), config(false)).mount();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls(), 0);
        assert_eq!(handle.snapshot().status(), PollStatus::Waiting);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(source.calls(), 2);

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.applied_tick, Some(2));
        assert_eq!(snapshot.ticks_started, 2);
        assert_eq!(snapshot.series.years(), vec![0, 10]);
        assert_eq!(snapshot.status(), PollStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_keeps_series_and_polling_continues() {
        let source = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(series(&[0, 10]))),
            (Duration::ZERO, Err(malformed())),
        ]);
        let handle = Poller::new(source.clone(), config(true)).mount();

        tokio::time::sleep(Duration::from_secs(15)).await;
        let snapshot = handle.snapshot();
        assert_eq!(source.calls(), 2);
        assert_eq!(snapshot.series.years(), vec![0, 10]);
        assert_eq!(snapshot.status(), PollStatus::Degraded);
        assert_eq!(
            snapshot.last_failure.as_ref().map(|f| f.kind),
            Some(FailureKind::Malformed)
        );

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = handle.snapshot();
        assert_eq!(source.calls(), 3);
        assert_eq!(snapshot.series.years(), vec![100]);
        assert_eq!(snapshot.status(), PollStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_before_any_data() {
        let source = ScriptedSource::new(vec![(
            Duration::ZERO,
            Err(FetchError::Status { status: 500 }),
        )]);
        let handle = Poller::new(source.clone(), config(true)).mount();

        tokio::time::sleep(Duration::from_secs(1)).await;
        let snapshot = handle.snapshot();
        assert!(snapshot.series.is_empty());
        assert_eq!(snapshot.status(), PollStatus::Failing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_drop() {
        let source = ScriptedSource::new(vec![]);
        let handle = Poller::new(source.clone(), config(true)).mount();

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(source.calls(), 2);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_in_flight_fetch() {
        let source = ScriptedSource::new(vec![(Duration::from_secs(30), Ok(series(&[1])))]);
        let handle = Poller::new(source.clone(), config(true)).mount();
        let client = handle.client();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 1);

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(source.calls(), 1);
        assert!(client.snapshot().applied_tick.is_none());
        assert!(matches!(client.refresh().await, Err(PollerError::Stopped)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_does_not_regress_series() {
        // Tick 1 answers at t=15s, tick 2 (started at t=10s) answers at t=11s
        let source = ScriptedSource::new(vec![
            (Duration::from_secs(15), Ok(series(&[0]))),
            (Duration::from_secs(1), Ok(series(&[0, 10]))),
        ]);
        let handle = Poller::new(source.clone(), config(true)).mount();

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(handle.snapshot().applied_tick, Some(2));

        tokio::time::sleep(Duration::from_secs(4)).await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.applied_tick, Some(2));
        assert_eq!(snapshot.series.years(), vec![0, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh() {
        let source = ScriptedSource::new(vec![(Duration::ZERO, Ok(series(&[5])))]);
        let handle = Poller::new(source.clone(), config(false)).mount();

        let tick = handle.refresh().await.unwrap();
        assert_eq!(tick, 1);

        let mut updates = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.applied_tick.is_some()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(handle.snapshot().series.years(), vec![5]);

        // The timer keeps its own schedule: next tick at t=10s is tick 2
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(handle.snapshot().applied_tick, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_mode() {
        let source = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(series(&[0, 10]))),
            (Duration::ZERO, Ok(series(&[20]))),
        ]);
        let config = PollerConfig {
            update_mode: UpdateMode::Merge,
            ..config(true)
        };
        let handle = Poller::new(source.clone(), config).mount();

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(handle.snapshot().series.years(), vec![0, 10, 20]);
    }
}
