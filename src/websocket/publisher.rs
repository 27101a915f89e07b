//! Poller → hub bridge
//!
//! Watches the poller state and turns each change into hub events.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::hub::ConnectionHub;
use super::messages::WsEvent;
use crate::poller::PollSnapshot;

/// Forward poller changes to subscribed connections
///
/// The task ends when the poller it watches is unmounted.
pub fn spawn_publisher(
    mut updates: watch::Receiver<PollSnapshot>,
    hub: Arc<ConnectionHub>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (mut applied, mut failed) = {
            let current = updates.borrow_and_update();
            (current.applied_tick, failure_tick(&current))
        };

        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();

            if snapshot.applied_tick != applied {
                applied = snapshot.applied_tick;
                let sent = hub.broadcast(&WsEvent::series_updated(&snapshot)).await;
                tracing::debug!(tick = ?applied, subscribers = sent, "Published series update");
            }

            let latest_failure = failure_tick(&snapshot);
            if latest_failure != failed {
                failed = latest_failure;
                if let Some(failure) = &snapshot.last_failure {
                    hub.broadcast(&WsEvent::poll_failed(failure, snapshot.status())).await;
                }
            }
        }

        tracing::debug!("Poller stopped, publisher exiting");
    })
}

fn failure_tick(snapshot: &PollSnapshot) -> Option<u64> {
    snapshot.last_failure.as_ref().map(|f| f.tick)
}
