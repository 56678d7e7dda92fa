//! Repeating countdown driver for a verification flow

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::service::VerificationFlow;
use super::traits::{EnrolleeApi, SessionStore};
use super::types::TimerSnapshot;

/// Background task ticking a [`VerificationFlow`] once per period
///
/// Every tick settles the timer against the clock and publishes a fresh
/// [`TimerSnapshot`]. The task ends when the flow finishes or every receiver
/// is gone, and is aborted when the ticker is dropped, so no countdown keeps
/// running after its view is torn down.
pub struct CountdownTicker {
    handle: JoinHandle<()>,
}

impl CountdownTicker {
    /// Start ticking `flow` every `period`
    ///
    /// The receiver holds the current snapshot immediately.
    pub async fn spawn<A, S>(
        flow: Arc<Mutex<VerificationFlow<A, S>>>,
        period: Duration,
    ) -> (Self, watch::Receiver<TimerSnapshot>)
    where
        A: EnrolleeApi + 'static,
        S: SessionStore + 'static,
    {
        let initial = flow.lock().await.snapshot();
        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let snapshot = {
                    let mut flow = flow.lock().await;
                    if flow.is_finished() {
                        break;
                    }
                    let events = flow.tick().await;
                    if !events.is_empty() {
                        debug!(events = ?events, event = "countdown_transition", "Countdown transition");
                    }
                    flow.snapshot()
                };

                if tx.send(snapshot).is_err() {
                    break;
                }
            }
            debug!(event = "countdown_stopped", "Countdown ticker stopped");
        });

        (Self { handle }, rx)
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the countdown now
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
