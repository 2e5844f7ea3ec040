//! Wall-clock scheduler backed by tokio timers.
//!
//! Each timer is a tokio task that sleeps for the requested delay and then
//! sends a [`Fired`] notice to the worker's channel. Cancelling aborts the
//! task; a notice that was already in flight is dropped by the engine because
//! its handle is no longer armed.

use std::collections::HashMap;
use std::time::Duration;

use cadence_core::{Fired, Scheduler, Task, TimerHandle, Timestamp};
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Tokio implementation of [`Scheduler`]. Must be used inside a runtime.
pub struct TokioScheduler {
    next_handle: u64,
    /// Armed timers (handle -> sleeping task).
    timers: HashMap<TimerHandle, JoinHandle<()>>,
    fired_tx: mpsc::UnboundedSender<Fired>,
}

impl TokioScheduler {
    /// Creates a scheduler and the receiver its timers fire into.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_handle: 0,
            timers: HashMap::new(),
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    /// Aborts every armed timer.
    pub fn cancel_all(&mut self) {
        for (handle, task) in self.timers.drain() {
            task.abort();
            trace!(target: "cadence::worker", ?handle, "timer cancelled (shutdown)");
        }
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn schedule(&mut self, delay: Duration, task: Task) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        let fired_tx = self.fired_tx.clone();

        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if fired_tx.send(Fired { handle, task }).is_err() {
                trace!(target: "cadence::worker", ?handle, "worker gone before timer fired");
            }
        });

        self.timers.insert(handle, join);
        trace!(target: "cadence::worker", ?handle, ?delay, "timer set");
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.timers.remove(&handle) {
            task.abort();
            trace!(target: "cadence::worker", ?handle, "timer cancelled");
        }
    }

    fn retire(&mut self, handle: TimerHandle) {
        self.timers.remove(&handle);
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
