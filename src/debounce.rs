// src/debounce.rs

//! Sliding-window debounce for restart triggers.
//!
//! Saving several files within a short window should trigger one restart,
//! not N. The debouncer holds a single logical timer: scheduling while one
//! is pending cancels it and starts a fresh one for the full quiet period,
//! so the action fires only once the trigger stream has been quiet for the
//! entire window.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Collapses bursts of triggers into a single delayed action.
///
/// The timer slot is mutex-protected because `schedule` may be called from
/// concurrent trigger sources. Within one scheduling cycle the action is
/// invoked at most once; the action itself must tolerate being invoked
/// concurrently with a re-schedule (here that is an idempotent queue push).
#[derive(Debug)]
pub struct Debouncer {
    quiet_period: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            timer: Mutex::new(None),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Arrange for `action` to run once `quiet_period` has elapsed without
    /// another call to `schedule`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = match self.timer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(pending) = slot.take() {
            pending.abort();
            debug!("debounce timer reset");
        }

        let quiet = self.quiet_period;
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            action();
        }));
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let mut slot = match self.timer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(pending) = slot.take() {
            pending.abort();
        }
    }
}
