// src/supervise/restart.rs

//! The restart request queue.

use tokio::sync::mpsc;
use tracing::debug;

/// Opaque token asking the supervisor worker for one restart cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRequest;

/// Producer side of the bounded restart queue.
///
/// The channel holds at most one undelivered request: requesting while one
/// is pending drops the new request rather than queueing it, so a storm of
/// triggers collapses to a single restart once the worker gets to it. A
/// trigger arriving while a restart is already executing is likewise
/// absorbed into the pending bit and causes exactly one more cycle.
#[derive(Debug, Clone)]
pub struct RestartQueue {
    tx: mpsc::Sender<RestartRequest>,
}

/// Create the restart queue and the receiver consumed by the worker.
pub fn restart_queue() -> (RestartQueue, mpsc::Receiver<RestartRequest>) {
    let (tx, rx) = mpsc::channel(1);
    (RestartQueue { tx }, rx)
}

impl RestartQueue {
    /// Enqueue a restart if none is pending. Returns whether the request was
    /// actually enqueued.
    pub fn request(&self) -> bool {
        match self.tx.try_send(RestartRequest) {
            Ok(()) => {
                debug!("restart queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("restart already pending; collapsing");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("restart worker gone; dropping request");
                false
            }
        }
    }
}
