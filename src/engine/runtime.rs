// src/engine/runtime.rs

use std::fmt;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use crate::engine::{Router, Trigger};
use crate::errors::{DevloopError, Result};
use crate::watch::{WatchEvent, WatcherHandle};

/// Binds the watcher stream, the external reload signal, the routing
/// policy, and the supervisor worker into one session.
///
/// The trigger sources run as independent concurrent listeners, but every
/// restart intent funnels through the single capacity-1 queue consumed by
/// the supervisor worker, so restarts stay strictly serialized.
pub struct Orchestrator {
    router: Router,
    watch_rx: mpsc::UnboundedReceiver<WatchEvent>,
    worker: JoinHandle<Result<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    // Keeps the notify watcher registered for the session's lifetime.
    _watcher: WatcherHandle,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        router: Router,
        watch_rx: mpsc::UnboundedReceiver<WatchEvent>,
        worker: JoinHandle<Result<()>>,
        shutdown_tx: oneshot::Sender<()>,
        watcher: WatcherHandle,
    ) -> Self {
        Self {
            router,
            watch_rx,
            worker,
            shutdown_tx: Some(shutdown_tx),
            _watcher: watcher,
        }
    }

    /// Main loop; does not return during normal operation.
    ///
    /// Exits on: Ctrl-C (graceful, `Ok`), a fatal supervisor error, or loss
    /// of the watch stream (fatal: we'd be supervising blind and must not
    /// silently resubscribe).
    pub async fn run(mut self) -> Result<()> {
        let mut reload = signal(SignalKind::user_defined1())?;

        info!("devloop session running");

        loop {
            tokio::select! {
                maybe_event = self.watch_rx.recv() => match maybe_event {
                    Some(event) => self.router.route(Trigger::File(event)).await,
                    None => {
                        let _ = self.stop_worker().await;
                        return Err(DevloopError::WatchStreamClosed);
                    }
                },
                _ = reload.recv() => {
                    self.router.route(Trigger::Reload).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received; shutting down");
                    return self.stop_worker().await;
                }
                worker_result = &mut self.worker => {
                    // The worker only returns on its own for fatal
                    // lifecycle errors or a closed queue.
                    return flatten_worker(worker_result);
                }
            }
        }
    }

    /// Ask the supervisor worker to stop the child and wait for it.
    async fn stop_worker(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        flatten_worker((&mut self.worker).await)
    }
}

fn flatten_worker(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match result {
        Ok(inner) => inner,
        Err(join_err) => Err(DevloopError::Other(anyhow::anyhow!(
            "supervisor worker panicked: {join_err}"
        ))),
    }
}
