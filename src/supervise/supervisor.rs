// src/supervise/supervisor.rs

//! Lifecycle of the single supervised child process.

use std::fmt;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::errors::{DevloopError, Result};
use crate::supervise::process::{Launcher, ProcessHandle};
use crate::supervise::restart::RestartRequest;

/// Timing knobs for the stop ladder.
#[derive(Debug, Clone, Copy)]
pub struct SuperviseTiming {
    /// How long the child gets to exit after the graceful signal.
    pub grace_period: Duration,
    /// Pause before and after termination confirmation, so the OS isn't
    /// racing us on pid/pgid reuse.
    pub settle_delay: Duration,
}

impl Default for SuperviseTiming {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            settle_delay: Duration::from_millis(200),
        }
    }
}

/// Lifecycle state of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    Running,
    Stopping,
    Exited,
}

/// The one live child, exclusively owned by the supervisor.
///
/// Replaced (never mutated back to `Running`) on every restart.
pub struct SupervisedProcess {
    handle: Box<dyn ProcessHandle>,
    state: ProcessState,
}

impl SupervisedProcess {
    pub fn pid(&self) -> u32 {
        self.handle.pid()
    }

    pub fn pgid(&self) -> u32 {
        self.handle.pgid()
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }
}

impl fmt::Debug for SupervisedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisedProcess")
            .field("pid", &self.pid())
            .field("state", &self.state)
            .finish()
    }
}

/// Owns the full lifecycle of the supervised child across repeated restarts.
///
/// Guarantees that at most one live child exists at a time and that shutdown
/// is attempted gracefully before being forced. All restart cycles are
/// strictly sequential: graceful signal → grace wait → forced kill →
/// relaunch never overlaps another cycle.
pub struct Supervisor<L: Launcher> {
    launcher: L,
    timing: SuperviseTiming,
}

impl<L: Launcher> Supervisor<L> {
    pub fn new(launcher: L, timing: SuperviseTiming) -> Self {
        Self { launcher, timing }
    }

    /// Launch the initial child. Launch failure is fatal: without a child
    /// there is nothing to supervise.
    pub async fn start(&self) -> Result<SupervisedProcess> {
        let handle = self.launcher.launch().await?;
        Ok(SupervisedProcess {
            handle,
            state: ProcessState::Running,
        })
    }

    /// Worker loop: consumes restart requests from the capacity-1 queue,
    /// serializing restart cycles, until `shutdown_rx` fires or the queue
    /// closes. Returns early only on fatal lifecycle errors.
    pub async fn run(
        self,
        mut current: SupervisedProcess,
        mut restart_rx: mpsc::Receiver<RestartRequest>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                maybe_request = restart_rx.recv() => match maybe_request {
                    Some(RestartRequest) => {
                        current = self.restart(current).await?;
                    }
                    None => {
                        info!("restart queue closed; stopping supervised process");
                        return self.shutdown(current).await;
                    }
                },
                _ = &mut shutdown_rx => {
                    info!("shutdown requested; stopping supervised process");
                    return self.shutdown(current).await;
                }
            }
        }
    }

    /// One full restart cycle: stop the current child, then launch its
    /// replacement. Only after termination is confirmed is the replacement
    /// created.
    pub async fn restart(&self, current: SupervisedProcess) -> Result<SupervisedProcess> {
        let old_pid = current.pid();
        self.stop(current).await?;

        let handle = self.launcher.launch().await?;
        let fresh = SupervisedProcess {
            handle,
            state: ProcessState::Running,
        };
        info!(old_pid, new_pid = fresh.pid(), "supervised process restarted");
        Ok(fresh)
    }

    /// Same stop ladder as a restart, without the relaunch. Used when the
    /// supervisor itself is exiting.
    pub async fn shutdown(&self, current: SupervisedProcess) -> Result<()> {
        self.stop(current).await
    }

    /// The graceful-then-forced stop ladder.
    ///
    /// Graceful signal to the group, then to the leader; settle; wait up to
    /// the grace window; on expiry escalate to an unconditional kill and
    /// block until the OS confirms the slot reclaimed; settle again.
    ///
    /// Signal delivery failures are non-fatal (the child may already be
    /// gone); a failed forced kill is fatal because the single-instance
    /// invariant can no longer be guaranteed.
    async fn stop(&self, mut process: SupervisedProcess) -> Result<()> {
        let pid = process.pid();
        process.state = ProcessState::Stopping;
        debug!(pid, state = ?process.state, "stopping supervised process");

        if let Err(err) = process.handle.signal_group() {
            warn!(pid, %err, "graceful signal to process group failed");
        }
        if let Err(err) = process.handle.signal_leader() {
            warn!(pid, %err, "graceful signal to leader failed");
        }

        sleep(self.timing.settle_delay).await;

        match timeout(self.timing.grace_period, process.handle.wait()).await {
            Ok(Ok(status)) => {
                info!(pid, code = status.code(), "supervised process exited");
            }
            Ok(Err(err)) => {
                warn!(pid, %err, "waiting for supervised process failed; forcing kill");
                self.force_kill(&mut process).await?;
            }
            Err(_elapsed) => {
                warn!(
                    pid,
                    grace = ?self.timing.grace_period,
                    "grace window elapsed without exit; forcing kill"
                );
                self.force_kill(&mut process).await?;
            }
        }

        process.state = ProcessState::Exited;
        debug!(pid, state = ?process.state, "supervised process stopped");

        sleep(self.timing.settle_delay).await;
        Ok(())
    }

    async fn force_kill(&self, process: &mut SupervisedProcess) -> Result<()> {
        let pid = process.pid();
        process.handle.start_kill()?;
        let status = process.handle.wait().await.map_err(|e| {
            DevloopError::Termination(format!("waiting for killed process {pid}: {e}"))
        })?;
        info!(pid, code = status.code(), "supervised process killed");
        Ok(())
    }
}
