// src/supervise/process.rs

//! Process handles and launchers.
//!
//! The supervisor core only talks to the [`ProcessHandle`] and [`Launcher`]
//! traits, so the graceful/forced stop ladder stays independent of how the
//! child is actually spawned and signalled. Production uses [`ShellLauncher`]
//! (a `sh -c` child leading its own process group); tests substitute fakes.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tracing::{debug, info};

use crate::errors::{DevloopError, Result};

/// Control surface over one live child process.
///
/// `signal_group`/`signal_leader` deliver the graceful stop signal;
/// `start_kill` is the unconditional escalation. `wait` resolves when the
/// operating system reports the process slot reclaimed.
pub trait ProcessHandle: Send {
    /// OS process id of the group leader.
    fn pid(&self) -> u32;

    /// Process group id. Equals the pid when the child leads its own group,
    /// which is how every launcher here spawns children.
    fn pgid(&self) -> u32 {
        self.pid()
    }

    /// Send the graceful stop signal to the whole process group, so
    /// descendants shut down together with the leader.
    fn signal_group(&self) -> Result<()>;

    /// Send the same graceful signal directly to the leader, as a fallback
    /// in case group delivery is not honoured.
    fn signal_leader(&self) -> Result<()>;

    /// Begin unconditional termination of the leader.
    fn start_kill(&mut self) -> Result<()>;

    /// Wait for the process to terminate.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = std::io::Result<ExitStatus>> + Send + '_>>;
}

/// Launches replacement children for the supervisor.
pub trait Launcher: Send {
    fn launch(&self) -> Pin<Box<dyn Future<Output = Result<Box<dyn ProcessHandle>>> + Send + '_>>;
}

/// Spawns the supervised command through `sh -c` as the leader of a fresh
/// process group, with stdout/stderr forwarded line-by-line to the logging
/// sink (best effort, no buffering guarantees beyond "eventually forwarded").
pub struct ShellLauncher {
    cmd: String,
}

impl ShellLauncher {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

impl Launcher for ShellLauncher {
    fn launch(&self) -> Pin<Box<dyn Future<Output = Result<Box<dyn ProcessHandle>>> + Send + '_>> {
        let cmd_line = self.cmd.clone();

        Box::pin(async move {
            let mut cmd = Command::new("sh");
            cmd.arg("-c")
                .arg(&cmd_line)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                // The child leads its own group so grandchildren die with it.
                .process_group(0)
                .kill_on_drop(true);

            let mut child = cmd
                .spawn()
                .map_err(|e| DevloopError::Launch(format!("spawning '{cmd_line}': {e}")))?;

            let Some(pid) = child.id() else {
                return Err(DevloopError::Launch(format!(
                    "'{cmd_line}' exited before a pid could be recorded"
                )));
            };

            forward_output(pid, child.stdout.take(), child.stderr.take());
            info!(pid, cmd = %cmd_line, "supervised process started");

            Ok(Box::new(GroupChild { child, pid }) as Box<dyn ProcessHandle>)
        })
    }
}

/// A real child spawned as its own process-group leader (pgid == pid).
struct GroupChild {
    child: tokio::process::Child,
    pid: u32,
}

impl ProcessHandle for GroupChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn signal_group(&self) -> Result<()> {
        let pgid = self.pgid();
        killpg(Pid::from_raw(pgid as i32), Signal::SIGINT).map_err(|e| {
            DevloopError::Termination(format!("SIGINT to process group {pgid}: {e}"))
        })
    }

    fn signal_leader(&self) -> Result<()> {
        kill(Pid::from_raw(self.pid as i32), Signal::SIGINT)
            .map_err(|e| DevloopError::Termination(format!("SIGINT to pid {}: {e}", self.pid)))
    }

    fn start_kill(&mut self) -> Result<()> {
        self.child
            .start_kill()
            .map_err(|e| DevloopError::Termination(format!("SIGKILL to pid {}: {e}", self.pid)))
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = std::io::Result<ExitStatus>> + Send + '_>> {
        Box::pin(self.child.wait())
    }
}

/// Forward the child's stdio to the logging sink.
///
/// Always consume both pipes so OS buffers don't fill and stall the child.
fn forward_output(pid: u32, stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) {
    if let Some(stdout) = stdout {
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(pid, "stdout: {}", line);
            }
            debug!(pid, "stdout stream closed");
        });
    }

    if let Some(stderr) = stderr {
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(pid, "stderr: {}", line);
            }
            debug!(pid, "stderr stream closed");
        });
    }
}
