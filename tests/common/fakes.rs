#![allow(dead_code)]

//! Fake launcher / process / build-step backends for tests.
//!
//! These implement the same traits production uses, so the supervisor and
//! router under test run unmodified while the tests script child behaviour
//! and record what happened.

use std::future::Future;
use std::os::unix::process::ExitStatusExt;
use std::pin::Pin;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::anyhow;
use tokio::sync::watch;

use devloop::build::BuildStep;
use devloop::errors::{DevloopError, Result};
use devloop::supervise::{Launcher, ProcessHandle};

/// Per-process signal counters, shared with the test through [`FakeProbe`].
#[derive(Default)]
pub struct FakeCounters {
    group_signals: AtomicUsize,
    leader_signals: AtomicUsize,
    kills: AtomicUsize,
}

/// Read-only view into one fake child's signal history.
#[derive(Clone)]
pub struct FakeProbe {
    pub pid: u32,
    counters: Arc<FakeCounters>,
}

impl FakeProbe {
    pub fn group_signals(&self) -> usize {
        self.counters.group_signals.load(Ordering::SeqCst)
    }

    pub fn leader_signals(&self) -> usize {
        self.counters.leader_signals.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.counters.kills.load(Ordering::SeqCst)
    }
}

/// A scripted child process: cooperative children exit as soon as they see
/// the graceful signal; stubborn ones only die to the forced kill.
pub struct FakeProcess {
    pid: u32,
    ignore_graceful: bool,
    counters: Arc<FakeCounters>,
    dead_tx: watch::Sender<bool>,
}

impl FakeProcess {
    fn mark_dead(&self) {
        self.dead_tx.send_replace(true);
    }
}

impl ProcessHandle for FakeProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn signal_group(&self) -> Result<()> {
        self.counters.group_signals.fetch_add(1, Ordering::SeqCst);
        if !self.ignore_graceful {
            self.mark_dead();
        }
        Ok(())
    }

    fn signal_leader(&self) -> Result<()> {
        self.counters.leader_signals.fetch_add(1, Ordering::SeqCst);
        if !self.ignore_graceful {
            self.mark_dead();
        }
        Ok(())
    }

    fn start_kill(&mut self) -> Result<()> {
        self.counters.kills.fetch_add(1, Ordering::SeqCst);
        self.mark_dead();
        Ok(())
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = std::io::Result<ExitStatus>> + Send + '_>> {
        let mut rx = self.dead_tx.subscribe();
        Box::pin(async move {
            let _ = rx.wait_for(|dead| *dead).await;
            Ok(ExitStatus::from_raw(0))
        })
    }
}

/// One successful `launch` call.
pub struct LaunchRecord {
    pub pid: u32,
    /// Wall-clock launch time (std time, not the tokio test clock).
    pub at: Instant,
    pub probe: FakeProbe,
}

/// A launcher producing [`FakeProcess`]es with increasing pids.
pub struct FakeLauncher {
    ignore_graceful: bool,
    fail_after: Option<usize>,
    next_pid: AtomicU32,
    records: Arc<Mutex<Vec<LaunchRecord>>>,
}

impl FakeLauncher {
    /// Children that honour the graceful signal.
    pub fn cooperative() -> Self {
        Self {
            ignore_graceful: false,
            fail_after: None,
            next_pid: AtomicU32::new(1000),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Children that ignore the graceful signal and must be killed.
    pub fn stubborn() -> Self {
        Self {
            ignore_graceful: true,
            ..Self::cooperative()
        }
    }

    /// Fail every launch after the first `n` successful ones.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Grab the shared launch log before moving the launcher into the
    /// supervisor.
    pub fn records(&self) -> Arc<Mutex<Vec<LaunchRecord>>> {
        Arc::clone(&self.records)
    }
}

impl Launcher for FakeLauncher {
    fn launch(&self) -> Pin<Box<dyn Future<Output = Result<Box<dyn ProcessHandle>>> + Send + '_>> {
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let ignore_graceful = self.ignore_graceful;
        let fail_after = self.fail_after;
        let records = Arc::clone(&self.records);

        Box::pin(async move {
            {
                let launched_so_far = records.lock().unwrap().len();
                if fail_after.is_some_and(|n| launched_so_far >= n) {
                    return Err(DevloopError::Launch("scripted launch failure".to_string()));
                }
            }

            let counters = Arc::new(FakeCounters::default());
            let (dead_tx, _) = watch::channel(false);
            let process = FakeProcess {
                pid,
                ignore_graceful,
                counters: Arc::clone(&counters),
                dead_tx,
            };

            records.lock().unwrap().push(LaunchRecord {
                pid,
                at: Instant::now(),
                probe: FakeProbe { pid, counters },
            });

            Ok(Box::new(process) as Box<dyn ProcessHandle>)
        })
    }
}

/// A build step that records its invocations and optionally fails.
pub struct RecordingStep {
    name: String,
    fail: bool,
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl RecordingStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<Instant> {
        self.calls.lock().unwrap().last().copied()
    }
}

impl BuildStep for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self) -> Result<()> {
        Ok(())
    }

    fn process(&self) -> Result<()> {
        self.calls.lock().unwrap().push(Instant::now());
        if self.fail {
            return Err(DevloopError::build(
                self.name.as_str(),
                anyhow!("scripted failure"),
            ));
        }
        Ok(())
    }
}
