// tests/supervisor_ladder.rs

//! The graceful-then-forced stop ladder and the restart worker.

mod common;

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::sleep;

use devloop::errors::DevloopError;
use devloop::supervise::{restart_queue, Supervisor, SuperviseTiming};

use crate::common::fakes::FakeLauncher;
use crate::common::init_tracing;

const TIMING: SuperviseTiming = SuperviseTiming {
    grace_period: Duration::from_secs(5),
    settle_delay: Duration::from_millis(200),
};

#[tokio::test(start_paused = true)]
async fn cooperative_child_restarts_without_force() {
    init_tracing();

    let launcher = FakeLauncher::cooperative();
    let records = launcher.records();
    let supervisor = Supervisor::new(launcher, TIMING);

    let first = supervisor.start().await.expect("initial launch");
    let first_pid = first.pid();

    let second = supervisor.restart(first).await.expect("restart");
    assert_ne!(second.pid(), first_pid, "restart must produce a fresh process");

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 2);

    // Graceful path: group signal, leader fallback, no kill.
    let stopped = &records[0].probe;
    assert_eq!(stopped.group_signals(), 1);
    assert_eq!(stopped.leader_signals(), 1);
    assert_eq!(stopped.kills(), 0);

    // The replacement is untouched.
    let fresh = &records[1].probe;
    assert_eq!(fresh.group_signals(), 0);
    assert_eq!(fresh.kills(), 0);
}

#[tokio::test(start_paused = true)]
async fn stubborn_child_is_killed_after_grace_window() {
    init_tracing();

    let launcher = FakeLauncher::stubborn();
    let records = launcher.records();
    let supervisor = Supervisor::new(launcher, TIMING);

    let first = supervisor.start().await.expect("initial launch");
    let first_pid = first.pid();

    let started = tokio::time::Instant::now();
    let second = supervisor.restart(first).await.expect("restart must converge");
    let elapsed = started.elapsed();

    assert_ne!(second.pid(), first_pid);
    assert!(
        elapsed >= TIMING.grace_period,
        "restart converged in {elapsed:?}, before the grace window"
    );

    let records = records.lock().unwrap();
    let stopped = &records[0].probe;
    assert_eq!(stopped.group_signals(), 1);
    assert_eq!(stopped.leader_signals(), 1);
    assert_eq!(stopped.kills(), 1, "exactly one forced kill");
}

#[tokio::test(start_paused = true)]
async fn pending_requests_collapse_to_one_restart() {
    init_tracing();

    let launcher = FakeLauncher::cooperative();
    let records = launcher.records();
    let supervisor = Supervisor::new(launcher, TIMING);
    let initial = supervisor.start().await.expect("initial launch");

    let (queue, restart_rx) = restart_queue();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // Storm of requests before the worker starts consuming: one is queued,
    // the rest are collapsed.
    assert!(queue.request());
    assert!(!queue.request());
    assert!(!queue.request());

    let worker = tokio::spawn(supervisor.run(initial, restart_rx, shutdown_rx));

    // Plenty of (virtual) time for any spurious extra restarts to show up.
    sleep(Duration::from_secs(60)).await;

    shutdown_tx.send(()).expect("worker must still be alive");
    worker.await.expect("worker join").expect("worker result");

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 2, "initial launch plus exactly one restart");
    // The final child was stopped by the shutdown ladder.
    assert_eq!(records[1].probe.group_signals(), 1);
    assert_eq!(records[1].probe.kills(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_child_without_relaunch() {
    init_tracing();

    let launcher = FakeLauncher::cooperative();
    let records = launcher.records();
    let supervisor = Supervisor::new(launcher, TIMING);
    let initial = supervisor.start().await.expect("initial launch");

    let (_queue, restart_rx) = restart_queue();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let worker = tokio::spawn(supervisor.run(initial, restart_rx, shutdown_rx));

    shutdown_tx.send(()).expect("worker must still be alive");
    worker.await.expect("worker join").expect("worker result");

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1, "shutdown must not relaunch");
    assert_eq!(records[0].probe.group_signals(), 1);
    assert_eq!(records[0].probe.kills(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_relaunch_is_fatal_for_the_worker() {
    init_tracing();

    // One successful launch (the initial child), then every launch fails.
    let launcher = FakeLauncher::cooperative().fail_after(1);
    let supervisor = Supervisor::new(launcher, TIMING);
    let initial = supervisor.start().await.expect("initial launch");

    let (queue, restart_rx) = restart_queue();
    let (_shutdown_tx, shutdown_rx) = oneshot::channel();
    let worker = tokio::spawn(supervisor.run(initial, restart_rx, shutdown_rx));

    assert!(queue.request());

    let result = worker.await.expect("worker join");
    assert!(
        matches!(result, Err(DevloopError::Launch(_))),
        "relaunch failure must abort the worker, got {result:?}"
    );
}
