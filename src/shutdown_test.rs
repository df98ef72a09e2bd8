//! Tests for graceful shutdown signalling

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_signal_initially_not_shutdown() {
    let (_controller, signal) = shutdown_channel();
    assert!(!signal.is_shutdown());
}

#[tokio::test]
async fn test_all_signals_observe_shutdown() {
    let (controller, signal) = shutdown_channel();
    let cloned = signal.clone();
    let subscribed = controller.signal();

    controller.shutdown();

    for mut s in [signal, cloned, subscribed] {
        assert!(s.is_shutdown());
        tokio::time::timeout(Duration::from_secs(1), s.wait())
            .await
            .expect("wait should resolve after shutdown");
    }
}

#[tokio::test]
async fn test_wait_blocks_until_shutdown() {
    let (controller, mut signal) = shutdown_channel();

    let pending = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
    assert!(pending.is_err(), "wait should not resolve before shutdown");

    let waiter = tokio::spawn(async move { signal.wait().await });
    controller.shutdown();

    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter should wake")
        .expect("waiter task");
}

#[tokio::test]
async fn test_dropped_controller_releases_waiters() {
    let (controller, mut signal) = shutdown_channel();
    drop(controller);

    tokio::time::timeout(Duration::from_secs(1), signal.wait())
        .await
        .expect("wait should resolve when the controller is gone");
}

/// Stand-in for the HTTP server: runs until shutdown, then reports it saw it
fn server_until_shutdown(
    controller: &ShutdownController,
) -> (JoinHandle<io::Result<()>>, Arc<AtomicBool>) {
    let stopped = Arc::new(AtomicBool::new(false));
    let mut signal = controller.signal();
    let flag = Arc::clone(&stopped);
    let handle = tokio::spawn(async move {
        signal.wait().await;
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });
    (handle, stopped)
}

/// Stand-in for the poll loop: runs until shutdown
fn scheduler_until_shutdown(controller: &ShutdownController) -> JoinHandle<()> {
    let mut signal = controller.signal();
    tokio::spawn(async move { signal.wait().await })
}

#[tokio::test]
async fn test_supervise_stops_both_tasks_when_requested() {
    let (controller, _signal) = shutdown_channel();
    let scheduler = scheduler_until_shutdown(&controller);
    let (server, server_stopped) = server_until_shutdown(&controller);

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        supervise(&controller, scheduler, server, async {}),
    )
    .await
    .expect("supervise should return");

    assert_eq!(result, Ok(()));
    assert!(server_stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_supervise_reports_scheduler_that_returns() {
    let (controller, signal) = shutdown_channel();
    let scheduler = tokio::spawn(async {});
    let (server, server_stopped) = server_until_shutdown(&controller);

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        supervise(&controller, scheduler, server, std::future::pending()),
    )
    .await
    .expect("a finished scheduler must end supervision");

    assert_eq!(result, Err(SupervisorError::SchedulerExited));
    assert!(signal.is_shutdown(), "shutdown must be signalled");
    assert!(server_stopped.load(Ordering::SeqCst), "server must be stopped");
}

#[tokio::test]
async fn test_supervise_reports_scheduler_that_panics() {
    let (controller, _signal) = shutdown_channel();
    let scheduler = tokio::spawn(async { panic!("loop exploded") });
    let (server, server_stopped) = server_until_shutdown(&controller);

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        supervise(&controller, scheduler, server, std::future::pending()),
    )
    .await
    .expect("a panicked scheduler must end supervision");

    assert_eq!(result, Err(SupervisorError::SchedulerExited));
    assert!(server_stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_supervise_reports_failed_server() {
    let (controller, signal) = shutdown_channel();
    let scheduler = scheduler_until_shutdown(&controller);
    let server = tokio::spawn(async {
        Err::<(), _>(io::Error::new(io::ErrorKind::AddrInUse, "port taken"))
    });

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        supervise(&controller, scheduler, server, std::future::pending()),
    )
    .await
    .expect("a failed server must end supervision");

    assert_eq!(result, Err(SupervisorError::ServerExited));
    assert!(signal.is_shutdown());
}
