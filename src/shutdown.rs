//! Graceful shutdown
//!
//! A [`ShutdownController`] flips a watch channel once; every cloned
//! [`ShutdownSignal`] observes it. [`supervise`] ties the poll loop and the
//! HTTP server to the same controller so that neither outlives the other.

use std::future::Future;
use std::io;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// Sending half, owned by `main`
#[derive(Debug)]
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// Receiving half, cloned into every long-running task
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Create a linked controller/signal pair
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownController { tx }, ShutdownSignal { rx })
}

impl ShutdownController {
    /// Tell every signal holder to stop
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Another signal tied to this controller
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl ShutdownSignal {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested
    ///
    /// Also resolves if the controller is dropped, so orphaned tasks stop.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Wait for SIGINT (Ctrl-C) or, on unix, SIGTERM
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// A supervised task ended on its own
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("poll scheduler exited unexpectedly")]
    SchedulerExited,

    #[error("HTTP server exited unexpectedly")]
    ServerExited,
}

enum Exit {
    Requested,
    Scheduler(Result<(), JoinError>),
    Server(Result<io::Result<()>, JoinError>),
}

/// Run until `stop` resolves or either task ends
///
/// Whatever happens first, shutdown is signalled through `controller` and
/// the remaining task is awaited. A task that ends before `stop` resolves
/// is an error.
pub async fn supervise<F>(
    controller: &ShutdownController,
    mut scheduler: JoinHandle<()>,
    mut server: JoinHandle<io::Result<()>>,
    stop: F,
) -> Result<(), SupervisorError>
where
    F: Future<Output = ()>,
{
    let exit = tokio::select! {
        _ = stop => Exit::Requested,
        res = &mut scheduler => Exit::Scheduler(res),
        res = &mut server => Exit::Server(res),
    };

    controller.shutdown();

    match exit {
        Exit::Requested => {
            info!("Shutting down");
            join_scheduler(scheduler).await;
            join_server(server).await;
            Ok(())
        }
        Exit::Scheduler(res) => {
            match res {
                Ok(()) => error!("Poll scheduler stopped unexpectedly"),
                Err(e) => error!(error = %e, "Poll scheduler task failed"),
            }
            join_server(server).await;
            Err(SupervisorError::SchedulerExited)
        }
        Exit::Server(res) => {
            match res {
                Ok(Ok(())) => error!("HTTP server stopped unexpectedly"),
                Ok(Err(e)) => error!(error = %e, "HTTP server failed"),
                Err(e) => error!(error = %e, "HTTP server task failed"),
            }
            join_scheduler(scheduler).await;
            Err(SupervisorError::ServerExited)
        }
    }
}

async fn join_scheduler(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warn!(error = %e, "Scheduler task ended abnormally");
    }
}

async fn join_server(handle: JoinHandle<io::Result<()>>) {
    match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "HTTP server failed during shutdown"),
        Err(e) => warn!(error = %e, "HTTP server task ended abnormally"),
    }
}

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;
