//! Process shutdown for the daemon.
//!
//! [`ShutdownController`] fans a single stop signal out to the node task and
//! its block scheduler. Chain changes are persisted as they happen, so
//! stopping needs no flush.

use tokio::sync::broadcast;

/// Which OS signal ended the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

#[derive(Clone)]
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            tx: broadcast::channel(1).0,
        }
    }

    /// Pass to [`StakeNode::run`](crate::StakeNode::run).
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Stop every subscriber. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Block until SIGINT or SIGTERM, then [`trigger`](Self::trigger).
    pub async fn wait_for_signal(&self) -> StopSignal {
        let signal = tokio::select! {
            _ = tokio::signal::ctrl_c() => StopSignal::Interrupt,
            _ = terminate() => StopSignal::Terminate,
        };
        tracing::info!(?signal, stopping = self.trigger(), "shutdown requested");
        signal
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
