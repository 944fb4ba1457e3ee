//! Periodic backend liveness probe.
//!
//! [`ConnectionMonitor::start`] spawns a task that calls the heartbeat
//! endpoint on a fixed interval and publishes the latest
//! [`ConnectionStatus`] through a `watch` channel. The monitor is
//! independent of job traffic and runs until [`ConnectionMonitor::shutdown`]
//! is called or the monitor is dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::transport::Transport;

/// How long `shutdown` waits for the probe loop to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Latest known backend reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No probe has completed yet.
    Unknown,
    Down,
    Up,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionStatus::Unknown => "unknown",
            ConnectionStatus::Down => "down",
            ConnectionStatus::Up => "up",
        };
        f.write_str(label)
    }
}

pub struct ConnectionMonitor {
    status_rx: watch::Receiver<ConnectionStatus>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ConnectionMonitor {
    /// Spawn the probe loop. The first probe fires immediately.
    pub fn start(transport: Arc<dyn Transport>, interval: Duration) -> Self {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Unknown);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(probe_loop(transport, interval, status_tx, cancel.clone()));

        Self {
            status_rx,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// A receiver that observes every status change.
    pub fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Stop probing and wait up to five seconds for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "Connection monitor task ended abnormally"),
                Err(_) => tracing::warn!("Connection monitor did not stop in time"),
            }
        }
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn probe_loop(
    transport: Arc<dyn Transport>,
    interval: Duration,
    status_tx: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Connection monitor stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Connection monitor stopped mid-probe");
                return;
            }
            status = probe(transport.as_ref(), interval) => status,
        };

        let changed = status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        if changed {
            match status {
                ConnectionStatus::Up => tracing::info!("Backend reachable"),
                _ => tracing::warn!("Backend unreachable"),
            }
        }
    }
}

/// Run one heartbeat, treating an error or no answer within `limit` as down.
pub async fn probe(transport: &dyn Transport, limit: Duration) -> ConnectionStatus {
    match tokio::time::timeout(limit, transport.heartbeat()).await {
        Ok(Ok(true)) => ConnectionStatus::Up,
        Ok(Ok(false)) => ConnectionStatus::Down,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Heartbeat request failed");
            ConnectionStatus::Down
        }
        Err(_) => {
            tracing::debug!(limit_ms = limit.as_millis() as u64, "Heartbeat timed out");
            ConnectionStatus::Down
        }
    }
}
