//! Graceful shutdown for the stake pool daemon.
//!
//! The daemon stops on SIGINT/SIGTERM. The supervisor's reconnect wait and
//! the ticket poller each hold a [`ShutdownSignal`] and stop at their next
//! select point; open RPC sessions are then closed by the supervisor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Owns the shutdown trigger.
///
/// A request is latched: signals handed out after [`shutdown`] resolve
/// immediately, so a reconnect round that subscribes late still stops.
///
/// [`shutdown`]: ShutdownController::shutdown
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
    requested: Arc<AtomicBool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A signal for the poller or the supervisor to select on.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
            requested: self.requested.clone(),
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Request shutdown. Repeated requests are harmless.
    pub fn shutdown(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            info!("shutdown requested");
        }
        let _ = self.tx.send(());
    }

    /// Wait for SIGTERM or SIGINT, then request shutdown.
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = signal::ctrl_c() => info!("received SIGINT, stopping ticket reconciliation"),
            _ = terminate => info!("received SIGTERM, stopping ticket reconciliation"),
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`ShutdownController`].
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown is requested or the controller is dropped.
    pub async fn recv(&mut self) {
        if self.requested.load(Ordering::SeqCst) {
            return;
        }
        // Lagged still means a request was sent; Closed means no one is left
        // to send one.
        let _ = self.rx.recv().await;
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn poller_and_supervisor_both_stop() {
        let controller = ShutdownController::new();
        let mut poller = controller.subscribe();
        let mut reconnect = controller.subscribe();
        controller.shutdown();
        poller.recv().await;
        reconnect.recv().await;
        assert!(poller.is_requested());
    }

    #[tokio::test]
    async fn late_subscriber_sees_earlier_request() {
        let controller = ShutdownController::new();
        controller.shutdown();
        controller.shutdown();

        let mut late = controller.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.recv())
            .await
            .expect("request should be latched");
        assert!(controller.is_requested());
    }

    #[tokio::test]
    async fn signal_waits_until_requested() {
        let controller = ShutdownController::new();
        let mut signal = controller.subscribe();
        assert!(
            tokio::time::timeout(Duration::from_millis(20), signal.recv())
                .await
                .is_err()
        );
        assert!(!signal.is_requested());
    }

    #[tokio::test]
    async fn dropped_controller_releases_signal() {
        let controller = ShutdownController::new();
        let mut signal = controller.subscribe();
        drop(controller);
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("closed channel should release the signal");
    }
}
