//! Shutdown coordination.

use tokio::sync::broadcast;

use crate::resilience::{AbortController, AbortReason, AbortSignal};

/// Coordinator for graceful shutdown.
///
/// Long-running tasks subscribe to a broadcast channel; in-flight request
/// work observes [`Shutdown::signal`] so upstream fetches stop early.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    abort: AbortController,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            abort: AbortController::new(),
        }
    }

    /// Subscribe to the shutdown notification.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fires once shutdown has been triggered.
    pub fn signal(&self) -> AbortSignal {
        self.abort.signal()
    }

    /// Trigger shutdown. Later calls are no-ops.
    pub fn trigger(&self) {
        if self.abort.abort(AbortReason::cancelled("server shutting down")) {
            tracing::info!(subscribers = self.tx.receiver_count(), "Shutdown triggered");
            let _ = self.tx.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.abort.signal().is_aborted()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
