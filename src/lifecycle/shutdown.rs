//! Shutdown coordination.

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    /// Stop accepting, let in-flight requests finish.
    Graceful,
    /// Close everything now.
    Immediate,
}

/// Coordinator for shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<ShutdownKind>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownKind> {
        self.tx.subscribe()
    }

    /// Trigger a graceful shutdown.
    pub fn trigger(&self) {
        self.send(ShutdownKind::Graceful);
    }

    pub fn trigger_immediate(&self) {
        self.send(ShutdownKind::Immediate);
    }

    fn send(&self, kind: ShutdownKind) {
        // No subscribers means nothing is running yet.
        let _ = self.tx.send(kind);
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
