//! Host liveness tracking.
//!
//! The host owns a [`HostLifeline`]; every worker holds a [`HostLiveness`]
//! subscribed to it. The host is considered dead once the lifeline is killed
//! or dropped, which is how a worker detects that its host went away.

use tokio::sync::watch;

/// Host side of the liveness channel.
#[derive(Debug)]
pub struct HostLifeline {
    tx: watch::Sender<bool>,
}

impl HostLifeline {
    /// Create a lifeline for a live host.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(true);
        Self { tx }
    }

    /// Subscribe a worker to this host's liveness.
    pub fn liveness(&self) -> HostLiveness {
        HostLiveness {
            rx: self.tx.subscribe(),
        }
    }

    /// Mark the host dead. Every subscribed worker observes it.
    pub fn kill(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_alive(&self) -> bool {
        *self.tx.borrow()
    }

    /// Number of workers still watching this host.
    pub fn watcher_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for HostLifeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker side of the liveness channel.
#[derive(Debug, Clone)]
pub struct HostLiveness {
    rx: watch::Receiver<bool>,
}

impl HostLiveness {
    /// True while the host is reachable.
    pub fn is_alive(&self) -> bool {
        *self.rx.borrow() && self.rx.has_changed().is_ok()
    }

    /// Resolve once the host is dead. Cancel-safe.
    pub async fn died(&mut self) {
        loop {
            if !*self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
