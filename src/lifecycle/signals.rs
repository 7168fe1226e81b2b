//! Signal flags and OS signal handling.
//!
//! # Responsibilities
//! - Hold the per-worker reload/terminate flags
//! - Wake the worker's composite wait when a flag is raised
//! - Translate host OS signals (SIGHUP, SIGTERM, SIGINT) to host events
//!
//! # Design Decisions
//! - Raising a flag is an atomic store plus one notify: no locks, no allocation
//! - The latch coalesces wakes; raising it twice before a wait wakes once
//! - `terminate` is sticky; nothing ever clears it

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::Notify;

/// A settable wake-up flag with a single waiter.
#[derive(Debug, Default)]
pub struct Latch {
    set: AtomicBool,
    notify: Notify,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch and wake the waiter if it was not already set.
    pub fn set(&self) {
        if !self.set.swap(true, Ordering::AcqRel) {
            self.notify.notify_one();
        }
    }

    /// Clear the latch. A no-op when it is already clear.
    pub fn reset(&self) {
        self.set.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Wait until the latch is set. Returns immediately if it already is.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            // A stale permit left by an earlier set/reset pair only loops once.
            notified.await;
        }
    }
}

/// Per-worker signal state.
///
/// Written from signal delivery context, read and cleared by the worker's
/// control loop.
#[derive(Debug, Default)]
pub struct SignalState {
    reload: AtomicBool,
    terminate: AtomicBool,
    latch: Latch,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the worker to re-read its settings before its next cycle.
    pub fn request_reload(&self) {
        self.reload.store(true, Ordering::Release);
        self.latch.set();
    }

    /// Ask the worker to stop after the cycle in progress, if any.
    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
        self.latch.set();
    }

    /// Read and clear the reload flag.
    pub fn take_reload(&self) -> bool {
        self.reload.swap(false, Ordering::AcqRel)
    }

    pub fn reload_requested(&self) -> bool {
        self.reload.load(Ordering::Acquire)
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// The latch the worker's composite wait blocks on.
    pub fn latch(&self) -> &Latch {
        &self.latch
    }
}

/// An event delivered to the host process by the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// SIGHUP: re-read configuration and forward a reload to every worker.
    Reload,
    /// SIGTERM or SIGINT: terminate every worker and exit.
    Terminate,
}

/// Installed OS signal streams for the host process.
pub struct OsSignals {
    hangup: Signal,
    terminate: Signal,
    interrupt: Signal,
}

impl OsSignals {
    /// Register handlers for SIGHUP, SIGTERM and SIGINT.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            hangup: signal(SignalKind::hangup())?,
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    /// Wait for the next signal.
    pub async fn recv(&mut self) -> HostSignal {
        tokio::select! {
            _ = self.hangup.recv() => {
                tracing::info!("Received SIGHUP, reloading configuration");
                HostSignal::Reload
            }
            _ = self.terminate.recv() => {
                tracing::info!("Received SIGTERM, terminating workers");
                HostSignal::Terminate
            }
            _ = self.interrupt.recv() => {
                tracing::info!("Received SIGINT, terminating workers");
                HostSignal::Terminate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_latch_wakes_once() {
        let latch = Latch::new();
        latch.set();
        latch.set();

        timeout(Duration::from_millis(100), latch.wait()).await.unwrap();
        latch.reset();

        // The second set was coalesced, so nothing is left to wake us.
        assert!(timeout(Duration::from_millis(50), latch.wait()).await.is_err());
    }

    #[tokio::test]
    async fn test_latch_wakes_pending_waiter() {
        let state = std::sync::Arc::new(SignalState::new());
        let waiter = state.clone();
        let task = tokio::spawn(async move { waiter.latch().wait().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        state.request_reload();

        timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[test]
    fn test_reset_when_clear_is_noop() {
        let latch = Latch::new();
        latch.reset();
        assert!(!latch.is_set());
    }

    #[test]
    fn test_reload_is_cleared_on_take() {
        let state = SignalState::new();
        assert!(!state.take_reload());

        state.request_reload();
        state.request_reload();
        assert!(state.take_reload());
        assert!(!state.take_reload());
    }

    #[test]
    fn test_terminate_is_sticky() {
        let state = SignalState::new();
        state.request_terminate();
        assert!(!state.take_reload());
        assert!(state.terminate_requested());
        state.latch().reset();
        assert!(state.terminate_requested());
    }
}
