//! Host process manager subsystem.
//!
//! # Data Flow
//! ```text
//! Static registration (preload phase only):
//!     register_static(config) → held until start() → worker spawned
//!
//! Dynamic registration (after start):
//!     register_dynamic(config) → worker spawned now → Handle
//!     wait_for_startup(Handle) → Started(pid) | Stopped | HostDied
//!
//! Host death (kill() or the host being dropped):
//!     lifeline cut → every worker's composite wait returns → workers exit
//! ```
//!
//! # Design Decisions
//! - The contract is a trait so the pool logic runs against any host
//! - Handles are consumed by `wait_for_startup`, so one wait per registration
//! - Workers are never restarted

pub mod local;

use std::fmt;
use std::num::NonZeroU32;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::worker::{CycleExecutor, MaintenanceExecutor, NoopScopeProvider, ScopeProvider, WorkerConfig};

pub use local::{ExitRecord, LocalHandle, LocalHost, WorkerSnapshot};

/// Identifier of a started worker. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Pid(NonZeroU32);

impl Pid {
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a dynamically registered worker as seen through its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    NotYetStarted,
    Started(Pid),
    Stopped,
    HostDied,
}

/// Errors from host registration calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("no free worker slots (capacity {capacity})")]
    NoFreeSlots { capacity: usize },

    #[error("static workers can only be registered while the host is preloading")]
    RegistrationClosed,

    #[error("dynamic workers cannot be registered before the host has started")]
    NotStarted,

    #[error("host is not running")]
    HostStopped,

    #[error("worker setup failed: {0}")]
    Setup(String),
}

/// What the pool needs from the process that hosts its workers.
#[async_trait]
pub trait HostProcessManager: Send + Sync {
    /// Opaque handle to a dynamically registered worker.
    type Handle: Send;

    /// True while the host is in its shared pre-registration phase.
    fn preload_in_progress(&self) -> bool;

    /// Register a worker to be started once the host reaches normal operation.
    fn register_static(&self, config: WorkerConfig) -> Result<(), HostError>;

    /// Register and start a worker now.
    fn register_dynamic(&self, config: WorkerConfig) -> Result<Self::Handle, HostError>;

    /// Block until the worker behind `handle` leaves `NotYetStarted`.
    async fn wait_for_startup(&self, handle: Self::Handle) -> HandleStatus;
}

/// Per-worker collaborators built by the host when a worker starts.
pub struct WorkerParts {
    pub executor: Box<dyn CycleExecutor>,
    pub scopes: Box<dyn ScopeProvider>,
}

/// Builds the collaborators for a worker.
pub trait WorkerFactory: Send + Sync {
    fn build(&self, config: &WorkerConfig) -> Result<WorkerParts, HostError>;
}

/// Factory for the placeholder maintenance work.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaintenanceFactory;

impl WorkerFactory for MaintenanceFactory {
    fn build(&self, _config: &WorkerConfig) -> Result<WorkerParts, HostError> {
        Ok(WorkerParts {
            executor: Box::new(MaintenanceExecutor::new()),
            scopes: Box::new(NoopScopeProvider::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_is_positive() {
        assert!(Pid::new(0).is_none());
        let pid = Pid::new(42).unwrap();
        assert_eq!(pid.get(), 42);
        assert_eq!(pid.to_string(), "42");
    }

    #[test]
    fn test_host_error_display() {
        let err = HostError::NoFreeSlots { capacity: 8 };
        assert_eq!(err.to_string(), "no free worker slots (capacity 8)");
    }
}
