//! Per-worker launch parameters.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::PoolSettings;

/// Maximum length of a worker's display name, in bytes.
pub const MAX_WORKER_NAME_LEN: usize = 96;

const WORKER_NAME_PREFIX: &str = "worker_";

/// Errors building a [`WorkerConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerConfigError {
    #[error("worker index must be at least 1, got {0}")]
    InvalidIndex(i64),

    #[error("worker name is {len} bytes, the limit is {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("worker name must not be empty")]
    EmptyName,
}

/// A validated worker display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkerName(String);

impl WorkerName {
    pub fn new(name: impl Into<String>) -> Result<Self, WorkerConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(WorkerConfigError::EmptyName);
        }
        if name.len() > MAX_WORKER_NAME_LEN {
            return Err(WorkerConfigError::NameTooLong {
                len: name.len(),
                max: MAX_WORKER_NAME_LEN,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a worker needs from its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Access to state the host shares with its workers.
    pub shared_state: bool,
    /// A data connection for transactional scopes.
    pub data_connection: bool,
}

impl Capabilities {
    pub const MAINTENANCE: Self = Self {
        shared_state: true,
        data_connection: true,
    };
}

/// When the host starts a registered worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StartTime {
    /// Held until the host reaches its normal-operation milestone.
    RecoveryFinished,
    /// Started as soon as it is registered.
    Immediate,
}

/// What the host does when a worker exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RestartPolicy {
    Never,
}

/// Parameters for one worker instance. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerConfig {
    index: u32,
    name: WorkerName,
    sleep_interval: Duration,
    capabilities: Capabilities,
    start_time: StartTime,
    restart: RestartPolicy,
}

impl WorkerConfig {
    /// Config for a worker of the static pool, started after recovery.
    pub fn static_worker(index: i64, settings: &PoolSettings) -> Result<Self, WorkerConfigError> {
        Self::build(index, settings, StartTime::RecoveryFinished)
    }

    /// Config for a worker launched on demand.
    pub fn dynamic_worker(index: i64, settings: &PoolSettings) -> Result<Self, WorkerConfigError> {
        Self::build(index, settings, StartTime::Immediate)
    }

    fn build(index: i64, settings: &PoolSettings, start_time: StartTime) -> Result<Self, WorkerConfigError> {
        let index = u32::try_from(index)
            .ok()
            .filter(|i| *i >= 1)
            .ok_or(WorkerConfigError::InvalidIndex(index))?;

        Ok(Self {
            index,
            name: WorkerName::new(format!("{WORKER_NAME_PREFIX}{index}"))?,
            sleep_interval: settings.sleep_interval(),
            capabilities: Capabilities::MAINTENANCE,
            start_time,
            restart: RestartPolicy::Never,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &WorkerName {
        &self.name
    }

    /// Sleep interval the worker starts with; a reload may change it later.
    pub fn sleep_interval(&self) -> Duration {
        self.sleep_interval
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn start_time(&self) -> StartTime {
        self.start_time
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        self.restart
    }
}
