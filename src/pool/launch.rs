//! On-demand worker launch with startup confirmation.
//!
//! # Responsibilities
//! - Build a dynamic worker config for the requested index
//! - Register it with the host and wait on the returned handle
//! - Turn the host's answer into exactly one [`LaunchOutcome`]
//!
//! # Design Decisions
//! - The handle is moved into the wait, so it is released on every path
//! - `Started` is the only non-error terminal status; anything else
//!   unexpected from the host is a contract breach and panics

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, SettingsSource};
use crate::host::{HandleStatus, HostError, HostProcessManager, Pid};
use crate::observability::metrics;
use crate::worker::{WorkerConfig, WorkerConfigError};

const RESOURCES_HINT: &str = "Check server logs.";
const HOST_HINT: &str = "Kill all remaining worker processes and restart the host.";

/// A caller's request for one more worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchRequest {
    pub index: i64,
}

/// The single answer to a [`LaunchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Started(Pid),
    Failed(String),
    HostUnavailable,
}

impl LaunchOutcome {
    /// Surface the outcome to a caller that wants a pid or an error.
    pub fn into_result(self) -> Result<Pid, LaunchError> {
        match self {
            LaunchOutcome::Started(pid) => Ok(pid),
            LaunchOutcome::Failed(reason) => Err(LaunchError::InsufficientResources { reason }),
            LaunchOutcome::HostUnavailable => Err(LaunchError::HostUnavailable),
        }
    }
}

/// Errors returned by [`LaunchCoordinator::launch_worker`].
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Could not start background worker: {reason}")]
    InsufficientResources { reason: String },

    #[error("Cannot start background worker without a running host")]
    HostUnavailable,

    #[error("Invalid worker request: {0}")]
    InvalidRequest(#[from] WorkerConfigError),

    #[error("Could not read pool settings: {0}")]
    Settings(#[from] ConfigError),
}

impl LaunchError {
    /// What the caller should do about the failure.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            LaunchError::InsufficientResources { .. } => Some(RESOURCES_HINT),
            LaunchError::HostUnavailable => Some(HOST_HINT),
            LaunchError::InvalidRequest(_) | LaunchError::Settings(_) => None,
        }
    }
}

/// Launches dynamic workers on a host.
pub struct LaunchCoordinator<H> {
    host: Arc<H>,
    settings: Arc<dyn SettingsSource>,
}

impl<H: HostProcessManager> LaunchCoordinator<H> {
    pub fn new(host: Arc<H>, settings: Arc<dyn SettingsSource>) -> Self {
        Self { host, settings }
    }

    /// Register one dynamic worker and wait for its startup outcome.
    ///
    /// Requests that cannot even be turned into a worker config are errors;
    /// everything the host answers is an outcome.
    pub async fn launch(&self, request: LaunchRequest) -> Result<LaunchOutcome, LaunchError> {
        let settings = self.settings.load()?;
        let config = WorkerConfig::dynamic_worker(request.index, &settings)?;
        let name = config.name().clone();

        let handle = match self.host.register_dynamic(config) {
            Ok(handle) => handle,
            Err(HostError::HostStopped) => {
                tracing::error!(name = %name, "Host is not running, cannot launch worker");
                metrics::record_launch("host_unavailable");
                return Ok(LaunchOutcome::HostUnavailable);
            }
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Worker registration refused");
                metrics::record_launch("failed");
                return Ok(LaunchOutcome::Failed(format!("insufficient resources: {e}")));
            }
        };

        let outcome = match self.host.wait_for_startup(handle).await {
            HandleStatus::Started(pid) => {
                tracing::info!(name = %name, pid = %pid, "Worker launched");
                metrics::record_launch("started");
                LaunchOutcome::Started(pid)
            }
            HandleStatus::Stopped => {
                tracing::warn!(name = %name, "Worker stopped before it started");
                metrics::record_launch("failed");
                LaunchOutcome::Failed("insufficient resources".to_string())
            }
            HandleStatus::HostDied => {
                tracing::error!(name = %name, "Host died while waiting for worker startup");
                metrics::record_launch("host_unavailable");
                LaunchOutcome::HostUnavailable
            }
            HandleStatus::NotYetStarted => panic!(
                "host returned NotYetStarted from wait_for_startup for {name}; \
                 only Started, Stopped or HostDied are valid"
            ),
        };
        Ok(outcome)
    }

    /// Launch entry point: the new worker's pid, or a typed error.
    pub async fn launch_worker(&self, index: i64) -> Result<Pid, LaunchError> {
        self.launch(LaunchRequest { index }).await?.into_result()
    }
}
