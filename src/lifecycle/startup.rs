//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate the whole configuration before anything is created
//! - Create the host in its preload phase
//! - Register the static pool while preloading
//! - Move the host to normal operation, starting the static workers
//!
//! # Design Decisions
//! - Fail fast: an invalid configuration never produces a host
//! - Static registration happens strictly before `start()`

use std::sync::Arc;

use crate::config::validation::validate_config;
use crate::config::{BgpoolConfig, ConfigError};
use crate::host::{LocalHost, WorkerFactory};
use crate::pool::bootstrap::{bootstrap_static_pool, BootstrapOutcome};

/// Build a running host with its static pool started.
pub fn boot(config: &BgpoolConfig, factory: Arc<dyn WorkerFactory>) -> Result<LocalHost, ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let host = LocalHost::new(config, factory);
    match bootstrap_static_pool(&host, &config.pool)? {
        BootstrapOutcome::Registered { requested, registered } if registered < requested => {
            tracing::warn!(requested, registered, "Static pool is incomplete");
        }
        _ => {}
    }

    let started = host.start();
    tracing::info!(started, max_workers = config.host.max_workers, "Host ready");
    Ok(host)
}
