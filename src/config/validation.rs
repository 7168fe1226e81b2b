//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sleep time, worker counts, host capacity)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BgpoolConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{BgpoolConfig, PoolSettings, MAX_SLEEP_TIME_MS, MAX_STATIC_WORKERS};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("pool.sleep_time_ms must be between 1 and {max}, got {value}")]
    SleepTimeOutOfRange { value: u64, max: u64 },

    #[error("pool.static_worker_count must be between 1 and {max}, got {value}")]
    StaticWorkerCountOutOfRange { value: u32, max: u32 },

    #[error("host.max_workers must be at least 1")]
    NoWorkerCapacity,

    #[error("host.max_workers ({max_workers}) cannot hold {static_workers} static workers")]
    CapacityBelowStaticPool { max_workers: usize, static_workers: u32 },

    #[error("observability.metrics_address is not a socket address: {0}")]
    MetricsAddress(String),
}

/// Validate the pool tunables on their own.
pub fn validate_pool(pool: &PoolSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_pool(pool, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a complete configuration.
pub fn validate_config(config: &BgpoolConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_pool(&config.pool, &mut errors);

    if config.host.max_workers == 0 {
        errors.push(ValidationError::NoWorkerCapacity);
    } else if (config.host.max_workers as u64) < config.pool.static_worker_count as u64 {
        errors.push(ValidationError::CapacityBelowStaticPool {
            max_workers: config.host.max_workers,
            static_workers: config.pool.static_worker_count,
        });
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_pool(pool: &PoolSettings, errors: &mut Vec<ValidationError>) {
    if !(1..=MAX_SLEEP_TIME_MS).contains(&pool.sleep_time_ms) {
        errors.push(ValidationError::SleepTimeOutOfRange {
            value: pool.sleep_time_ms,
            max: MAX_SLEEP_TIME_MS,
        });
    }
    if !(1..=MAX_STATIC_WORKERS).contains(&pool.static_worker_count) {
        errors.push(ValidationError::StaticWorkerCountOutOfRange {
            value: pool.static_worker_count,
            max: MAX_STATIC_WORKERS,
        });
    }
}
