//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound for `sleep_time_ms`.
pub const MAX_SLEEP_TIME_MS: u64 = i32::MAX as u64;

/// Upper bound for `static_worker_count`.
pub const MAX_STATIC_WORKERS: u32 = 50;

/// Root configuration for a worker pool host.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BgpoolConfig {
    /// Process-wide worker tunables.
    pub pool: PoolSettings,

    /// In-process host settings.
    pub host: HostConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl BgpoolConfig {
    /// Fields that differ in `other` but only take effect when the host restarts.
    ///
    /// `pool.static_worker_count` is left to the host, which pins it itself.
    pub fn restart_only_changes(&self, other: &BgpoolConfig) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.host.max_workers != other.host.max_workers {
            changed.push("host.max_workers");
        }
        if self.observability.log_level != other.observability.log_level {
            changed.push("observability.log_level");
        }
        if self.observability.metrics_address != other.observability.metrics_address {
            changed.push("observability.metrics_address");
        }
        changed
    }
}

/// Process-wide tunables shared by every worker of the pool.
///
/// `sleep_time_ms` is reloadable; `static_worker_count` is fixed once the
/// static pool has been registered.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PoolSettings {
    /// Duration between maintenance cycles in milliseconds.
    pub sleep_time_ms: u64,

    /// Number of workers registered at host attach time.
    pub static_worker_count: u32,
}

impl PoolSettings {
    /// The wait timeout derived from `sleep_time_ms`.
    pub fn sleep_interval(&self) -> Duration {
        Duration::from_millis(self.sleep_time_ms)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            sleep_time_ms: 10_000,
            static_worker_count: 1,
        }
    }
}

/// Host configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostConfig {
    /// Maximum number of worker processes (static and dynamic) the host can run.
    pub max_workers: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { max_workers: 8 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus endpoint bind address; metrics are not exported when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}
