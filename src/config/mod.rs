//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (range checks)
//!     → BgpoolConfig (validated, immutable)
//!     → PoolSettings published into source.rs (SharedSettings)
//!
//! On reload (SIGHUP or watcher.rs detecting a change):
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → host publishes the new PoolSettings
//!     → host raises the reload flag of every worker
//!     → each worker re-reads its SettingsSource before its next wait
//! ```
//!
//! # Design Decisions
//! - Workers cache their settings; nothing changes under a running cycle
//! - `static_worker_count` is fixed once the static pool is registered
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod source;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::{BgpoolConfig, HostConfig, ObservabilityConfig, PoolSettings};
pub use source::{FileSettings, SettingsSource, SharedSettings};
