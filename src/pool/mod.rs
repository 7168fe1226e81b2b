//! Worker pool subsystem.
//!
//! # Data Flow
//! ```text
//! Host attach (preload phase):
//!     bootstrap.rs reads static_worker_count
//!     → WorkerConfig worker_1..worker_N
//!     → host.register_static (fire-and-forget)
//!
//! Runtime, any caller:
//!     launch.rs builds one dynamic WorkerConfig
//!     → host.register_dynamic → handle
//!     → host.wait_for_startup(handle)
//!     → Started(pid) | Failed(reason) | HostUnavailable
//! ```

pub mod bootstrap;
pub mod launch;

pub use bootstrap::{bootstrap_static_pool, BootstrapOutcome};
pub use launch::{LaunchCoordinator, LaunchError, LaunchOutcome, LaunchRequest};
