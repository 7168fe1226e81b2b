//! Background worker pool library.

pub mod config;
pub mod host;
pub mod lifecycle;
pub mod observability;
pub mod pool;
pub mod worker;

pub use config::BgpoolConfig;
pub use host::{HostProcessManager, LocalHost};
pub use pool::{LaunchCoordinator, LaunchError};
pub use worker::{Worker, WorkerConfig, WorkerExit};
