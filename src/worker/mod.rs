//! Worker subsystem.
//!
//! # Data Flow
//! ```text
//! WorkerConfig (config.rs) + WorkerContext
//!     → Worker::run (control_loop.rs)
//!         connect → Initialize cycle
//!         loop: composite wait → host death? → reload? → terminate? → Steady cycle
//!     → each cycle: ScopeProvider::open → CycleExecutor::run_once → commit | rollback (cycle.rs)
//!     → activity.rs publishes state and counters after every transition
//! ```
//!
//! # Design Decisions
//! - One worker is one single-threaded loop; nothing inside it takes a lock
//! - The only shared input is the settings source, read on reload only
//! - Cycle failures are absorbed; host death and startup failure end the worker

pub mod activity;
pub mod config;
pub mod control_loop;
pub mod cycle;
pub mod maintenance;

pub use activity::{ActivityReporter, ActivityState, WorkerActivity};
pub use config::{Capabilities, RestartPolicy, StartTime, WorkerConfig, WorkerConfigError, WorkerName};
pub use control_loop::{Worker, WorkerContext, WorkerExit};
pub use cycle::{CycleExecutor, CyclePhase, ExecutorError, ScopeError, ScopeGuard, ScopeProvider, TransactionScope};
pub use maintenance::{MaintenanceExecutor, NoopScopeProvider};
