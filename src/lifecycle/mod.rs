//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Create host (preload) → Register static pool → start()
//!
//! Signals (signals.rs):
//!     SIGHUP → reload flag + latch of every worker
//!     SIGTERM/SIGINT → terminate flag + latch of every worker
//!
//! Liveness (liveness.rs):
//!     Host lifeline cut (kill or drop) → every worker's wait returns HostDied
//! ```
//!
//! # Design Decisions
//! - Signal handlers only set flags and wake the latch; all work happens in the loop
//! - Terminate is sticky: once requested it is never cleared

pub mod liveness;
pub mod signals;
pub mod startup;
