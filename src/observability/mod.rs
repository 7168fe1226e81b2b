//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Workers and host produce:
//!     → logging.rs (structured log events, one span per worker)
//!     → metrics.rs (cycle counters, latency, live workers, launches)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape), when configured
//! ```

pub mod logging;
pub mod metrics;
