//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bgpool_cycles_total` (counter): cycles by worker and outcome
//! - `bgpool_cycle_duration_seconds` (histogram): cycle latency by worker
//! - `bgpool_workers_running` (gauge): live workers in this host
//! - `bgpool_launch_total` (counter): dynamic launches by outcome
//! - `bgpool_reloads_total` (counter): settings reloads by worker
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cycle(worker: &str, ok: bool, start: Instant) {
    let outcome = if ok { "committed" } else { "rolled_back" };
    counter!("bgpool_cycles_total", "worker" => worker.to_string(), "outcome" => outcome).increment(1);
    histogram!("bgpool_cycle_duration_seconds", "worker" => worker.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_workers_running(count: usize) {
    gauge!("bgpool_workers_running").set(count as f64);
}

pub fn record_launch(outcome: &'static str) {
    counter!("bgpool_launch_total", "outcome" => outcome).increment(1);
}

pub fn record_reload(worker: &str) {
    counter!("bgpool_reloads_total", "worker" => worker.to_string()).increment(1);
}
