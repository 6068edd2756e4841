//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routefs_requests_total` (counter): requests by resolution
//! - `routefs_request_duration_seconds` (histogram): dispatch latency
//! - `routefs_reloads_total` (counter): table rebuilds by result
//! - `routefs_routes` (gauge): entries in the live table
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus endpoint only when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished dispatch.
pub fn record_request(resolution: &'static str, start: Instant) {
    counter!("routefs_requests_total", "resolution" => resolution).increment(1);
    histogram!("routefs_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a table rebuild attempt.
pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("routefs_reloads_total", "result" => result).increment(1);
}

/// Publish the size of the live table.
pub fn record_routes(count: usize) {
    gauge!("routefs_routes").set(count as f64);
}
