//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by outcome kind and status
//! - `relay_request_duration_seconds` (histogram): time to the response head
//! - `relay_stream_bytes_total` (counter): audio bytes relayed to callers
//! - `relay_stream_aborts_total` (counter): post-commit aborts by reason
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! metrics-disabled deployments pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_stream_bytes(bytes: u64) {
    metrics::counter!("relay_stream_bytes_total").increment(bytes);
}

pub fn record_stream_abort(reason: &'static str) {
    metrics::counter!("relay_stream_aborts_total", "reason" => reason).increment(1);
}
