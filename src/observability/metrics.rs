//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vhost_requests_total` (counter): dispatched requests by outcome, status
//! - `vhost_request_duration_seconds` (histogram): latency by outcome
//! - `vhost_rebuilds_total` (counter): routing table rebuilds
//! - `vhost_rebuild_duration_seconds` (histogram): rebuild latency
//! - `vhost_routing_domains` (gauge): domains in the published table

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(err) => tracing::error!(error = %err, "Failed to start metrics endpoint"),
    }
}

/// Record one dispatched request.
///
/// `outcome` names the handler that served it: `doc-proxy`, `reverse-proxy`,
/// `static`, or `fallback`.
pub fn record_dispatch(outcome: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "vhost_requests_total",
        "outcome" => outcome,
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!("vhost_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one successful routing table rebuild.
pub fn record_rebuild(domains: usize, elapsed: Duration) {
    metrics::counter!("vhost_rebuilds_total").increment(1);
    metrics::gauge!("vhost_routing_domains").set(domains as f64);
    metrics::histogram!("vhost_rebuild_duration_seconds").record(elapsed.as_secs_f64());
}
