//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ua_blocker_requests_total` (counter): requests by outcome
//!   (`blocked` / `forwarded`)
//! - `ua_blocker_blocked_total` (counter): rejections by filter and agent
//! - `ua_blocker_denylist_size` (gauge): entries in the live denylist
//! - `ua_blocker_upstream_duration_seconds` (histogram): forwarded request
//!   latency by upstream status
//!
//! # Design Decisions
//! - Agent labels only come from denylist hits, so cardinality is bounded
//!   by configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_forwarded() {
    metrics::counter!("ua_blocker_requests_total", "outcome" => "forwarded").increment(1);
}

pub fn record_blocked(filter: &str, agent: &str) {
    metrics::counter!("ua_blocker_requests_total", "outcome" => "blocked").increment(1);
    metrics::counter!(
        "ua_blocker_blocked_total",
        "filter" => filter.to_string(),
        "agent" => agent.to_string()
    )
    .increment(1);
}

pub fn record_denylist_size(size: usize) {
    metrics::gauge!("ua_blocker_denylist_size").set(size as f64);
}

pub fn record_upstream(status: u16, start: Instant) {
    metrics::histogram!(
        "ua_blocker_upstream_duration_seconds",
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
