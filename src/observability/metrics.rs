//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_peer_attach_total` (counter): attaches by role
//! - `proxy_peer_detach_total` (counter): detaches by role
//! - `proxy_peer_objects` (gauge): live clients, servers, connections
//! - `proxy_peer_alloc_failures_total` (counter): registry exhaustion by kind
//! - `proxy_match_evaluations_total` (counter): rule evaluations by result
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Labels are static strings, no per-peer cardinality

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_attach(role: &'static str) {
    metrics::counter!("proxy_peer_attach_total", "role" => role).increment(1);
}

pub fn record_detach(role: &'static str) {
    metrics::counter!("proxy_peer_detach_total", "role" => role).increment(1);
}

pub fn record_objects(kind: &'static str, live: usize) {
    metrics::gauge!("proxy_peer_objects", "kind" => kind).set(live as f64);
}

pub fn record_alloc_failure(kind: &'static str) {
    metrics::counter!("proxy_peer_alloc_failures_total", "kind" => kind).increment(1);
}

pub fn record_match(matched: bool) {
    let result = if matched { "match" } else { "no_match" };
    metrics::counter!("proxy_match_evaluations_total", "result" => result).increment(1);
}
