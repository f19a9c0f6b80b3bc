//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_endpoint_matches_total` (counter): match outcomes by route
//!   and outcome (`matched`, `no_match`, `excluded`)
//! - `gateway_registry_rebuilds_total` (counter): rebuilds by trigger kind
//! - `gateway_forwarded_total` (counter): forwarded requests by status

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one match attempt outcome.
pub fn record_match(route_id: &str, outcome: &'static str) {
    metrics::counter!(
        "gateway_endpoint_matches_total",
        "route" => route_id.to_string(),
        "outcome" => outcome,
    )
    .increment(1);
}

/// Record one registry rebuild.
pub fn record_rebuild(trigger: &'static str) {
    metrics::counter!("gateway_registry_rebuilds_total", "trigger" => trigger).increment(1);
}

/// Record one forwarded request.
pub fn record_forwarded(status: u16) {
    metrics::counter!("gateway_forwarded_total", "status" => status.to_string()).increment(1);
}
