//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routing_routes_registered_total` (counter): routes submitted to the table
//! - `routing_gateway_resolutions_total` (counter): gateway outcomes by `outcome`
//! - `routing_dispatch_total` (counter): dispatched requests by method, status
//! - `routing_dispatch_duration_seconds` (histogram): dispatch latency
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users and
//!   tests pay nothing
//! - Labels stay low-cardinality: no paths or action names

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with a scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let buckets = [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

    let installed = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(&buckets)
        .and_then(|builder| builder.install());

    match installed {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn describe_metrics() {
    describe_counter!(
        "routing_routes_registered_total",
        "Routes submitted to the routing table"
    );
    describe_counter!(
        "routing_gateway_resolutions_total",
        "Gateway resolutions by outcome (named, synthesized, memoized, unresolved)"
    );
    describe_counter!("routing_dispatch_total", "Dispatched requests by method and status");
    describe_histogram!(
        "routing_dispatch_duration_seconds",
        "Dispatch latency in seconds"
    );
}

pub fn record_routes_registered(count: usize) {
    counter!("routing_routes_registered_total").increment(count as u64);
}

pub fn record_gateway_resolution(outcome: &'static str) {
    counter!("routing_gateway_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_dispatch(method: &str, status: u16, start: Instant) {
    counter!(
        "routing_dispatch_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("routing_dispatch_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}
