//! Metrics collection and exposition.
//!
//! # Metrics
//! - `storefront_fetch_attempts_total` (counter): remote calls by operation, outcome
//! - `storefront_retry_exhausted_total` (counter): sequences that gave up
//! - `storefront_quotes_total` (counter): price quotes computed
//! - `storefront_cache_events_total` (counter): catalog cache hits/misses
//! - `storefront_http_requests_total` (counter): API requests by method, status
//! - `storefront_http_request_duration_seconds` (histogram): API latency
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_fetch_attempt(operation: &str, outcome: &'static str) {
    counter!(
        "storefront_fetch_attempts_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_retry_exhausted(operation: &str) {
    counter!("storefront_retry_exhausted_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_quote(product_id: &str) {
    counter!("storefront_quotes_total", "product" => product_id.to_string()).increment(1);
}

pub fn record_cache_event(event: &'static str) {
    counter!("storefront_cache_events_total", "event" => event).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("storefront_http_requests_total", &labels).increment(1);
    histogram!("storefront_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}
