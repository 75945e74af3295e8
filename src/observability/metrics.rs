//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dashboard_requests_total` (counter): requests by method, status
//! - `dashboard_request_duration_seconds` (histogram): latency distribution
//! - `dashboard_deadline_exceeded_total` (counter): lost deadline races by label
//! - `dashboard_armed_timers` (gauge): deadline timers currently alive
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "dashboard_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "dashboard_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_deadline_exceeded(label: &str) {
    counter!("dashboard_deadline_exceeded_total", "label" => label.to_string()).increment(1);
}

pub fn timer_armed() {
    gauge!("dashboard_armed_timers").increment(1.0);
}

pub fn timer_released() {
    gauge!("dashboard_armed_timers").decrement(1.0);
}
