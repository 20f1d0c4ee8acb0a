//! Metrics collection and exposition.
//!
//! # Metrics
//! - `job_requests_total` (counter): requests by endpoint, method, status
//! - `job_request_duration_seconds` (histogram): handler latency
//! - `job_health_state` (gauge): 0=not live, 1=live, 2=ready, -1=error
//!
//! The Prometheus recorder is installed once per process and rendered by
//! `GET /metrics` on the job's own listener.

use std::sync::OnceLock;
use std::time::Instant;

use axum::{http::StatusCode, response::IntoResponse};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder if it is not installed yet.
///
/// Returns `None` when another recorder already owns the process.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install Prometheus recorder");
                None
            }
        })
        .as_ref()
}

/// Record a served job request.
pub fn record_request(endpoint: &str, method: &str, status: u16, start: Instant) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("job_requests_total", &labels).increment(1);
    histogram!("job_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_health_state(value: f64) {
    gauge!("job_health_state").set(value);
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    match prometheus_handle() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder unavailable".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_installed_once() {
        let first = prometheus_handle().map(|h| h as *const _);
        let second = prometheus_handle().map(|h| h as *const _);
        assert_eq!(first, second);
    }

    #[test]
    fn rendered_output_contains_recorded_request() {
        let Some(handle) = prometheus_handle() else {
            return;
        };
        record_request("/perform", "POST", 200, Instant::now());
        assert!(handle.render().contains("job_requests_total"));
    }
}
