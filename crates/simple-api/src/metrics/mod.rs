//! Prometheus metrics for Simple Service
//!
//! Exposes metrics at `/metrics` endpoint in Prometheus format.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use simple_core::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::server::AppState;

/// Metric names
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "simple_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "simple_http_request_duration_seconds";

    // Authentication metrics
    pub const AUTH_ATTEMPTS_TOTAL: &str = "simple_auth_attempts_total";

    // System metrics
    pub const UPTIME_SECONDS: &str = "simple_uptime_seconds";
    pub const INFO: &str = "simple_info";
}

/// Metrics recorder
#[derive(Clone)]
pub struct MetricsRecorder {
    handle: PrometheusHandle,
    start_time: Instant,
}

impl MetricsRecorder {
    /// Install the process-wide Prometheus recorder
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            Error::Other(anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))
        })?;

        Ok(Self::with_handle(handle))
    }

    /// Render through an already installed recorder
    pub fn with_handle(handle: PrometheusHandle) -> Self {
        gauge!(names::INFO, "version" => simple_core::VERSION).set(1.0);

        Self {
            handle,
            start_time: Instant::now(),
        }
    }

    /// Get metrics output in Prometheus format
    pub fn render(&self) -> String {
        gauge!(names::UPTIME_SECONDS).set(self.start_time.elapsed().as_secs_f64());

        self.handle.render()
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, method: &str, status: u16, duration_secs: f64) {
        let status_class = format!("{}xx", status / 100);

        counter!(
            names::HTTP_REQUESTS_TOTAL,
            "method" => method.to_string(),
            "status" => status.to_string(),
            "status_class" => status_class
        )
        .increment(1);

        histogram!(
            names::HTTP_REQUEST_DURATION_SECONDS,
            "method" => method.to_string()
        )
        .record(duration_secs);
    }

    /// Record a gate decision; `outcome` is "authenticated" or an error code
    pub fn record_auth_attempt(&self, outcome: &'static str) {
        counter!(names::AUTH_ATTEMPTS_TOTAL, "outcome" => outcome).increment(1);
    }
}

/// Axum middleware for recording HTTP metrics
pub async fn metrics_middleware(
    State(metrics): State<Arc<MetricsRecorder>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    metrics.record_http_request(&method, status, duration);

    debug!(
        method = %method,
        status = %status,
        duration_ms = %(duration * 1000.0),
        "Request completed"
    );

    response
}

/// Handler for /metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(metrics) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            metrics.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
