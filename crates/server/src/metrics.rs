//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the batchfetch server:
//! - HTTP request metrics (latency, counts)
//! - Admission control (slots in use, capacity, rejections)
//! - Core batch and fetch metrics, registered from `batchfetch_core`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "batchfetch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("batchfetch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "batchfetch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Admission Metrics
// =============================================================================

/// Batches currently admitted (collected dynamically).
pub static ADMISSION_IN_USE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "batchfetch_admission_in_use",
        "Number of batches currently admitted",
    )
    .unwrap()
});

/// Admission ceiling (collected dynamically).
pub static ADMISSION_CAPACITY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "batchfetch_admission_capacity",
        "Maximum number of concurrently admitted batches",
    )
    .unwrap()
});

/// Batches refused because the limiter was full.
pub static ADMISSION_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "batchfetch_admission_rejected_total",
        "Total batches rejected by admission control",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Admission
    registry
        .register(Box::new(ADMISSION_IN_USE.clone()))
        .unwrap();
    registry
        .register(Box::new(ADMISSION_CAPACITY.clone()))
        .unwrap();
    registry
        .register(Box::new(ADMISSION_REJECTED_TOTAL.clone()))
        .unwrap();

    // Core metrics (batches, fetches)
    for metric in batchfetch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Update gauges from current application state before encoding.
pub fn collect_dynamic_metrics(state: &AppState) {
    let status = state.limiter().status();
    ADMISSION_IN_USE.set(status.current as i64);
    ADMISSION_CAPACITY.set(status.max as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("batchfetch_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        batchfetch_core::metrics::BATCHES_TOTAL
            .with_label_values(&["success"])
            .inc_by(0);
        ADMISSION_CAPACITY.set(100);

        let output = encode_metrics();
        assert!(output.contains("batchfetch_batches_total"));
        assert!(output.contains("batchfetch_fetches_in_flight"));
        assert!(output.contains("batchfetch_admission_capacity"));
        assert!(output.contains("batchfetch_admission_rejected_total"));
    }
}
