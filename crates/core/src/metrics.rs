//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Batches (results, durations, sizes)
//! - Fetches (results, durations, in-flight count)
//! - Outcomes discarded after a batch already finished

use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
};

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batches finished total by result.
pub static BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("batchfetch_batches_total", "Total batches processed"),
        &["result"], // "success", "failed", "cancelled", "incomplete"
    )
    .unwrap()
});

/// Batch duration in seconds.
pub static BATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "batchfetch_batch_duration_seconds",
            "Duration of a whole batch download",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["result"],
    )
    .unwrap()
});

/// URLs per batch.
pub static BATCH_SIZE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("batchfetch_batch_size", "Number of URLs per batch")
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0]),
    )
    .unwrap()
});

// =============================================================================
// Fetch Metrics
// =============================================================================

/// Fetches total by result.
pub static FETCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("batchfetch_fetches_total", "Total single-URL fetches"),
        &["result"], // "success" or a FetchError kind
    )
    .unwrap()
});

/// Fetch duration in seconds.
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "batchfetch_fetch_duration_seconds",
            "Duration of single-URL fetches",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["result"],
    )
    .unwrap()
});

/// Fetches currently in flight across all batches.
pub static FETCHES_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "batchfetch_fetches_in_flight",
        "Number of fetches currently running",
    )
    .unwrap()
});

/// Outcomes produced after their batch had already returned.
pub static OUTCOMES_DISCARDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "batchfetch_outcomes_discarded_total",
        "Fetch outcomes dropped because the batch had already finished",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Batches
        Box::new(BATCHES_TOTAL.clone()),
        Box::new(BATCH_DURATION.clone()),
        Box::new(BATCH_SIZE.clone()),
        // Fetches
        Box::new(FETCHES_TOTAL.clone()),
        Box::new(FETCH_DURATION.clone()),
        Box::new(FETCHES_IN_FLIGHT.clone()),
        Box::new(OUTCOMES_DISCARDED.clone()),
    ]
}
