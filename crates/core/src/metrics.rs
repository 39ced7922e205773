//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Publisher (batches, attempts, rate-limit rejections)
//! - Media pipeline (conversions, thumbnails)
//! - Moderation (fail-open events)
//! - Platform adapters (call latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Publisher
// =============================================================================

/// Publish batches started.
pub static PUBLISH_BATCHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("spreadit_publish_batches_total", "Total publish batches").unwrap()
});

/// Publish attempts by platform and result.
pub static PUBLISH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "spreadit_publish_attempts_total",
            "Total per-platform publish attempts",
        ),
        &["platform", "result"], // "succeeded", "failed"
    )
    .unwrap()
});

/// Attempts rejected by the rate limiter.
pub static RATE_LIMIT_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "spreadit_rate_limit_rejections_total",
            "Publish attempts rejected by the rate limiter",
        ),
        &["platform", "scope"], // "platform", "global"
    )
    .unwrap()
});

// =============================================================================
// Media pipeline
// =============================================================================

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "spreadit_conversion_duration_seconds",
            "Duration of media conversions",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["kind", "result"],
    )
    .unwrap()
});

/// Thumbnails that could not be generated.
pub static THUMBNAIL_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "spreadit_thumbnail_failures_total",
        "Thumbnail extractions that failed",
    )
    .unwrap()
});

// =============================================================================
// Moderation
// =============================================================================

/// Image checks let through because the classifier failed.
pub static MODERATION_FAIL_OPEN: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "spreadit_moderation_fail_open_total",
            "Image moderation checks skipped after classifier failure",
        ),
        &["platform", "reason"], // "error", "timeout"
    )
    .unwrap()
});

/// Posts blocked by moderation or URL screening.
pub static MODERATION_BLOCKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "spreadit_moderation_blocks_total",
            "Posts blocked before dispatch",
        ),
        &["platform", "check"], // "moderation", "url"
    )
    .unwrap()
});

// =============================================================================
// Adapters
// =============================================================================

/// Platform API call duration in seconds.
pub static ADAPTER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "spreadit_adapter_duration_seconds",
            "Duration of platform publish calls",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["platform", "result"],
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Publisher
        Box::new(PUBLISH_BATCHES.clone()),
        Box::new(PUBLISH_ATTEMPTS.clone()),
        Box::new(RATE_LIMIT_REJECTIONS.clone()),
        // Media pipeline
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(THUMBNAIL_FAILURES.clone()),
        // Moderation
        Box::new(MODERATION_FAIL_OPEN.clone()),
        Box::new(MODERATION_BLOCKS.clone()),
        // Adapters
        Box::new(ADAPTER_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        PUBLISH_ATTEMPTS
            .with_label_values(&["facebook", "succeeded"])
            .inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "spreadit_publish_attempts_total"));
    }
}
