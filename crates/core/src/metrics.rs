//! Prometheus metrics for ISBN resolution.
//!
//! Covers per-source lookups, end-to-end resolution outcomes and series
//! creation. The server registers everything returned by [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sources
// =============================================================================

/// Source lookups by source and result.
pub static SOURCE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bookshelf_source_lookups_total",
            "Total lookups sent to external book sources",
        ),
        &["source", "result"], // "success", "not_found", "incomplete", "timeout", "upstream"
    )
    .unwrap()
});

/// Source lookup latency in seconds.
pub static SOURCE_LOOKUP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bookshelf_source_lookup_duration_seconds",
            "Duration of a single source lookup",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Resolution
// =============================================================================

/// Resolutions by outcome.
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bookshelf_resolutions_total", "Total ISBN resolutions"),
        &["outcome"], // "external", "local", "not_found", "invalid", "error"
    )
    .unwrap()
});

/// Series created by find-or-create.
pub static SERIES_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "bookshelf_series_created_total",
        "Total series created during resolution or by API",
    )
    .unwrap()
});

/// All core metrics, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SOURCE_LOOKUPS.clone()),
        Box::new(SOURCE_LOOKUP_DURATION.clone()),
        Box::new(RESOLUTIONS.clone()),
        Box::new(SERIES_CREATED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        SOURCE_LOOKUPS
            .with_label_values(&["Google Books", "success"])
            .inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"bookshelf_source_lookups_total".to_string()));
    }
}
