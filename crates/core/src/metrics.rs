//! Prometheus metrics for the submission pipeline.
//!
//! This module provides metrics for:
//! - Terminal outcomes of `create_ticket`
//! - Lock acquire attempts
//! - Dispatch latency

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use tracing::warn;

/// Terminal submission outcomes.
pub static SUBMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketgate_submissions_total",
            "Total ticket submissions by outcome",
        ),
        &["outcome"], // "created", "debug_echo", "invalid", "duplicate", ...
    )
    .unwrap()
});

/// Lock acquire attempts.
pub static LOCK_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketgate_lock_attempts_total",
            "Total idempotency lock acquire attempts",
        ),
        &["result"], // "acquired", "held", "error"
    )
    .unwrap()
});

/// Live dispatch duration in seconds.
pub static DISPATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketgate_dispatch_duration_seconds",
            "Duration of outbound ticket requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

/// Register all core metrics with `registry`.
pub fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SUBMISSIONS_TOTAL.clone()),
        Box::new(LOCK_ATTEMPTS.clone()),
        Box::new(DISPATCH_DURATION.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        let registry = Registry::new();
        SUBMISSIONS_TOTAL.with_label_values(&["created"]).inc();
        register_metrics(&registry);

        let names: Vec<_> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"ticketgate_submissions_total".to_string()));
    }
}
