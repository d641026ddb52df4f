//! # Metrics
//! One-time registration of the engine's metric series. The host process
//! owns the recorder/exporter; without one, every macro call is a no-op.

use metrics::{describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up with help texts).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "signal_samples_skipped_total",
            "Samples dropped for missing timestamps or bad magnitudes."
        );
        describe_counter!(
            "signal_baseline_outliers_total",
            "Magnitude outliers trimmed while building baselines."
        );
        describe_counter!(
            "signal_baseline_recompute_total",
            "Baselines rebuilt from samples after a full cache miss."
        );
        describe_counter!(
            "signal_baseline_cache_hits_total",
            "Baseline cache hits, labeled by tier (local/shared)."
        );
        describe_counter!(
            "signal_baseline_cache_misses_total",
            "Lookups that missed both cache tiers."
        );
        describe_counter!(
            "signal_cache_errors_total",
            "Shared-cache failures swallowed by the engine, labeled by op."
        );
        describe_gauge!(
            "signal_baseline_cache_ttl_seconds",
            "Configured TTL for cached baselines."
        );
    });
}

/// Static gauge with the configured TTL (absolute TTL, no sliding refresh).
pub(crate) fn record_cache_ttl(ttl_secs: u64) {
    ensure_metrics_described();
    gauge!("signal_baseline_cache_ttl_seconds").set(ttl_secs as f64);
}
