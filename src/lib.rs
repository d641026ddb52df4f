// src/lib.rs
// Public library surface for the content signal scoring engine.

pub mod baseline;
pub mod cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod keywords;
pub mod sample;
pub mod stats;
pub mod trend;

pub(crate) mod metrics;

// ---- Re-exports for a stable public API ----
// Callers reach everything through the crate root; the stats submodules
// stay public for the long-tail helpers (core percentiles, normal curve).
pub use crate::baseline::{BaselineBuilder, CategoryBaseline};
pub use crate::cache::{cache_key, MemoryCache, NullCache, SharedCache};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::config::EngineConfig;
pub use crate::engine::SignalEngine;
pub use crate::keywords::{
    KeywordAnalysis, KeywordEngine, KeywordParams, KeywordSignal, PhraseSignal, TitleRecord,
};
pub use crate::sample::{parse_timestamp, Sample};
pub use crate::stats::combine::{
    combine_scores_detailed, combine_scores_harmonic, CombinedScore, SignalInput,
};
pub use crate::stats::confidence::{ConfidenceCalculator, ConfidenceLevel, ConfidenceResult};
pub use crate::stats::freshness::{combined_freshness, freshness_decay, recency_boost, velocity};
pub use crate::stats::normalize::{category_difficulty, normalize_raw};
pub use crate::stats::outliers::{
    remove_outliers_iqr, remove_outliers_mad, OutlierBounds, OutlierResult,
};
pub use crate::stats::percentile_score::{percentile_score, PercentileThresholds};
pub use crate::stats::quality::{assess_quality, FetchedAt, QualityLevel, QualityReport};
pub use crate::trend::{classify_items, classify_velocity, TrendItem, TrendReport, TrendTier};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR APP_ENV in {local, development, dev})
///   - SIGNAL_DEV_LOG=1
///
/// Call once from the embedding application's entrypoint; production
/// builds without the flag stay silent and keep their own subscriber.
pub fn init_dev_tracing() {
    if !keywords::dev_logging_enabled() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("content_signal_engine=debug,keywords=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}
