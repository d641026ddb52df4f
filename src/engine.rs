//! # Signal engine
//! The orchestrating facade. One explicitly constructed object owns the
//! configuration, the clock, and both cache tiers; callers hold it behind
//! an `Arc` and never touch globals.
//!
//! Baselines are fetched through a two-tier cache: an in-process map for
//! the hot path and a pluggable shared cache for fleet reuse. Every cache
//! failure degrades to a miss or a no-op with a warning; scoring callers
//! never see an error. Shared-tier calls are capped by a short timeout so
//! a stalled backend costs one recompute, not a hung request. Concurrent
//! misses on the same category may recompute redundantly; the computation
//! is idempotent and cheap enough that coalescing is not worth the
//! coordination.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::baseline::{BaselineBuilder, CategoryBaseline};
use crate::cache::{cache_key, NullCache, SharedCache};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::keywords::{KeywordAnalysis, KeywordEngine, KeywordParams, TitleRecord};
use crate::metrics::{ensure_metrics_described, record_cache_ttl};
use crate::sample::Sample;
use crate::stats::combine::{
    combine_scores_detailed, combine_scores_harmonic, CombinedScore, SignalInput,
};
use crate::stats::confidence::{ConfidenceCalculator, ConfidenceResult};
use crate::stats::core::{mean, percentile, percentile_rank, population_std};
use crate::stats::freshness::combined_freshness;
use crate::stats::normal::{percentile_to_z, z_score, z_to_percentile};
use crate::stats::normalize::{category_difficulty, normalize_raw};
use crate::stats::outliers::{remove_outliers_iqr, remove_outliers_mad, OutlierResult};
use crate::stats::percentile_score::percentile_score;
use crate::stats::quality::{assess_quality, FetchedAt, QualityReport};
use crate::trend::{classify_items, TrendReport};

/// Local tier housekeeping threshold.
const LOCAL_TIER_CAP: usize = 1024;

/// Ceiling on a single shared-tier call.
const SHARED_OP_TIMEOUT: Duration = Duration::from_millis(250);

struct LocalEntry {
    baseline: CategoryBaseline,
    stored_at: DateTime<Utc>,
}

/// Facade over the whole scoring pipeline.
pub struct SignalEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    shared: Arc<dyn SharedCache>,
    local: Mutex<HashMap<String, LocalEntry>>,
    builder: BaselineBuilder,
    confidence_calc: ConfidenceCalculator,
    keyword_engine: KeywordEngine,
}

impl SignalEngine {
    /// Engine with the system clock and no shared cache tier.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parts(config, Arc::new(NullCache), Arc::new(SystemClock))
    }

    /// Fully injected constructor; tests pass a fixed clock and a fake
    /// shared cache here.
    pub fn with_parts(
        config: EngineConfig,
        shared: Arc<dyn SharedCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ensure_metrics_described();
        record_cache_ttl(config.cache.ttl_secs);

        let builder = BaselineBuilder::new(
            config.outliers.iqr_k,
            config.freshness.min_velocity_hours,
        );
        let confidence_calc = ConfidenceCalculator::new(config.confidence.max_samples);
        let keyword_engine = KeywordEngine::new(KeywordParams {
            english_only: config.keywords.english_only,
            max_keywords: config.keywords.max_keywords,
            min_velocity_hours: config.freshness.min_velocity_hours,
        });

        Self {
            config,
            clock,
            shared,
            local: Mutex::new(HashMap::new()),
            builder,
            confidence_calc,
            keyword_engine,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fetch-or-build the category baseline through both cache tiers.
    pub async fn baseline(&self, category: &str, samples: &[Sample]) -> CategoryBaseline {
        self.baseline_inner(category, samples, false).await
    }

    /// Recompute the baseline unconditionally and overwrite both tiers.
    pub async fn refresh_baseline(&self, category: &str, samples: &[Sample]) -> CategoryBaseline {
        self.baseline_inner(category, samples, true).await
    }

    async fn baseline_inner(
        &self,
        category: &str,
        samples: &[Sample],
        force: bool,
    ) -> CategoryBaseline {
        let key = cache_key(&self.config.cache.namespace, category);
        let now = self.clock.now();

        if !force {
            // 1) In-process tier.
            if let Some(hit) = self.local_get(&key, now) {
                counter!("signal_baseline_cache_hits_total", "tier" => "local").increment(1);
                return hit;
            }

            // 2) Shared tier; slow reads, read failures and corrupt
            //    payloads all count as misses.
            match timeout(SHARED_OP_TIMEOUT, self.shared.get(&key)).await {
                Ok(Ok(Some(raw))) => match serde_json::from_str::<CategoryBaseline>(&raw) {
                    Ok(baseline) => {
                        counter!("signal_baseline_cache_hits_total", "tier" => "shared")
                            .increment(1);
                        self.local_put(&key, baseline.clone(), now);
                        return baseline;
                    }
                    Err(e) => {
                        warn!(category, error = %e, "corrupt cached baseline, recomputing");
                        counter!("signal_cache_errors_total", "op" => "decode").increment(1);
                    }
                },
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    warn!(category, error = ?e, "shared cache read failed, treating as miss");
                    counter!("signal_cache_errors_total", "op" => "get").increment(1);
                }
                Err(_) => {
                    warn!(category, "shared cache read timed out, treating as miss");
                    counter!("signal_cache_errors_total", "op" => "get").increment(1);
                }
            }
            counter!("signal_baseline_cache_misses_total").increment(1);
        }

        // 3) Recompute from samples.
        let baseline = self.builder.build(category, samples, now);
        counter!("signal_baseline_recompute_total").increment(1);
        debug!(
            category,
            samples = baseline.sample_count,
            outliers = baseline.outliers_removed,
            "baseline recomputed"
        );

        // 4) Store in both tiers, best effort.
        self.local_put(&key, baseline.clone(), now);
        match serde_json::to_string(&baseline) {
            Ok(json) => {
                let write = self.shared.set(&key, json, self.config.cache.ttl_secs);
                match timeout(SHARED_OP_TIMEOUT, write).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(category, error = ?e, "shared cache write failed, continuing");
                        counter!("signal_cache_errors_total", "op" => "set").increment(1);
                    }
                    Err(_) => {
                        warn!(category, "shared cache write timed out, continuing");
                        counter!("signal_cache_errors_total", "op" => "set").increment(1);
                    }
                }
            }
            Err(e) => {
                warn!(category, error = %e, "baseline did not serialize, shared tier skipped");
            }
        }

        baseline
    }

    fn local_get(&self, key: &str, now: DateTime<Utc>) -> Option<CategoryBaseline> {
        let ttl = chrono::Duration::seconds(self.config.cache.ttl_secs as i64);
        let mut local = self.local.lock().expect("local cache mutex poisoned");
        match local.get(key) {
            Some(entry) if now < entry.stored_at + ttl => Some(entry.baseline.clone()),
            Some(_) => {
                local.remove(key);
                None
            }
            None => None,
        }
    }

    fn local_put(&self, key: &str, baseline: CategoryBaseline, now: DateTime<Utc>) {
        let ttl = chrono::Duration::seconds(self.config.cache.ttl_secs as i64);
        let mut local = self.local.lock().expect("local cache mutex poisoned");
        if local.len() >= LOCAL_TIER_CAP {
            local.retain(|_, e| now < e.stored_at + ttl);
        }
        local.insert(
            key.to_owned(),
            LocalEntry {
                baseline,
                stored_at: now,
            },
        );
    }

    // ----- scoring pass-throughs -----

    /// 0-100 score of a raw value against the category's magnitude
    /// percentiles.
    pub fn score_against(&self, baseline: &CategoryBaseline, value: f64) -> f64 {
        percentile_score(value, &baseline.thresholds())
    }

    /// [0,1] cross-category normalization of a raw magnitude.
    pub fn normalize_against(&self, baseline: &CategoryBaseline, raw: f64) -> f64 {
        normalize_raw(raw, baseline.magnitude_mean, baseline.magnitude_std)
    }

    /// Composite difficulty of a category in [0,1].
    pub fn category_difficulty(
        &self,
        mean_magnitude: f64,
        mean_concurrency: f64,
        mean_audience: f64,
    ) -> f64 {
        category_difficulty(mean_magnitude, mean_concurrency, mean_audience)
    }

    /// Confidence for a dataset summary.
    pub fn confidence(
        &self,
        sample_count: usize,
        variance: f64,
        age_hours: f64,
    ) -> ConfidenceResult {
        self.confidence_calc
            .confidence(sample_count, variance, age_hours)
    }

    /// Quality grade for a sample batch; `fetched_at = None` assumes the
    /// pessimistic default staleness.
    pub fn quality(&self, samples: &[Sample], fetched_at: Option<FetchedAt>) -> QualityReport {
        assess_quality(samples, fetched_at, self.clock.now())
    }

    /// Confidence-weighted arithmetic combination.
    pub fn combine(&self, signals: &[SignalInput]) -> CombinedScore {
        combine_scores_detailed(signals)
    }

    /// Harmonic combination for all-or-nothing signal sets.
    pub fn combine_harmonic(&self, signals: &[SignalInput]) -> CombinedScore {
        combine_scores_harmonic(signals)
    }

    /// Blended freshness in [0,1] for data of the given age.
    pub fn freshness(&self, age_hours: f64) -> f64 {
        let f = &self.config.freshness;
        combined_freshness(
            age_hours,
            f.half_life_hours,
            f.recency_window_hours,
            f.decay_weight,
            f.boost_weight,
        )
    }

    /// Keyword and phrase extraction over a title corpus.
    pub fn keywords(&self, records: &[TitleRecord]) -> KeywordAnalysis {
        self.keyword_engine.analyze(records, self.clock.now())
    }

    /// Velocity-tier classification of a batch against its baseline.
    pub fn classify_trends(
        &self,
        samples: &[Sample],
        baseline: &CategoryBaseline,
    ) -> TrendReport {
        classify_items(
            samples,
            baseline,
            self.clock.now(),
            self.config.freshness.min_velocity_hours,
        )
    }

    // ----- statistical primitives -----

    /// Arithmetic mean; 0.0 for an empty slice.
    pub fn mean(&self, values: &[f64]) -> f64 {
        mean(values)
    }

    /// Population standard deviation; 0.0 for fewer than two values.
    pub fn population_std(&self, values: &[f64]) -> f64 {
        population_std(values)
    }

    /// Linear-interpolation percentile, `p` in [0,100].
    pub fn percentile(&self, values: &[f64], p: f64) -> f64 {
        percentile(values, p)
    }

    /// Percentage of values strictly below `value`.
    pub fn percentile_rank(&self, value: f64, values: &[f64]) -> f64 {
        percentile_rank(value, values)
    }

    /// IQR outlier split with the configured Tukey multiplier.
    pub fn remove_outliers(&self, values: &[f64]) -> OutlierResult {
        remove_outliers_iqr(values, self.config.outliers.iqr_k)
    }

    /// MAD outlier split with the configured multiplier, for batches too
    /// contaminated for quartile fences.
    pub fn remove_outliers_mad(&self, values: &[f64]) -> OutlierResult {
        remove_outliers_mad(values, self.config.outliers.mad_k)
    }

    /// Standard score of `value`; 0.0 when the spread is zero.
    pub fn z_score(&self, value: f64, mean: f64, std_dev: f64) -> f64 {
        z_score(value, mean, std_dev)
    }

    /// Standard-normal CDF at `z`, as a percentile in [0,100].
    pub fn z_to_percentile(&self, z: f64) -> f64 {
        z_to_percentile(z)
    }

    /// Inverse normal CDF; the percentile is clamped to [0.01, 99.99].
    pub fn percentile_to_z(&self, p: f64) -> f64 {
        percentile_to_z(p)
    }
}
