//! # Category baseline
//! Per-category distribution snapshot every scorer calibrates against.
//!
//! Built wholesale from a batch of samples: unusable samples are skipped
//! (never an error), the magnitude stream is outlier-trimmed when large
//! enough, and everything degrades to an all-zero record when too little
//! data remains. The record is flat and serde-friendly because it travels
//! through the shared cache as JSON.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::ensure_metrics_described;
use crate::sample::Sample;
use crate::stats::core::{mean, percentile, population_std};
use crate::stats::freshness::{sample_velocity, DEFAULT_MIN_VELOCITY_HOURS};
use crate::stats::outliers::{remove_outliers_iqr, DEFAULT_IQR_K};
use crate::stats::percentile_score::PercentileThresholds;

/// Fewer usable samples than this produce an all-zero baseline.
pub const MIN_BASELINE_SAMPLES: usize = 4;
/// Outlier trimming only kicks in from this many magnitudes up.
pub const MIN_TRIM_SAMPLES: usize = 10;

/// Summary statistics of one category's performance distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBaseline {
    pub magnitude_mean: f64,
    pub magnitude_std: f64,
    pub magnitude_p25: f64,
    pub magnitude_p50: f64,
    pub magnitude_p75: f64,
    pub magnitude_p90: f64,

    pub velocity_mean: f64,
    pub velocity_std: f64,
    pub velocity_p50: f64,
    pub velocity_p75: f64,
    pub velocity_p90: f64,

    pub engagement_mean: f64,
    pub engagement_std: f64,

    /// Magnitude outliers trimmed before the summary stats.
    pub outliers_removed: usize,
    /// Usable samples behind the statistics.
    pub sample_count: usize,
    pub computed_at: DateTime<Utc>,
}

impl CategoryBaseline {
    /// All-zero record: the degraded form for categories without enough data.
    pub fn empty(computed_at: DateTime<Utc>) -> Self {
        Self {
            magnitude_mean: 0.0,
            magnitude_std: 0.0,
            magnitude_p25: 0.0,
            magnitude_p50: 0.0,
            magnitude_p75: 0.0,
            magnitude_p90: 0.0,
            velocity_mean: 0.0,
            velocity_std: 0.0,
            velocity_p50: 0.0,
            velocity_p75: 0.0,
            velocity_p90: 0.0,
            engagement_mean: 0.0,
            engagement_std: 0.0,
            outliers_removed: 0,
            sample_count: 0,
            computed_at,
        }
    }

    /// Magnitude thresholds for the percentile scorer.
    pub fn thresholds(&self) -> PercentileThresholds {
        PercentileThresholds::new(
            self.magnitude_p25,
            self.magnitude_p50,
            self.magnitude_p75,
            self.magnitude_p90,
        )
    }

    /// Whether the record carries real statistics (not the degraded form).
    pub fn has_signal(&self) -> bool {
        self.sample_count >= MIN_BASELINE_SAMPLES
    }

    /// Hours since this baseline was computed.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.computed_at).num_seconds().max(0) as f64) / 3600.0
    }
}

/// Builds [`CategoryBaseline`] records from raw sample batches.
#[derive(Debug, Clone, Copy)]
pub struct BaselineBuilder {
    iqr_k: f64,
    min_velocity_hours: f64,
}

impl Default for BaselineBuilder {
    fn default() -> Self {
        Self {
            iqr_k: DEFAULT_IQR_K,
            min_velocity_hours: DEFAULT_MIN_VELOCITY_HOURS,
        }
    }
}

impl BaselineBuilder {
    pub fn new(iqr_k: f64, min_velocity_hours: f64) -> Self {
        Self {
            iqr_k,
            min_velocity_hours,
        }
    }

    /// Compute a fresh baseline at `now`.
    ///
    /// Samples without a usable timestamp or magnitude are skipped and
    /// counted; with fewer than [`MIN_BASELINE_SAMPLES`] left the result is
    /// the all-zero record (sample_count still reports what was usable).
    pub fn build(&self, category: &str, samples: &[Sample], now: DateTime<Utc>) -> CategoryBaseline {
        ensure_metrics_described();

        let usable: Vec<&Sample> = samples.iter().filter(|s| s.is_usable()).collect();
        let skipped = samples.len() - usable.len();
        if skipped > 0 {
            debug!(category, skipped, "skipped unusable samples");
            counter!("signal_samples_skipped_total").increment(skipped as u64);
        }

        if usable.len() < MIN_BASELINE_SAMPLES {
            debug!(
                category,
                usable = usable.len(),
                "not enough samples, emitting degraded baseline"
            );
            let mut empty = CategoryBaseline::empty(now);
            empty.sample_count = usable.len();
            return empty;
        }

        // 1) Magnitude stream, outlier-trimmed once it is large enough.
        let magnitudes: Vec<f64> = usable.iter().map(|s| s.magnitude).collect();
        let (clean, outliers_removed) = if magnitudes.len() >= MIN_TRIM_SAMPLES {
            let res = remove_outliers_iqr(&magnitudes, self.iqr_k);
            (res.clean, res.outliers.len())
        } else {
            (magnitudes, 0)
        };
        if outliers_removed > 0 {
            debug!(category, outliers_removed, "trimmed magnitude outliers");
            counter!("signal_baseline_outliers_total").increment(outliers_removed as u64);
        }

        // 2) Velocity stream over all usable samples (trimming applies to
        //    magnitudes only).
        let velocities: Vec<f64> = usable
            .iter()
            .filter_map(|s| sample_velocity(s, now, self.min_velocity_hours))
            .collect();

        // 3) Engagement stream, where reported and sane.
        let engagements: Vec<f64> = usable
            .iter()
            .filter_map(|s| s.engagement_rate)
            .filter(|e| e.is_finite() && *e >= 0.0)
            .collect();

        CategoryBaseline {
            magnitude_mean: mean(&clean),
            magnitude_std: population_std(&clean),
            magnitude_p25: percentile(&clean, 25.0),
            magnitude_p50: percentile(&clean, 50.0),
            magnitude_p75: percentile(&clean, 75.0),
            magnitude_p90: percentile(&clean, 90.0),
            velocity_mean: mean(&velocities),
            velocity_std: population_std(&velocities),
            velocity_p50: percentile(&velocities, 50.0),
            velocity_p75: percentile(&velocities, 75.0),
            velocity_p90: percentile(&velocities, 90.0),
            engagement_mean: mean(&engagements),
            engagement_std: population_std(&engagements),
            outliers_removed,
            sample_count: usable.len(),
            computed_at: now,
        }
    }
}
