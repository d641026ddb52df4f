//! # Trend classifier
//! Buckets items into virality tiers by velocity against the category
//! baseline, and aggregates a small report for downstream consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::baseline::CategoryBaseline;
use crate::sample::Sample;
use crate::stats::freshness::sample_velocity;

/// Velocity tier relative to the category's own distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendTier {
    /// Above the category's p90 velocity.
    Viral,
    /// Between p75 and p90.
    Rising,
    /// Between p50 and p75.
    Stable,
    /// At or below the median.
    Background,
}

/// One classified item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub velocity: f64,
    pub tier: TrendTier,
}

/// Aggregate classification of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReport {
    pub items: Vec<TrendItem>,
    pub viral: usize,
    pub rising: usize,
    pub stable: usize,
    pub background: usize,
    /// Items without a usable timestamp, left unclassified.
    pub skipped: usize,
    /// Fastest item in the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<TrendItem>,
}

/// Tier for a single velocity. A baseline without real velocity spread
/// (degraded or empty category) grounds everything at `Background`
/// rather than declaring the whole batch viral.
pub fn classify_velocity(velocity: f64, baseline: &CategoryBaseline) -> TrendTier {
    if baseline.velocity_p90 <= 0.0 {
        return TrendTier::Background;
    }
    if velocity > baseline.velocity_p90 {
        TrendTier::Viral
    } else if velocity > baseline.velocity_p75 {
        TrendTier::Rising
    } else if velocity > baseline.velocity_p50 {
        TrendTier::Stable
    } else {
        TrendTier::Background
    }
}

/// Classify a batch of samples against the baseline at `now`.
///
/// Samples without a usable timestamp are counted as skipped; they carry
/// no velocity signal and cannot be tiered.
pub fn classify_items(
    samples: &[Sample],
    baseline: &CategoryBaseline,
    now: DateTime<Utc>,
    min_velocity_hours: f64,
) -> TrendReport {
    let mut items = Vec::with_capacity(samples.len());
    let mut skipped = 0usize;
    let (mut viral, mut rising, mut stable, mut background) = (0, 0, 0, 0);

    for sample in samples {
        let Some(vel) = sample_velocity(sample, now, min_velocity_hours) else {
            skipped += 1;
            continue;
        };
        let tier = classify_velocity(vel, baseline);
        match tier {
            TrendTier::Viral => viral += 1,
            TrendTier::Rising => rising += 1,
            TrendTier::Stable => stable += 1,
            TrendTier::Background => background += 1,
        }
        items.push(TrendItem {
            label: sample.label.clone(),
            velocity: vel,
            tier,
        });
    }

    let top = items
        .iter()
        .max_by(|a, b| {
            a.velocity
                .partial_cmp(&b.velocity)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned();

    TrendReport {
        items,
        viral,
        rising,
        stable,
        background,
        skipped,
        top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn baseline() -> CategoryBaseline {
        let mut b = CategoryBaseline::empty(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        b.velocity_p50 = 100.0;
        b.velocity_p75 = 200.0;
        b.velocity_p90 = 400.0;
        b.sample_count = 20;
        b
    }

    #[test]
    fn tier_boundaries_are_exclusive_above() {
        let b = baseline();
        assert_eq!(classify_velocity(500.0, &b), TrendTier::Viral);
        assert_eq!(classify_velocity(400.0, &b), TrendTier::Rising);
        assert_eq!(classify_velocity(250.0, &b), TrendTier::Rising);
        assert_eq!(classify_velocity(200.0, &b), TrendTier::Stable);
        assert_eq!(classify_velocity(150.0, &b), TrendTier::Stable);
        assert_eq!(classify_velocity(100.0, &b), TrendTier::Background);
        assert_eq!(classify_velocity(0.0, &b), TrendTier::Background);
    }

    #[test]
    fn degraded_baseline_grounds_everything() {
        let empty = CategoryBaseline::empty(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(classify_velocity(1_000_000.0, &empty), TrendTier::Background);
    }

    #[test]
    fn report_counts_and_top() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let at = |hours: i64| now - chrono::Duration::hours(hours);
        let samples = vec![
            // 6000/2 = 3000/h: viral.
            Sample::new(6000.0).with_timestamp(at(2)).with_label("breakout"),
            // 300/1 = 300/h: rising.
            Sample::new(300.0).with_timestamp(at(1)).with_label("climber"),
            // 150/1 = 150/h: stable.
            Sample::new(150.0).with_timestamp(at(1)).with_label("steady"),
            // 50/10 = 5/h: background.
            Sample::new(50.0).with_timestamp(at(10)).with_label("quiet"),
            // No timestamp: skipped.
            Sample::new(9999.0).with_label("undated"),
        ];

        let report = classify_items(&samples, &baseline(), now, 1.0);
        assert_eq!(report.viral, 1);
        assert_eq!(report.rising, 1);
        assert_eq!(report.stable, 1);
        assert_eq!(report.background, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.items.len(), 4);

        let top = report.top.unwrap();
        assert_eq!(top.label.as_deref(), Some("breakout"));
        assert_eq!(top.tier, TrendTier::Viral);
    }

    #[test]
    fn empty_batch_yields_empty_report() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let report = classify_items(&[], &baseline(), now, 1.0);
        assert!(report.items.is_empty());
        assert!(report.top.is_none());
        assert_eq!(report.viral + report.rising + report.stable + report.background, 0);
    }
}
