// tests/e2e_scoring.rs
//
// Full pipeline smoke: baseline build with outlier trimming, percentile
// scoring, freshness, quality, confidence, weighted combination, and
// trend tiers, all through the public SignalEngine facade.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use content_signal_engine::{
    Clock, ConfidenceLevel, EngineConfig, FetchedAt, FixedClock, MemoryCache, QualityLevel, Sample,
    SignalEngine, SignalInput, TrendTier,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 10, 18, 0, 0).unwrap()
}

fn engine_at(clock: &FixedClock) -> SignalEngine {
    let shared = Arc::new(MemoryCache::new(Arc::new(clock.clone())));
    SignalEngine::with_parts(EngineConfig::default(), shared, Arc::new(clock.clone()))
}

/// Ten clustered magnitudes, one ordinary extra, one wild spike.
fn gaming_batch(now: DateTime<Utc>) -> Vec<Sample> {
    let mut batch: Vec<Sample> = (0..10)
        .map(|i| {
            Sample::new(100.0 + 5.0 * i as f64).with_timestamp(now - Duration::hours(2 + i as i64))
        })
        .collect();
    batch.push(Sample::new(120.0).with_timestamp(now - Duration::hours(12)));
    batch.push(Sample::new(50_000.0).with_timestamp(now - Duration::hours(13)));
    batch
}

#[tokio::test]
async fn baseline_to_score_walkthrough() {
    let clock = FixedClock::at(start());
    let engine = engine_at(&clock);
    let now = clock.now();

    let baseline = engine.baseline("gaming", &gaming_batch(now)).await;

    // The 50k spike is trimmed out of the magnitude stream.
    assert_eq!(baseline.sample_count, 12);
    assert_eq!(baseline.outliers_removed, 1);
    assert!((baseline.magnitude_p90 - 140.0).abs() < 1e-9);
    assert!((baseline.magnitude_p50 - 120.0).abs() < 1e-9);

    // Scores against the trimmed percentiles.
    assert!((engine.score_against(&baseline, 140.0) - 90.0).abs() < 1e-9);
    assert!((engine.score_against(&baseline, 120.0) - 50.0).abs() < 1e-9);
    let weak = engine.score_against(&baseline, 105.0);
    assert!((weak - 23.3333333).abs() < 1e-6);

    // The spike itself lands in the soft-capped band, never at 100.
    let spike = engine.score_against(&baseline, 50_000.0);
    assert!(spike > 99.0 && spike < 100.0);
}

#[tokio::test]
async fn composite_score_ranks_strong_item_above_weak_item() {
    let clock = FixedClock::at(start());
    let engine = engine_at(&clock);
    let now = clock.now();

    let baseline = engine.baseline("gaming", &gaming_batch(now)).await;
    let quality = engine.quality(
        &gaming_batch(now),
        Some(FetchedAt::At(now - Duration::hours(1))),
    );
    assert_eq!(quality.level, QualityLevel::Good);
    assert!(quality.is_usable);
    assert!((quality.score - 80.0).abs() < 1e-9);

    let confidence = engine.confidence(baseline.sample_count, 0.2, 2.0);
    assert_eq!(confidence.level, ConfidenceLevel::High);
    assert!(confidence.is_reliable);

    // Strong item: at the p90 magnitude, two hours old.
    let strong = engine.combine(&[
        SignalInput::new("popularity", engine.score_against(&baseline, 140.0) / 100.0, 0.5),
        SignalInput::new("freshness", engine.freshness(2.0), 0.3),
        SignalInput::new("quality", quality.score / 100.0, 0.2),
    ]);
    assert!((strong.score - 0.89967).abs() < 1e-4);
    let sum: f64 = strong.contributions.values().sum();
    assert!((sum - strong.score).abs() < 1e-12);
    // Three well-agreeing signals without per-signal confidence.
    assert_eq!(strong.confidence, 100);

    // Weak item: below p25 and fading at 40 hours.
    let weak = engine.combine(&[
        SignalInput::new("popularity", engine.score_against(&baseline, 105.0) / 100.0, 0.5),
        SignalInput::new("freshness", engine.freshness(40.0), 0.3),
        SignalInput::new("quality", quality.score / 100.0, 0.2),
    ]);
    assert!(strong.score > weak.score + 0.3, "strong {} weak {}", strong.score, weak.score);
}

#[tokio::test]
async fn trend_tiers_follow_the_baseline_velocity_bands() {
    let clock = FixedClock::at(start());
    let engine = engine_at(&clock);
    let now = clock.now();

    let baseline = engine.baseline("gaming", &gaming_batch(now)).await;
    // Velocity percentiles come from the untrimmed stream: p50 ~18.93,
    // p75 ~29.38, p90 ~48.5.
    assert!(baseline.velocity_p90 > 40.0 && baseline.velocity_p90 < 60.0);

    let batch = vec![
        Sample::new(6000.0)
            .with_timestamp(now - Duration::hours(2))
            .with_label("breakout"),
        Sample::new(40.0).with_timestamp(now - Duration::hours(1)),
        Sample::new(25.0).with_timestamp(now - Duration::hours(1)),
        Sample::new(5.0).with_timestamp(now - Duration::hours(1)),
        Sample::new(999.0), // undated, cannot be tiered
    ];
    let report = engine.classify_trends(&batch, &baseline);

    assert_eq!(report.viral, 1);
    assert_eq!(report.rising, 1);
    assert_eq!(report.stable, 1);
    assert_eq!(report.background, 1);
    assert_eq!(report.skipped, 1);

    let top = report.top.expect("batch has velocities");
    assert_eq!(top.tier, TrendTier::Viral);
    assert_eq!(top.label.as_deref(), Some("breakout"));
    assert!((top.velocity - 3000.0).abs() < 1e-9);
}
