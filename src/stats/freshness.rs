//! Freshness weighting and per-item velocity.
//!
//! Two complementary curves: an exponential half-life decay for long-range
//! aging and a cosine ramp that rewards items still inside the recency
//! window. Velocity divides magnitude by age with a floor so brand-new
//! items do not get absurd rates from near-zero denominators.

use chrono::{DateTime, Utc};

use crate::sample::Sample;

/// Default half-life for the exponential decay.
pub const DEFAULT_HALF_LIFE_HOURS: f64 = 24.0;
/// Default width of the cosine recency window.
pub const DEFAULT_RECENCY_WINDOW_HOURS: f64 = 72.0;
/// Default floor for the velocity denominator.
pub const DEFAULT_MIN_VELOCITY_HOURS: f64 = 1.0;
/// Default blend of decay vs. boost in [`combined_freshness`].
pub const DEFAULT_DECAY_WEIGHT: f64 = 0.6;
pub const DEFAULT_BOOST_WEIGHT: f64 = 0.4;

/// Exponential decay `0.5^(age/half_life)`; ages at or below zero score 1.0.
pub fn freshness_decay(age_hours: f64, half_life_hours: f64) -> f64 {
    if age_hours <= 0.0 || half_life_hours <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(age_hours / half_life_hours)
}

/// Cosine ramp from 1.0 (brand new) to 0.0 at the window edge and beyond.
pub fn recency_boost(age_hours: f64, window_hours: f64) -> f64 {
    if age_hours <= 0.0 {
        return 1.0;
    }
    if window_hours <= 0.0 || age_hours >= window_hours {
        return 0.0;
    }
    0.5 * (1.0 + (std::f64::consts::PI * age_hours / window_hours).cos())
}

/// Weighted blend of decay and boost, clamped to [0,1].
pub fn combined_freshness(
    age_hours: f64,
    half_life_hours: f64,
    window_hours: f64,
    decay_weight: f64,
    boost_weight: f64,
) -> f64 {
    let total = decay_weight + boost_weight;
    if total <= 0.0 {
        return 0.0;
    }
    let blended = decay_weight * freshness_decay(age_hours, half_life_hours)
        + boost_weight * recency_boost(age_hours, window_hours);
    (blended / total).clamp(0.0, 1.0)
}

/// Units per hour: `magnitude / max(min_hours, age_hours)`.
pub fn velocity(magnitude: f64, age_hours: f64, min_hours: f64) -> f64 {
    let floor = min_hours.max(1e-6);
    magnitude / age_hours.max(floor)
}

/// Velocity of a sample at `now`; `None` when the sample has no usable
/// timestamp (a null signal, not an error).
pub fn sample_velocity(sample: &Sample, now: DateTime<Utc>, min_hours: f64) -> Option<f64> {
    let age = sample.age_hours(now)?;
    Some(velocity(sample.magnitude, age, min_hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decay_hits_half_at_half_life() {
        assert!((freshness_decay(24.0, 24.0) - 0.5).abs() < 1e-12);
        assert!((freshness_decay(0.0, 24.0) - 1.0).abs() < 1e-12);
        assert!((freshness_decay(48.0, 24.0) - 0.25).abs() < 1e-12);
        assert_eq!(freshness_decay(-3.0, 24.0), 1.0);
    }

    #[test]
    fn boost_ramps_one_to_zero() {
        assert!((recency_boost(0.0, 72.0) - 1.0).abs() < 1e-12);
        assert!((recency_boost(36.0, 72.0) - 0.5).abs() < 1e-12);
        assert_eq!(recency_boost(72.0, 72.0), 0.0);
        assert_eq!(recency_boost(100.0, 72.0), 0.0);
    }

    #[test]
    fn blend_stays_in_unit_interval() {
        for age in [0.0, 6.0, 24.0, 72.0, 240.0] {
            let f = combined_freshness(age, 24.0, 72.0, 0.6, 0.4);
            assert!((0.0..=1.0).contains(&f), "blend out of range at {age}h");
        }
        // Fresh content blends to exactly 1.
        assert!((combined_freshness(0.0, 24.0, 72.0, 0.6, 0.4) - 1.0).abs() < 1e-12);
        // Degenerate weights yield 0 rather than NaN.
        assert_eq!(combined_freshness(1.0, 24.0, 72.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn velocity_floors_the_denominator() {
        // Half an hour old, floor of one hour: rate is per-hour, not doubled.
        assert!((velocity(1000.0, 0.5, 1.0) - 1000.0).abs() < 1e-12);
        assert!((velocity(1000.0, 4.0, 1.0) - 250.0).abs() < 1e-12);
    }

    #[test]
    fn sample_velocity_is_none_without_timestamp() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let dated = Sample::new(600.0).with_timestamp(now - chrono::Duration::hours(3));
        let undated = Sample::new(600.0);

        assert!((sample_velocity(&dated, now, 1.0).unwrap() - 200.0).abs() < 1e-9);
        assert!(sample_velocity(&undated, now, 1.0).is_none());
    }
}
