//! Cross-category calibration of raw magnitudes.
//!
//! A raw view count means nothing across categories of different scale, so
//! values are z-scored against the category's own distribution and squashed
//! through a logistic curve: the category median lands at 0.5 and two
//! standard deviations land near 0.88 / 0.12. Without a usable baseline the
//! normalizer falls back to a fixed linear scale instead of guessing.

/// Linear fallback scale when no baseline spread is available.
pub const FALLBACK_SCALE: f64 = 1_000_000.0;

/// Normalize `raw` to [0,1] against a category's mean and spread.
///
/// With `std_dev <= 0` (degenerate or missing baseline) the value is scaled
/// linearly by [`FALLBACK_SCALE`] and capped at 1.
pub fn normalize_raw(raw: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return (raw.max(0.0) / FALLBACK_SCALE).min(1.0);
    }
    let z = (raw - mean) / std_dev;
    1.0 / (1.0 + (-z).exp())
}

/// Composite difficulty of competing in a category, in [0,1].
///
/// Blend of three log10-scaled sub-scores: typical magnitude (weight 0.5,
/// scaled over 10k..1M), typical concurrent competition (0.25, 10..10k),
/// and typical audience size (0.25, 1k..1M).
pub fn category_difficulty(
    mean_magnitude: f64,
    mean_concurrency: f64,
    mean_audience: f64,
) -> f64 {
    let magnitude = log_scaled(mean_magnitude, 4.0, 6.0);
    let concurrency = log_scaled(mean_concurrency, 1.0, 4.0);
    let audience = log_scaled(mean_audience, 3.0, 6.0);
    0.5 * magnitude + 0.25 * concurrency + 0.25 * audience
}

/// Map `value` onto [0,1] by its log10 position inside `[lo, hi]`.
fn log_scaled(value: f64, lo_log10: f64, hi_log10: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    ((value.log10() - lo_log10) / (hi_log10 - lo_log10)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logistic_calibration_points() {
        // At the mean: 0.5. Two sigmas out: ~0.88 / ~0.12.
        assert!((normalize_raw(1000.0, 1000.0, 100.0) - 0.5).abs() < 1e-12);
        assert!((normalize_raw(1200.0, 1000.0, 100.0) - 0.8808).abs() < 1e-3);
        assert!((normalize_raw(800.0, 1000.0, 100.0) - 0.1192).abs() < 1e-3);
    }

    #[test]
    fn tighter_spread_rewards_the_same_raw_value() {
        let tight = normalize_raw(1200.0, 1000.0, 100.0);
        let loose = normalize_raw(1200.0, 1000.0, 400.0);
        assert!(tight > loose);
    }

    #[test]
    fn fallback_without_baseline_spread() {
        assert!((normalize_raw(500_000.0, 0.0, 0.0) - 0.5).abs() < 1e-12);
        assert_eq!(normalize_raw(2_000_000.0, 0.0, 0.0), 1.0);
        assert_eq!(normalize_raw(-10.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn difficulty_spans_the_unit_interval() {
        assert_eq!(category_difficulty(10_000.0, 10.0, 1_000.0), 0.0);
        assert!((category_difficulty(1_000_000.0, 10_000.0, 1_000_000.0) - 1.0).abs() < 1e-12);
        // Geometric midpoints of every range blend to 0.5.
        let mid = category_difficulty(100_000.0, 316.23, 31_623.0);
        assert!((mid - 0.5).abs() < 1e-3);
    }

    #[test]
    fn difficulty_is_monotonic_in_each_input() {
        let base = category_difficulty(50_000.0, 100.0, 10_000.0);
        assert!(category_difficulty(200_000.0, 100.0, 10_000.0) > base);
        assert!(category_difficulty(50_000.0, 1_000.0, 10_000.0) > base);
        assert!(category_difficulty(50_000.0, 100.0, 100_000.0) > base);
        // Zero or negative inputs contribute nothing instead of NaN.
        assert_eq!(category_difficulty(0.0, -5.0, 0.0), 0.0);
    }
}
