//! Additive confidence model over sample size, consistency, and freshness.
//!
//! The three terms ship 50 + 30 + 20 points: a logarithmic sample-size
//! curve (diminishing returns past a handful of samples), a linear payoff
//! for low variance, and a stepped freshness schedule. The total maps to
//! coarse levels so product surfaces can say "high confidence" without
//! re-deriving thresholds.

use serde::{Deserialize, Serialize};

/// Sample count at which the sample-size term saturates.
pub const DEFAULT_MAX_SAMPLES: usize = 30;

/// Coarse confidence bands over the 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Moderate,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::VeryHigh
        } else if score >= 70.0 {
            Self::High
        } else if score >= 50.0 {
            Self::Moderate
        } else if score >= 30.0 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub score: f64,
    pub level: ConfidenceLevel,
    pub is_reliable: bool,
}

/// Confidence scorer; `max_samples` is the saturation point of the
/// sample-size term.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceCalculator {
    max_samples: usize,
}

impl Default for ConfidenceCalculator {
    fn default() -> Self {
        Self {
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl ConfidenceCalculator {
    pub fn new(max_samples: usize) -> Self {
        Self {
            max_samples: max_samples.max(1),
        }
    }

    /// Score confidence for `sample_count` samples with the given normalized
    /// variance (in [0,1], clamped) and data age in hours.
    pub fn confidence(&self, sample_count: usize, variance: f64, age_hours: f64) -> ConfidenceResult {
        let score = self.sample_term(sample_count)
            + consistency_term(variance)
            + freshness_term(age_hours);
        let score = score.clamp(0.0, 100.0);

        ConfidenceResult {
            score,
            level: ConfidenceLevel::from_score(score),
            is_reliable: score >= 50.0,
        }
    }

    /// 0-50 points: `50 * ln(n+1) / ln(max+1)`, capped at `max_samples`.
    pub fn sample_term(&self, sample_count: usize) -> f64 {
        let n = sample_count.min(self.max_samples) as f64;
        let max = self.max_samples as f64;
        50.0 * (n + 1.0).ln() / (max + 1.0).ln()
    }
}

/// 0-30 points: full marks for zero variance, nothing at variance >= 1.
pub fn consistency_term(variance: f64) -> f64 {
    30.0 * (1.0 - variance.clamp(0.0, 1.0))
}

/// 0-20 points on a stepped schedule: 20 through 6h, then linear to 15 at
/// 24h, 5 at 72h, and 0 beyond 96h.
pub fn freshness_term(age_hours: f64) -> f64 {
    if age_hours <= 6.0 {
        20.0
    } else if age_hours <= 24.0 {
        lerp(age_hours, 6.0, 24.0, 20.0, 15.0)
    } else if age_hours <= 72.0 {
        lerp(age_hours, 24.0, 72.0, 15.0, 5.0)
    } else if age_hours <= 96.0 {
        lerp(age_hours, 72.0, 96.0, 5.0, 0.0)
    } else {
        0.0
    }
}

fn lerp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_case_is_exactly_100() {
        let calc = ConfidenceCalculator::default();
        let res = calc.confidence(30, 0.0, 0.0);
        assert!((res.score - 100.0).abs() < 1e-9);
        assert_eq!(res.level, ConfidenceLevel::VeryHigh);
        assert!(res.is_reliable);
    }

    #[test]
    fn worst_case_is_exactly_0() {
        let calc = ConfidenceCalculator::default();
        let res = calc.confidence(0, 1.0, 1000.0);
        assert_eq!(res.score, 0.0);
        assert_eq!(res.level, ConfidenceLevel::VeryLow);
        assert!(!res.is_reliable);
    }

    #[test]
    fn sample_term_saturates_at_max() {
        let calc = ConfidenceCalculator::default();
        assert!((calc.sample_term(30) - 50.0).abs() < 1e-9);
        assert!((calc.sample_term(500) - 50.0).abs() < 1e-9);
        assert_eq!(calc.sample_term(0), 0.0);
        // Diminishing returns: the first ten samples buy more than the next ten.
        let first = calc.sample_term(10);
        let second = calc.sample_term(20) - first;
        assert!(first > second);
    }

    #[test]
    fn freshness_schedule_band_edges() {
        assert_eq!(freshness_term(0.0), 20.0);
        assert_eq!(freshness_term(6.0), 20.0);
        assert!((freshness_term(24.0) - 15.0).abs() < 1e-9);
        assert!((freshness_term(48.0) - 10.0).abs() < 1e-9);
        assert!((freshness_term(72.0) - 5.0).abs() < 1e-9);
        assert!((freshness_term(96.0)).abs() < 1e-9);
        assert_eq!(freshness_term(200.0), 0.0);
    }

    #[test]
    fn variance_is_clamped() {
        assert_eq!(consistency_term(-0.5), 30.0);
        assert_eq!(consistency_term(2.0), 0.0);
        assert!((consistency_term(0.5) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn tighter_spread_scores_higher() {
        let calc = ConfidenceCalculator::default();
        let tight = calc.confidence(12, 0.05, 10.0);
        let loose = calc.confidence(12, 0.6, 10.0);
        assert!(tight.score > loose.score);
    }

    #[test]
    fn level_thresholds() {
        let calc = ConfidenceCalculator::default();
        // 15 samples, mild variance, same-day data: solidly reliable.
        let res = calc.confidence(15, 0.2, 12.0);
        assert!(res.score >= 50.0);
        assert!(res.is_reliable);

        // Two stale, noisy samples are not.
        let res = calc.confidence(2, 0.9, 90.0);
        assert!(res.score < 50.0);
        assert!(!res.is_reliable);
        assert!(matches!(
            res.level,
            ConfidenceLevel::Low | ConfidenceLevel::VeryLow
        ));
    }
}
