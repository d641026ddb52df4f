//! Piecewise-linear scoring of a raw value against category percentiles.
//!
//! Maps the value's position among p25/p50/p75/p90 onto [0,100] with a
//! soft exponential cap above p90, so a 10x viral outlier lands near 100
//! without flattening the rest of the scale.

use serde::{Deserialize, Serialize};

/// Category percentile thresholds the scorer interpolates against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileThresholds {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl PercentileThresholds {
    pub fn new(p25: f64, p50: f64, p75: f64, p90: f64) -> Self {
        Self { p25, p50, p75, p90 }
    }
}

/// Score `value` in [0,100] against the thresholds.
///
/// Segments: [0,p25]→[0,25], [p25,p50]→[25,50], [p50,p75]→[50,75],
/// [p75,p90]→[75,90]; above p90 the score approaches 100 exponentially.
/// A collapsed segment snaps to its lower score bound. Thresholds with
/// `p90 <= 0` carry no signal and yield a neutral 50.
pub fn percentile_score(value: f64, t: &PercentileThresholds) -> f64 {
    if t.p90 <= 0.0 {
        return 50.0;
    }

    let value = value.max(0.0);
    if value <= t.p25 {
        segment(value, 0.0, t.p25, 0.0, 25.0)
    } else if value <= t.p50 {
        segment(value, t.p25, t.p50, 25.0, 50.0)
    } else if value <= t.p75 {
        segment(value, t.p50, t.p75, 50.0, 75.0)
    } else if value <= t.p90 {
        segment(value, t.p75, t.p90, 75.0, 90.0)
    } else {
        // Soft cap: halves the remaining distance to 100 roughly per p90 of excess.
        let excess = (value - t.p90) / t.p90.max(1.0);
        90.0 + 10.0 * (1.0 - (-excess).exp())
    }
}

/// Linear interpolation inside one segment; collapsed segments snap to
/// the lower score bound.
fn segment(value: f64, lo: f64, hi: f64, score_lo: f64, score_hi: f64) -> f64 {
    if hi <= lo {
        return score_lo;
    }
    score_lo + (value - lo) / (hi - lo) * (score_hi - score_lo)
}
