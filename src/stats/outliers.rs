//! Outlier removal for heavy-tailed magnitude data.
//!
//! Two interchangeable filters: Tukey fences over the interquartile range
//! (default) and a median-absolute-deviation filter for the rare callers
//! that want robustness against extreme skew. Both are conservative no-ops
//! on tiny or degenerate inputs so a viral sample in a batch of three never
//! erases the batch.

use serde::Serialize;

use super::core::percentile;

/// Default Tukey multiplier for the IQR fences.
pub const DEFAULT_IQR_K: f64 = 1.5;
/// Default multiplier for the MAD filter.
pub const DEFAULT_MAD_K: f64 = 3.0;
/// Scale factor making MAD a consistent estimator of sigma under normality.
pub const MAD_CONSISTENCY: f64 = 1.4826;

/// Smallest input the filters will touch.
const MIN_FILTER_SAMPLES: usize = 4;

/// Accepted band used by a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Split of one filter pass. `bounds` is `None` when the filter declined to
/// run (fewer than four samples, or zero spread).
#[derive(Debug, Clone, Serialize)]
pub struct OutlierResult {
    pub clean: Vec<f64>,
    pub outliers: Vec<f64>,
    pub bounds: Option<OutlierBounds>,
}

impl OutlierResult {
    fn untouched(values: &[f64]) -> Self {
        Self {
            clean: values.to_vec(),
            outliers: Vec::new(),
            bounds: None,
        }
    }

    fn split(values: &[f64], bounds: OutlierBounds) -> Self {
        let (clean, outliers) = values
            .iter()
            .partition(|&&v| v >= bounds.lower && v <= bounds.upper);
        Self {
            clean,
            outliers,
            bounds: Some(bounds),
        }
    }
}

/// Tukey-fence filter: accepts `[q1 - k*iqr, q3 + k*iqr]`.
pub fn remove_outliers_iqr(values: &[f64], k: f64) -> OutlierResult {
    if values.len() < MIN_FILTER_SAMPLES {
        return OutlierResult::untouched(values);
    }

    let q1 = percentile(values, 25.0);
    let q3 = percentile(values, 75.0);
    let iqr = q3 - q1;
    if iqr <= 0.0 {
        return OutlierResult::untouched(values);
    }

    OutlierResult::split(
        values,
        OutlierBounds {
            lower: q1 - k * iqr,
            upper: q3 + k * iqr,
        },
    )
}

/// MAD filter: accepts `median ± k * (mad * 1.4826)`.
pub fn remove_outliers_mad(values: &[f64], k: f64) -> OutlierResult {
    if values.len() < MIN_FILTER_SAMPLES {
        return OutlierResult::untouched(values);
    }

    let med = percentile(values, 50.0);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let mad = percentile(&deviations, 50.0);
    if mad <= 0.0 {
        return OutlierResult::untouched(values);
    }

    let spread = k * mad * MAD_CONSISTENCY;
    OutlierResult::split(
        values,
        OutlierBounds {
            lower: med - spread,
            upper: med + spread,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::core::mean;

    #[test]
    fn iqr_drops_the_viral_spike() {
        let views = [100.0, 120.0, 110.0, 105.0, 10_000.0];
        let res = remove_outliers_iqr(&views, DEFAULT_IQR_K);

        assert_eq!(res.outliers, vec![10_000.0]);
        assert_eq!(res.clean.len(), 4);
        assert!((mean(&res.clean) - 108.75).abs() < 1e-12);

        let bounds = res.bounds.unwrap();
        assert!(bounds.lower < 100.0 && bounds.upper < 10_000.0);
    }

    #[test]
    fn second_pass_removes_nothing_more() {
        let views = [100.0, 120.0, 110.0, 105.0, 10_000.0];
        let first = remove_outliers_iqr(&views, DEFAULT_IQR_K);
        let second = remove_outliers_iqr(&first.clean, DEFAULT_IQR_K);

        assert!(second.outliers.len() <= first.outliers.len());
        assert!(second.outliers.is_empty());
        assert_eq!(second.clean, first.clean);
    }

    #[test]
    fn tiny_input_is_untouched() {
        let views = [1.0, 2.0, 500_000.0];
        let res = remove_outliers_iqr(&views, DEFAULT_IQR_K);
        assert_eq!(res.clean, views.to_vec());
        assert!(res.outliers.is_empty());
        assert!(res.bounds.is_none());
    }

    #[test]
    fn zero_spread_is_untouched() {
        let flat = [50.0, 50.0, 50.0, 50.0, 50.0];
        let res = remove_outliers_iqr(&flat, DEFAULT_IQR_K);
        assert_eq!(res.clean.len(), 5);
        assert!(res.bounds.is_none());

        // MAD can be zero even when values differ; the guard must hold there too.
        let mostly_flat = [5.0, 5.0, 5.0, 5.0, 100.0];
        let res = remove_outliers_mad(&mostly_flat, DEFAULT_MAD_K);
        assert_eq!(res.clean.len(), 5);
        assert!(res.bounds.is_none());
    }

    #[test]
    fn mad_catches_the_same_spike() {
        let views = [100.0, 120.0, 110.0, 105.0, 95.0, 10_000.0];
        let res = remove_outliers_mad(&views, DEFAULT_MAD_K);
        assert_eq!(res.outliers, vec![10_000.0]);
        assert_eq!(res.clean.len(), 5);
    }

    #[test]
    fn symmetric_bounds_around_median() {
        let views = [10.0, 20.0, 30.0, 40.0, 50.0];
        let res = remove_outliers_mad(&views, DEFAULT_MAD_K);
        let b = res.bounds.unwrap();
        let med = 30.0;
        assert!(((med - b.lower) - (b.upper - med)).abs() < 1e-9);
    }
}
