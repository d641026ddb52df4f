//! Standard-normal conversions between z-scores and percentiles.
//!
//! The forward direction uses the Abramowitz & Stegun 26.2.17 polynomial
//! (absolute error below 7.5e-8); the inverse uses Acklam's rational
//! approximation with its three tail/central branches. Inputs to the inverse
//! are clamped to [0.01%, 99.99%] so extreme percentiles map to large finite
//! z-scores instead of infinities.

/// Z-score of `value` against a distribution; 0.0 when the spread is zero.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Cumulative probability of the standard normal at `z`, as a percentile
/// in [0,100].
pub fn z_to_percentile(z: f64) -> f64 {
    phi(z) * 100.0
}

/// Standard normal CDF, Abramowitz & Stegun 26.2.17.
fn phi(z: f64) -> f64 {
    if z < 0.0 {
        return 1.0 - phi(-z);
    }

    const P: f64 = 0.231_641_9;
    const B1: f64 = 0.319_381_530;
    const B2: f64 = -0.356_563_782;
    const B3: f64 = 1.781_477_937;
    const B4: f64 = -1.821_255_978;
    const B5: f64 = 1.330_274_429;

    let t = 1.0 / (1.0 + P * z);
    let poly = t * (B1 + t * (B2 + t * (B3 + t * (B4 + t * B5))));
    let pdf = (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt();
    1.0 - pdf * poly
}

/// Inverse of [`z_to_percentile`]: the z-score whose CDF is `percentile`
/// (in [0,100]). The input is clamped to [0.01, 99.99] first.
pub fn percentile_to_z(percentile: f64) -> f64 {
    let p = (percentile / 100.0).clamp(0.000_1, 0.999_9);
    inverse_phi(p)
}

/// Acklam's inverse normal CDF. Three branches: lower tail, central
/// region, upper tail.
fn inverse_phi(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -((((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_score_handles_zero_spread() {
        assert_eq!(z_score(10.0, 5.0, 0.0), 0.0);
        assert_eq!(z_score(10.0, 5.0, -1.0), 0.0);
        assert!((z_score(10.0, 5.0, 2.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn known_cdf_values() {
        assert!((z_to_percentile(0.0) - 50.0).abs() < 1e-5);
        // Phi(1.0) = 0.8413447, Phi(-1.0) = 0.1586553.
        assert!((z_to_percentile(1.0) - 84.13447).abs() < 1e-3);
        assert!((z_to_percentile(-1.0) - 15.86553).abs() < 1e-3);
        // Phi(1.96) = 0.9750021.
        assert!((z_to_percentile(1.96) - 97.50021).abs() < 1e-3);
    }

    #[test]
    fn inverse_known_values() {
        assert!(percentile_to_z(50.0).abs() < 1e-8);
        assert!((percentile_to_z(97.5) - 1.959964).abs() < 1e-4);
        assert!((percentile_to_z(2.5) + 1.959964).abs() < 1e-4);
    }

    #[test]
    fn round_trip_within_tolerance() {
        let mut z = -3.0;
        while z <= 3.0 {
            let back = percentile_to_z(z_to_percentile(z));
            assert!(
                (back - z).abs() <= 1e-4,
                "round trip drifted at z={z}: got {back}"
            );
            z += 0.25;
        }
    }

    #[test]
    fn extreme_percentiles_clamp_to_finite_z() {
        let hi = percentile_to_z(100.0);
        let lo = percentile_to_z(0.0);
        assert!(hi.is_finite() && hi > 3.0);
        assert!(lo.is_finite() && lo < -3.0);
        // Symmetry of the clamped tails.
        assert!((hi + lo).abs() < 1e-9);
    }
}
