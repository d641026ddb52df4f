//! Dataset quality grading: is this category's data worth acting on?
//!
//! Two tiered sub-scores (sample size and staleness, 50 points each) sum
//! to a 0-100 grade with human-readable issues and recommendations, so a
//! caller can show "good, refresh soon" instead of a bare number. Unknown
//! fetch times are assumed 48 hours stale rather than fresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sample::{parse_timestamp, Sample};

/// Assumed staleness when the caller cannot say when data was fetched.
pub const DEFAULT_STALE_HOURS: f64 = 48.0;

/// When the data was fetched: already parsed, or a raw upstream string.
#[derive(Debug, Clone)]
pub enum FetchedAt {
    At(DateTime<Utc>),
    Iso(String),
}

impl From<DateTime<Utc>> for FetchedAt {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::At(dt)
    }
}

impl From<&str> for FetchedAt {
    fn from(raw: &str) -> Self {
        Self::Iso(raw.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Insufficient,
}

impl QualityLevel {
    fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::Excellent
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Fair
        } else if score >= 30.0 {
            Self::Poor
        } else {
            Self::Insufficient
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: f64,
    pub level: QualityLevel,
    pub is_usable: bool,
    pub sample_score: f64,
    pub freshness_score: f64,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Grade a dataset by size and staleness.
///
/// `fetched_at = None` (or an unparsable string) falls back to the
/// pessimistic [`DEFAULT_STALE_HOURS`].
pub fn assess_quality(
    samples: &[Sample],
    fetched_at: Option<FetchedAt>,
    now: DateTime<Utc>,
) -> QualityReport {
    let n = samples.len();
    let age_hours = resolve_age_hours(&fetched_at, now);

    let sample_score = sample_tier(n);
    let freshness_score = freshness_tier(age_hours);
    // Freshness alone cannot carry a near-empty dataset.
    let score = if n < 2 {
        sample_score
    } else {
        sample_score + freshness_score
    };

    let level = QualityLevel::from_score(score);
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    if n == 0 {
        issues.push("no samples available".to_string());
        recommendations.push("ingest data for this category before scoring".to_string());
    } else if n < 5 {
        issues.push(format!("only {n} samples available"));
        recommendations.push("collect more samples before trusting these scores".to_string());
    } else if n < 10 {
        issues.push(format!("small sample size ({n})"));
        recommendations.push("treat scores as directional until more data arrives".to_string());
    }

    if fetched_at.is_none() {
        issues.push(format!(
            "fetch time unknown, assuming {DEFAULT_STALE_HOURS:.0}h old"
        ));
        recommendations.push("record fetch timestamps alongside samples".to_string());
    } else if age_hours > 48.0 {
        issues.push(format!("data is {age_hours:.0} hours old"));
        recommendations.push("refresh category metrics".to_string());
    } else if age_hours > 24.0 {
        issues.push("data is older than one day".to_string());
    }

    QualityReport {
        score,
        level,
        is_usable: matches!(
            level,
            QualityLevel::Excellent | QualityLevel::Good | QualityLevel::Fair
        ),
        sample_score,
        freshness_score,
        issues,
        recommendations,
    }
}

fn resolve_age_hours(fetched_at: &Option<FetchedAt>, now: DateTime<Utc>) -> f64 {
    let parsed = match fetched_at {
        Some(FetchedAt::At(dt)) => Some(*dt),
        Some(FetchedAt::Iso(raw)) => parse_timestamp(raw),
        None => None,
    };
    match parsed {
        Some(dt) => ((now - dt).num_seconds().max(0) as f64) / 3600.0,
        None => DEFAULT_STALE_HOURS,
    }
}

/// 0-50 points by sample count tier.
fn sample_tier(n: usize) -> f64 {
    match n {
        n if n >= 30 => 50.0,
        n if n >= 20 => 40.0,
        n if n >= 10 => 30.0,
        n if n >= 5 => 20.0,
        n if n >= 2 => 10.0,
        _ => 0.0,
    }
}

/// 0-50 points by data age tier.
fn freshness_tier(age_hours: f64) -> f64 {
    if age_hours <= 6.0 {
        50.0
    } else if age_hours <= 12.0 {
        40.0
    } else if age_hours <= 24.0 {
        30.0
    } else if age_hours <= 48.0 {
        20.0
    } else if age_hours <= 72.0 {
        10.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn batch(n: usize) -> Vec<Sample> {
        (0..n).map(|i| Sample::new(100.0 + i as f64)).collect()
    }

    #[test]
    fn fresh_large_dataset_is_excellent() {
        let report = assess_quality(&batch(30), Some(now().into()), now());
        assert_eq!(report.score, 100.0);
        assert_eq!(report.level, QualityLevel::Excellent);
        assert!(report.is_usable);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn decent_dataset_is_fair_and_usable() {
        let fetched = now() - chrono::Duration::hours(36);
        let report = assess_quality(&batch(10), Some(fetched.into()), now());
        assert_eq!(report.score, 50.0);
        assert_eq!(report.level, QualityLevel::Fair);
        assert!(report.is_usable);
    }

    #[test]
    fn stale_tiny_dataset_is_not_usable() {
        let fetched = now() - chrono::Duration::hours(80);
        let report = assess_quality(&batch(3), Some(fetched.into()), now());
        assert_eq!(report.score, 10.0);
        assert_eq!(report.level, QualityLevel::Insufficient);
        assert!(!report.is_usable);
        assert!(!report.issues.is_empty());
        assert!(!report.recommendations.is_empty());
    }

    #[test]
    fn empty_dataset_is_insufficient_even_when_fresh() {
        let report = assess_quality(&[], Some(now().into()), now());
        assert_eq!(report.score, 0.0);
        assert_eq!(report.level, QualityLevel::Insufficient);
        assert!(!report.is_usable);
        assert!(report.issues.iter().any(|i| i.contains("no samples")));
    }

    #[test]
    fn single_fresh_sample_stays_insufficient() {
        // Freshness points alone must not lift a one-sample batch into a
        // usable grade.
        let report = assess_quality(&batch(1), Some(now().into()), now());
        assert_eq!(report.score, 0.0);
        assert_eq!(report.level, QualityLevel::Insufficient);
        assert!(!report.is_usable);
    }

    #[test]
    fn missing_fetch_time_assumes_48h() {
        let with_default = assess_quality(&batch(20), None, now());
        let at_48h = assess_quality(
            &batch(20),
            Some((now() - chrono::Duration::hours(48)).into()),
            now(),
        );
        assert_eq!(with_default.freshness_score, at_48h.freshness_score);
        assert!(with_default
            .issues
            .iter()
            .any(|i| i.contains("fetch time unknown")));
    }

    #[test]
    fn iso_string_fetch_time_is_accepted() {
        let report = assess_quality(
            &batch(20),
            Some("2025-03-01T09:00:00Z".into()),
            now(),
        );
        // Three hours old: full freshness tier.
        assert_eq!(report.freshness_score, 50.0);

        // Garbage falls back to the pessimistic default instead of erroring.
        let report = assess_quality(&batch(20), Some("???".into()), now());
        assert_eq!(report.freshness_score, 20.0);
    }
}
