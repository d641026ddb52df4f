//! # Sample
//! Input record for the scoring pipeline: one observed piece of content.
//!
//! Upstream metadata is unreliable (third-party APIs, scraped feeds), so the
//! constructors are lenient: a timestamp that does not parse becomes `None`
//! and the sample is later skipped where a timestamp is required, never
//! turned into an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One performance observation for a piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Primary magnitude (view count or equivalent).
    pub magnitude: f64,
    /// Publication instant, if known and parseable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Engagement rate in [0,1], if the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement_rate: Option<f64>,
    /// Free-form label (title or id), used only for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Sample {
    pub fn new(magnitude: f64) -> Self {
        Self {
            magnitude,
            published_at: None,
            engagement_rate: None,
            label: None,
        }
    }

    pub fn with_timestamp(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    pub fn with_engagement(mut self, rate: f64) -> Self {
        self.engagement_rate = Some(rate);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Lenient constructor from raw upstream fields. A malformed timestamp
    /// yields `published_at = None`; it never fails the batch.
    pub fn from_parts(
        magnitude: f64,
        published_at: Option<&str>,
        engagement_rate: Option<f64>,
        label: Option<&str>,
    ) -> Self {
        Self {
            magnitude,
            published_at: published_at.and_then(parse_timestamp),
            engagement_rate,
            label: label.map(str::to_owned),
        }
    }

    /// Hours since publication, negative values clamped to zero.
    /// `None` when the sample carries no usable timestamp.
    pub fn age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        let published = self.published_at?;
        let secs = (now - published).num_seconds();
        Some((secs.max(0) as f64) / 3600.0)
    }

    /// Whether the sample can feed baseline statistics: finite non-negative
    /// magnitude and a known publication time.
    pub fn is_usable(&self) -> bool {
        self.magnitude.is_finite() && self.magnitude >= 0.0 && self.published_at.is_some()
    }
}

/// Parse an ISO-8601-ish timestamp from upstream metadata.
///
/// Accepts RFC 3339 (with offset or `Z`), a naive `YYYY-MM-DDTHH:MM:SS[.f]`,
/// its space-separated variant, and a bare date. Naive forms are taken as
/// UTC. Anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}
