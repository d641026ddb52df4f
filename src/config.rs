//! # Config
//! Engine tunables, loadable from TOML with per-field defaults.
//!
//! Every default equals the engine's documented constant, so an empty file,
//! a partial file, and no file at all are all valid configurations. Invalid
//! values are sanitized back to defaults with a warning; configuration can
//! degrade scoring quality but never break it.

use std::{env, fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::stats::confidence::DEFAULT_MAX_SAMPLES;
use crate::stats::freshness::{
    DEFAULT_BOOST_WEIGHT, DEFAULT_DECAY_WEIGHT, DEFAULT_HALF_LIFE_HOURS,
    DEFAULT_MIN_VELOCITY_HOURS, DEFAULT_RECENCY_WINDOW_HOURS,
};
use crate::stats::outliers::{DEFAULT_IQR_K, DEFAULT_MAD_K};

/// Env var holding an alternative config path.
pub const CONFIG_PATH_ENV: &str = "SIGNAL_ENGINE_CONFIG_PATH";
/// Default on-disk location, loaded when present.
pub const DEFAULT_CONFIG_PATH: &str = "config/signal-engine.toml";

fn default_iqr_k() -> f64 {
    DEFAULT_IQR_K
}
fn default_mad_k() -> f64 {
    DEFAULT_MAD_K
}
fn default_half_life() -> f64 {
    DEFAULT_HALF_LIFE_HOURS
}
fn default_recency_window() -> f64 {
    DEFAULT_RECENCY_WINDOW_HOURS
}
fn default_decay_weight() -> f64 {
    DEFAULT_DECAY_WEIGHT
}
fn default_boost_weight() -> f64 {
    DEFAULT_BOOST_WEIGHT
}
fn default_min_velocity_hours() -> f64 {
    DEFAULT_MIN_VELOCITY_HOURS
}
fn default_max_samples() -> usize {
    DEFAULT_MAX_SAMPLES
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_namespace() -> String {
    "baseline".to_string()
}
fn default_english_only() -> bool {
    true
}
fn default_max_keywords() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierSection {
    /// Tukey multiplier for IQR fences.
    #[serde(default = "default_iqr_k")]
    pub iqr_k: f64,
    /// Multiplier for the MAD filter.
    #[serde(default = "default_mad_k")]
    pub mad_k: f64,
}

impl Default for OutlierSection {
    fn default() -> Self {
        Self {
            iqr_k: default_iqr_k(),
            mad_k: default_mad_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshnessSection {
    #[serde(default = "default_half_life")]
    pub half_life_hours: f64,
    #[serde(default = "default_recency_window")]
    pub recency_window_hours: f64,
    #[serde(default = "default_decay_weight")]
    pub decay_weight: f64,
    #[serde(default = "default_boost_weight")]
    pub boost_weight: f64,
    /// Floor for the velocity denominator.
    #[serde(default = "default_min_velocity_hours")]
    pub min_velocity_hours: f64,
}

impl Default for FreshnessSection {
    fn default() -> Self {
        Self {
            half_life_hours: default_half_life(),
            recency_window_hours: default_recency_window(),
            decay_weight: default_decay_weight(),
            boost_weight: default_boost_weight(),
            min_velocity_hours: default_min_velocity_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceSection {
    /// Sample count where the sample-size term saturates.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

impl Default for ConfidenceSection {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Key prefix: entries are stored as `{namespace}:{category}`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSection {
    /// Drop titles that do not look English before ranking.
    #[serde(default = "default_english_only")]
    pub english_only: bool,
    /// Cap on returned keyword signals.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
}

impl Default for KeywordSection {
    fn default() -> Self {
        Self {
            english_only: default_english_only(),
            max_keywords: default_max_keywords(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub outliers: OutlierSection,
    #[serde(default)]
    pub freshness: FreshnessSection,
    #[serde(default)]
    pub confidence: ConfidenceSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub keywords: KeywordSection,
}

impl EngineConfig {
    /// Parse TOML; on any parse error, warn and fall back to defaults.
    pub fn from_toml(raw: &str) -> Self {
        match toml::from_str::<Self>(raw) {
            Ok(cfg) => cfg.sanitized(),
            Err(e) => {
                warn!(error = %e, "invalid engine config, using defaults");
                Self::default()
            }
        }
    }

    /// Load from an explicit path; I/O and parse errors propagate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let cfg: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Resolve config the usual way: `SIGNAL_ENGINE_CONFIG_PATH` if set,
    /// then the default path if it exists, else built-in defaults. Never
    /// fails; broken files degrade to defaults with a warning.
    pub fn load() -> Self {
        let path = env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if !Path::new(&path).exists() {
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = ?e, path, "failed to load engine config, using defaults");
                Self::default()
            }
        }
    }

    /// Clamp out-of-range values back to defaults.
    fn sanitized(mut self) -> Self {
        fn positive(v: f64) -> bool {
            v.is_finite() && v > 0.0
        }
        fn weight_ok(v: f64) -> bool {
            v.is_finite() && v >= 0.0
        }

        let mut fixed: Vec<&str> = Vec::new();
        if !positive(self.outliers.iqr_k) {
            self.outliers.iqr_k = default_iqr_k();
            fixed.push("outliers.iqr_k");
        }
        if !positive(self.outliers.mad_k) {
            self.outliers.mad_k = default_mad_k();
            fixed.push("outliers.mad_k");
        }
        if !positive(self.freshness.half_life_hours) {
            self.freshness.half_life_hours = default_half_life();
            fixed.push("freshness.half_life_hours");
        }
        if !positive(self.freshness.recency_window_hours) {
            self.freshness.recency_window_hours = default_recency_window();
            fixed.push("freshness.recency_window_hours");
        }
        if !weight_ok(self.freshness.decay_weight) {
            self.freshness.decay_weight = default_decay_weight();
            fixed.push("freshness.decay_weight");
        }
        if !weight_ok(self.freshness.boost_weight) {
            self.freshness.boost_weight = default_boost_weight();
            fixed.push("freshness.boost_weight");
        }
        // A single weight may be zero, but not both.
        if self.freshness.decay_weight + self.freshness.boost_weight <= 0.0 {
            self.freshness.decay_weight = default_decay_weight();
            self.freshness.boost_weight = default_boost_weight();
            fixed.push("freshness.weights");
        }
        if !positive(self.freshness.min_velocity_hours) {
            self.freshness.min_velocity_hours = default_min_velocity_hours();
            fixed.push("freshness.min_velocity_hours");
        }
        if self.confidence.max_samples == 0 {
            self.confidence.max_samples = default_max_samples();
            fixed.push("confidence.max_samples");
        }
        if self.cache.ttl_secs == 0 {
            self.cache.ttl_secs = default_ttl_secs();
            fixed.push("cache.ttl_secs");
        }
        if self.cache.namespace.trim().is_empty() {
            self.cache.namespace = default_namespace();
            fixed.push("cache.namespace");
        }
        if self.keywords.max_keywords == 0 {
            self.keywords.max_keywords = default_max_keywords();
            fixed.push("keywords.max_keywords");
        }

        if !fixed.is_empty() {
            warn!(fields = ?fixed, "sanitized out-of-range engine config values");
        }
        self
    }
}
