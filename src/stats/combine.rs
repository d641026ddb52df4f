//! Weighted combination of normalized signals into one score.
//!
//! The arithmetic combiner modulates each weight by the signal's own
//! confidence before renormalizing, so a shaky signal cannot drag the
//! blend as hard as a solid one, and reports per-signal contributions
//! that sum back to the final score. The harmonic variant punishes
//! imbalance: one weak signal pulls the blend down sharply.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::core::population_variance;

/// One named signal, already normalized to [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalInput {
    pub name: String,
    pub score: f64,
    pub weight: f64,
    /// Per-signal confidence in [0,1]; absent means "take at face value".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl SignalInput {
    pub fn new(name: impl Into<String>, score: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            score,
            weight,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    fn effective_weight(&self) -> f64 {
        match self.confidence {
            Some(c) => self.weight * c.clamp(0.0, 1.0),
            None => self.weight,
        }
    }
}

/// Result of a combination pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedScore {
    /// Blended score in [0,1].
    pub score: f64,
    /// Aggregate confidence in [0,100].
    pub confidence: u8,
    /// Per-signal share of the final score (arithmetic) or of the pull
    /// (harmonic); keys are signal names.
    pub contributions: HashMap<String, f64>,
}

impl CombinedScore {
    /// Neutral fallback for degenerate input (no usable weights).
    fn neutral() -> Self {
        Self {
            score: 0.0,
            confidence: 0,
            contributions: HashMap::new(),
        }
    }
}

/// Confidence-weighted arithmetic blend with per-signal attribution.
pub fn combine_scores_detailed(signals: &[SignalInput]) -> CombinedScore {
    let total: f64 = signals.iter().map(SignalInput::effective_weight).sum();
    if total <= 0.0 {
        warn!(
            signals = signals.len(),
            "combiner received no usable weights, returning neutral"
        );
        return CombinedScore::neutral();
    }

    let mut score = 0.0;
    let mut contributions = HashMap::with_capacity(signals.len());
    for s in signals {
        let share = s.effective_weight() / total * s.score.clamp(0.0, 1.0);
        score += share;
        contributions.insert(s.name.clone(), share);
    }

    CombinedScore {
        score: score.clamp(0.0, 1.0),
        confidence: aggregate_confidence(signals),
        contributions,
    }
}

/// Harmonic blend `sum(w) / sum(w/s)` over strictly positive signals.
/// With nothing left after filtering the result is the neutral zero.
pub fn combine_scores_harmonic(signals: &[SignalInput]) -> CombinedScore {
    let live: Vec<&SignalInput> = signals
        .iter()
        .filter(|s| s.score > 0.0 && s.weight > 0.0)
        .collect();
    let total: f64 = live.iter().map(|s| s.weight).sum();
    if live.is_empty() || total <= 0.0 {
        return CombinedScore::neutral();
    }

    let denom: f64 = live.iter().map(|s| s.weight / s.score.min(1.0)).sum();
    let score = (total / denom).clamp(0.0, 1.0);

    let mut contributions = HashMap::with_capacity(live.len());
    for s in &live {
        contributions.insert(s.name.clone(), s.weight / total);
    }

    let owned: Vec<SignalInput> = live.into_iter().cloned().collect();
    CombinedScore {
        score,
        confidence: aggregate_confidence(&owned),
        contributions,
    }
}

/// Aggregate confidence in [0,100]: the effective-weight-weighted average
/// of the supplied per-signal confidences, or score agreement
/// (`100 * (1 - variance)`) when no signal carries one.
fn aggregate_confidence(signals: &[SignalInput]) -> u8 {
    let with_conf: Vec<&SignalInput> = signals.iter().filter(|s| s.confidence.is_some()).collect();

    let value = if with_conf.is_empty() {
        let scores: Vec<f64> = signals.iter().map(|s| s.score.clamp(0.0, 1.0)).collect();
        100.0 * (1.0 - population_variance(&scores))
    } else {
        let weight_sum: f64 = with_conf.iter().map(|s| s.effective_weight()).sum();
        if weight_sum <= 0.0 {
            0.0
        } else {
            with_conf
                .iter()
                .map(|s| s.effective_weight() / weight_sum * s.confidence.unwrap_or(0.0))
                .sum::<f64>()
                * 100.0
        }
    };

    value.clamp(0.0, 100.0).round() as u8
}
