//! # Statistics pipeline
//! Pure numerical building blocks: descriptive stats, outlier filters,
//! normal-distribution conversions, scoring curves, confidence and quality
//! grading, signal combination, and cross-category normalization.
//!
//! Everything in here is synchronous, total, and side-effect free; dirty
//! input degrades to documented defaults instead of panicking or erroring.

pub mod combine;
pub mod confidence;
pub mod core;
pub mod freshness;
pub mod normal;
pub mod normalize;
pub mod outliers;
pub mod percentile_score;
pub mod quality;

pub use combine::{combine_scores_detailed, combine_scores_harmonic, CombinedScore, SignalInput};
pub use confidence::{ConfidenceCalculator, ConfidenceLevel, ConfidenceResult};
pub use outliers::{remove_outliers_iqr, remove_outliers_mad, OutlierBounds, OutlierResult};
pub use percentile_score::{percentile_score, PercentileThresholds};
pub use quality::{assess_quality, FetchedAt, QualityLevel, QualityReport};
