//! # Keyword engine
//! TF-IDF keyword and phrase extraction over a category's title corpus.
//!
//! The pipeline: filter titles that do not look English, collapse
//! near-duplicate re-uploads, rank by velocity, then score tokens with
//! rank-weighted frequency and smoothed IDF. A token is "trending" when
//! the items carrying it out-pace the category's p75 velocity, and
//! "significant" when its items clearly out-perform the corpus mean.
//! Thresholds here are deliberately fixed, not configurable; they were
//! tuned once against labelled corpora and every consumer relies on them
//! meaning the same thing.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sample::parse_timestamp;
use crate::stats::core::{mean, percentile};
use crate::stats::freshness::{velocity, DEFAULT_MIN_VELOCITY_HOURS};

/// Tokens and phrases must appear in at least this many titles.
pub const MIN_TERM_FREQUENCY: usize = 2;
/// Effect size a token must exceed to be significant.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.2;
/// Minimum titles behind a token before significance is considered.
pub const MIN_SIGNIFICANT_FREQUENCY: usize = 3;
/// Minimum token length in characters.
const MIN_TOKEN_LEN: usize = 3;
/// Phrase extraction only looks at this many top-ranked titles.
const PHRASE_TOP_ITEMS: usize = 20;
/// Cap on returned phrase signals.
const MAX_PHRASES: usize = 10;
/// Titles at least this similar are treated as re-uploads.
const DUPLICATE_SIMILARITY: f64 = 0.9;
/// Minimum share of ASCII letters for a title to count as English.
const MIN_ASCII_RATIO: f64 = 0.7;
/// Saturation point of the keyword confidence curve.
const CONFIDENCE_MAX_DOCS: f64 = 10.0;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").expect("token regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was",
        "one", "our", "out", "has", "him", "his", "how", "man", "new", "now", "old", "see",
        "two", "way", "who", "did", "get", "got", "let", "she", "too", "use", "that", "with",
        "have", "this", "will", "your", "from", "they", "know", "want", "been", "good", "much",
        "some", "time", "very", "when", "come", "here", "just", "like", "long", "make", "many",
        "more", "most", "only", "over", "such", "take", "than", "them", "then", "these",
        "what", "which", "while", "would", "there", "their", "about", "after", "before",
        "into", "other", "should", "could", "being", "where", "every", "because", "does",
        "doesn", "don", "its", "it's", "were", "why",
    ]
    .into_iter()
    .collect()
});

/// Phrases that mark a title as targeting another language even when its
/// script is ASCII.
static LANGUAGE_STOP_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "en vivo",
        "en directo",
        "ao vivo",
        "en direct",
        "sub espanol",
        "sub español",
        "legendado",
        "dublado",
        "po polsku",
        "auf deutsch",
    ]
});

/// One title with its performance context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleRecord {
    pub title: String,
    pub magnitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl TitleRecord {
    pub fn new(title: impl Into<String>, magnitude: f64) -> Self {
        Self {
            title: title.into(),
            magnitude,
            published_at: None,
        }
    }

    pub fn with_timestamp(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Lenient variant taking a raw timestamp string.
    pub fn from_parts(title: &str, magnitude: f64, published_at: Option<&str>) -> Self {
        Self {
            title: title.to_owned(),
            magnitude,
            published_at: published_at.and_then(parse_timestamp),
        }
    }
}

/// Extraction knobs that are safe to vary per call.
#[derive(Debug, Clone, Copy)]
pub struct KeywordParams {
    pub english_only: bool,
    pub max_keywords: usize,
    pub min_velocity_hours: f64,
}

impl Default for KeywordParams {
    fn default() -> Self {
        Self {
            english_only: true,
            max_keywords: 20,
            min_velocity_hours: DEFAULT_MIN_VELOCITY_HOURS,
        }
    }
}

/// One scored token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSignal {
    pub token: String,
    /// Titles containing the token.
    pub frequency: usize,
    /// Rank-weighted document frequency.
    pub weighted_frequency: f64,
    pub tf_idf: f64,
    pub avg_velocity: f64,
    /// Relative magnitude lift of titles carrying the token.
    pub effect_size: f64,
    /// 0-100, driven by document frequency.
    pub confidence: f64,
    pub is_trending: bool,
    pub is_significant: bool,
}

/// One scored two-word phrase from the top-ranked titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseSignal {
    pub phrase: String,
    pub frequency: usize,
    pub avg_velocity: f64,
}

/// Full result of one extraction pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    pub keywords: Vec<KeywordSignal>,
    pub phrases: Vec<PhraseSignal>,
    /// Titles that survived filtering and fed the statistics.
    pub corpus_size: usize,
    pub language_filtered: usize,
    pub duplicates_removed: usize,
}

impl KeywordAnalysis {
    fn empty(language_filtered: usize, duplicates_removed: usize) -> Self {
        Self {
            keywords: Vec::new(),
            phrases: Vec::new(),
            corpus_size: 0,
            language_filtered,
            duplicates_removed,
        }
    }
}

/// Ranked title after filtering, with its velocity and rank weight.
struct RankedTitle<'a> {
    record: &'a TitleRecord,
    tokens: Vec<String>,
    velocity: f64,
    weight: f64,
}

/// Stateless extractor; construct once with params and reuse.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordEngine {
    params: KeywordParams,
}

impl KeywordEngine {
    pub fn new(params: KeywordParams) -> Self {
        Self { params }
    }

    /// Run the full extraction over one category's corpus.
    pub fn analyze(&self, records: &[TitleRecord], now: DateTime<Utc>) -> KeywordAnalysis {
        // 1) Language filter.
        let (kept, language_filtered): (Vec<&TitleRecord>, usize) = if self.params.english_only {
            let kept: Vec<&TitleRecord> =
                records.iter().filter(|r| looks_english(&r.title)).collect();
            let dropped = records.len() - kept.len();
            (kept, dropped)
        } else {
            (records.iter().collect(), 0)
        };

        // 2) Collapse near-duplicate re-uploads and retitles.
        let (unique, duplicates_removed) = collapse_duplicates(kept);
        if unique.is_empty() {
            return KeywordAnalysis::empty(language_filtered, duplicates_removed);
        }

        // 3) Rank by velocity, weights decaying linearly 1.0 -> 0.5.
        let mut ranked: Vec<RankedTitle> = unique
            .into_iter()
            .map(|record| {
                let vel = record
                    .published_at
                    .map(|at| {
                        let age = ((now - at).num_seconds().max(0) as f64) / 3600.0;
                        velocity(record.magnitude, age, self.params.min_velocity_hours)
                    })
                    .unwrap_or(0.0);
                RankedTitle {
                    tokens: tokenize(&record.title),
                    record,
                    velocity: vel,
                    weight: 0.0,
                }
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.velocity
                .partial_cmp(&a.velocity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let n = ranked.len();
        for (i, item) in ranked.iter_mut().enumerate() {
            item.weight = rank_weight(i, n);
        }

        let corpus_velocities: Vec<f64> = ranked.iter().map(|r| r.velocity).collect();
        let velocity_p75 = percentile(&corpus_velocities, 75.0);
        let corpus_magnitudes: Vec<f64> = ranked.iter().map(|r| r.record.magnitude).collect();
        let corpus_mean = mean(&corpus_magnitudes);

        // 4) Token accounting, one count per title.
        let mut stats: HashMap<&str, TokenStats> = HashMap::new();
        for item in &ranked {
            let seen: HashSet<&str> = item.tokens.iter().map(String::as_str).collect();
            for token in seen {
                let entry = stats.entry(token).or_default();
                entry.frequency += 1;
                entry.weighted_frequency += item.weight;
                entry.velocity_sum += item.velocity;
                entry.magnitude_sum += item.record.magnitude;
            }
        }

        // 5) Score tokens: smoothed IDF, velocity, effect size.
        let mut keywords: Vec<KeywordSignal> = stats
            .into_iter()
            .filter(|(_, s)| s.frequency >= MIN_TERM_FREQUENCY)
            .map(|(token, s)| {
                let df = s.frequency as f64;
                let idf = ((n as f64 + 1.0) / (df + 1.0)).ln() + 1.0;
                let avg_velocity = s.velocity_sum / df;
                let token_mean = s.magnitude_sum / df;
                let effect_size = if corpus_mean > 0.0 {
                    (token_mean - corpus_mean) / corpus_mean
                } else {
                    0.0
                };
                KeywordSignal {
                    token: token.to_owned(),
                    frequency: s.frequency,
                    weighted_frequency: s.weighted_frequency,
                    tf_idf: s.weighted_frequency * idf,
                    avg_velocity,
                    effect_size,
                    confidence: doc_confidence(s.frequency),
                    is_trending: avg_velocity > velocity_p75,
                    is_significant: effect_size > SIGNIFICANCE_THRESHOLD
                        && s.frequency >= MIN_SIGNIFICANT_FREQUENCY,
                }
            })
            .collect();
        keywords.sort_by(|a, b| {
            b.tf_idf
                .partial_cmp(&a.tf_idf)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.token.cmp(&b.token))
        });
        keywords.truncate(self.params.max_keywords);

        // 6) Bigrams from the top-ranked subset only.
        let phrases = extract_phrases(&ranked[..n.min(PHRASE_TOP_ITEMS)]);

        let analysis = KeywordAnalysis {
            keywords,
            phrases,
            corpus_size: n,
            language_filtered,
            duplicates_removed,
        };
        dev_log_keywords(records, &analysis);
        analysis
    }
}

#[derive(Default)]
struct TokenStats {
    frequency: usize,
    weighted_frequency: f64,
    velocity_sum: f64,
    magnitude_sum: f64,
}

/// Linear rank weight: 1.0 for the top item down to 0.5 for the last.
fn rank_weight(index: usize, total: usize) -> f64 {
    if total <= 1 {
        return 1.0;
    }
    1.0 - 0.5 * index as f64 / (total - 1) as f64
}

/// 0-100 confidence from document frequency, saturating at 10 titles.
fn doc_confidence(frequency: usize) -> f64 {
    let capped = (frequency as f64).min(CONFIDENCE_MAX_DOCS);
    (100.0 * (capped + 1.0).ln() / (CONFIDENCE_MAX_DOCS + 1.0).ln()).min(100.0)
}

/// Lowercased alphabetic word sequence of a title, in order, stop words
/// retained. The phrase pass needs true adjacency, so it works on this.
fn raw_words(title: &str) -> Vec<String> {
    let lower = title.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Lowercased alphabetic tokens of at least [`MIN_TOKEN_LEN`] chars,
/// minus stop words.
fn tokenize(title: &str) -> Vec<String> {
    raw_words(title)
        .into_iter()
        .filter(|t| phrase_word(t))
        .collect()
}

/// Whether a word can sit at either end of a phrase: long enough for a
/// token and not a stop word.
fn phrase_word(word: &str) -> bool {
    word.len() >= MIN_TOKEN_LEN && !STOP_WORDS.contains(word)
}

/// Heuristic English check: mostly ASCII letters and no foreign-language
/// marker phrase.
fn looks_english(title: &str) -> bool {
    let lower = title.to_lowercase();
    if LANGUAGE_STOP_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }

    let mut alpha = 0usize;
    let mut ascii_alpha = 0usize;
    for c in title.chars() {
        if c.is_alphabetic() {
            alpha += 1;
            if c.is_ascii_alphabetic() {
                ascii_alpha += 1;
            }
        }
    }
    if alpha == 0 {
        return false;
    }
    ascii_alpha as f64 / alpha as f64 >= MIN_ASCII_RATIO
}

/// Drop titles nearly identical to one already kept (re-uploads, A/B
/// retitles). Order-preserving, first occurrence wins.
fn collapse_duplicates(records: Vec<&TitleRecord>) -> (Vec<&TitleRecord>, usize) {
    let mut kept: Vec<&TitleRecord> = Vec::with_capacity(records.len());
    let mut kept_lower: Vec<String> = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        let lower = record.title.to_lowercase();
        let duplicate = kept_lower
            .iter()
            .any(|k| strsim::normalized_levenshtein(k, &lower) >= DUPLICATE_SIMILARITY);
        if duplicate {
            dropped += 1;
        } else {
            kept.push(record);
            kept_lower.push(lower);
        }
    }
    (kept, dropped)
}

/// Two-word phrases over the given ranked titles: adjacent pairs of the
/// raw word sequence, counted once per title, kept at
/// [`MIN_TERM_FREQUENCY`]+ occurrences. A candidate with a stop word (or
/// a too-short word) at either end is discarded, so words separated by a
/// stop word in the title never fuse into a phrase.
fn extract_phrases(top: &[RankedTitle]) -> Vec<PhraseSignal> {
    let mut counts: HashMap<String, (usize, f64)> = HashMap::new();
    for item in top {
        let words = raw_words(&item.record.title);
        let mut seen: HashSet<String> = HashSet::new();
        for pair in words.windows(2) {
            if !phrase_word(&pair[0]) || !phrase_word(&pair[1]) {
                continue;
            }
            let phrase = format!("{} {}", pair[0], pair[1]);
            if seen.insert(phrase.clone()) {
                let entry = counts.entry(phrase).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += item.velocity;
            }
        }
    }

    let mut phrases: Vec<PhraseSignal> = counts
        .into_iter()
        .filter(|(_, (freq, _))| *freq >= MIN_TERM_FREQUENCY)
        .map(|(phrase, (frequency, velocity_sum))| PhraseSignal {
            phrase,
            frequency,
            avg_velocity: velocity_sum / frequency as f64,
        })
        .collect();
    phrases.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| {
                b.avg_velocity
                    .partial_cmp(&a.avg_velocity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.phrase.cmp(&b.phrase))
    });
    phrases.truncate(MAX_PHRASES);
    phrases
}

// Dev logging gate: SIGNAL_DEV_LOG=1 AND a dev environment (debug build or
// APP_ENV in {local,development,dev}).
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("SIGNAL_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("APP_ENV").unwrap_or_default().as_str(),
        "local" | "development" | "dev"
    )
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Anonymized dev logger: hashed corpus id and counts, never raw titles.
fn dev_log_keywords(records: &[TitleRecord], analysis: &KeywordAnalysis) {
    if !dev_logging_enabled() {
        return;
    }
    let joined: String = records.iter().map(|r| r.title.as_str()).collect();
    let id = anon_hash(&joined);
    let top: Vec<&str> = analysis
        .keywords
        .iter()
        .take(5)
        .map(|k| k.token.as_str())
        .collect();
    info!(
        target: "keywords",
        %id,
        corpus = analysis.corpus_size,
        filtered = analysis.language_filtered,
        duplicates = analysis.duplicates_removed,
        ?top,
        "keywords analyzed"
    );
}
