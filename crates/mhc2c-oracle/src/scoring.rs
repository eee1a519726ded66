//! Heuristic scoring oracles
//!
//! Cheap, deterministic scores for demos and offline runs. Sentences are the
//! segments between periods, words are whitespace-separated tokens.

use async_trait::async_trait;
use mhc2c_core::{OracleError, ScoringOracle};
use std::collections::HashSet;

/// Phrases that mark an answer as factually suspect
pub const FALSE_INDICATORS: [&str; 3] = ["aliens built", "flat earth", "vaccines cause"];

/// Penalty per false indicator found
pub const FALSE_INDICATOR_PENALTY: f64 = 0.3;

/// Jaccard similarity of the lowercased word sets; 0 when both are empty
#[must_use]
pub fn word_overlap(text: &str, ground_truth: &str) -> f64 {
    let words = |s: &str| -> HashSet<String> { s.split_whitespace().map(str::to_lowercase).collect() };
    let ours = words(text);
    let theirs = words(ground_truth);
    let union = ours.union(&theirs).count();
    if union == 0 {
        return 0.0;
    }
    ours.intersection(&theirs).count() as f64 / union as f64
}

/// Mean words per sentence over 20, capped at 1
#[must_use]
pub fn complexity(text: &str) -> f64 {
    let sentences: Vec<&str> = text.split('.').collect();
    let words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
    (words as f64 / sentences.len() as f64 / 20.0).min(1.0)
}

/// `1 - 0.3` per false indicator present
#[must_use]
pub fn factuality(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let hits = FALSE_INDICATORS
        .iter()
        .filter(|indicator| lowered.contains(*indicator))
        .count();
    1.0 - hits as f64 * FALSE_INDICATOR_PENALTY
}

/// Shorter sentences read better: `(30 - words/sentence) / 30` clamped to `[0, 1]`
#[must_use]
pub fn readability(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    if words == 0 {
        return 0.0;
    }
    let sentences = text.split('.').count();
    ((30.0 - words as f64 / sentences as f64) / 30.0).clamp(0.0, 1.0)
}

/// Weighted mean of readability, complexity and factuality, plus accuracy
/// when a ground truth is given
#[must_use]
pub fn composite(text: &str, ground_truth: Option<&str>) -> f64 {
    let mut parts = vec![
        readability(text) * 0.3,
        complexity(text) * 0.3,
        factuality(text) * 0.4,
    ];
    if let Some(truth) = ground_truth.filter(|t| !t.is_empty()) {
        parts.push(word_overlap(text, truth) * 0.5);
    }
    parts.iter().sum::<f64>() / parts.len() as f64
}

/// Negative character count
#[derive(Debug, Clone, Copy, Default)]
pub struct Brevity;

/// Word overlap with a reference answer
#[derive(Debug, Clone)]
pub struct WordOverlap {
    pub ground_truth: String,
}

impl WordOverlap {
    #[must_use]
    pub fn new(ground_truth: impl Into<String>) -> Self {
        Self {
            ground_truth: ground_truth.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Readability;

#[derive(Debug, Clone, Copy, Default)]
pub struct Complexity;

#[derive(Debug, Clone, Copy, Default)]
pub struct Factuality;

/// See [`composite`]
#[derive(Debug, Clone, Default)]
pub struct Composite {
    pub ground_truth: Option<String>,
}

impl Composite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ground_truth(mut self, truth: impl Into<String>) -> Self {
        self.ground_truth = Some(truth.into());
        self
    }
}

#[async_trait]
impl ScoringOracle for Brevity {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        Ok(-(text.chars().count() as f64))
    }
}

#[async_trait]
impl ScoringOracle for WordOverlap {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        Ok(word_overlap(text, &self.ground_truth))
    }
}

#[async_trait]
impl ScoringOracle for Readability {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        Ok(readability(text))
    }
}

#[async_trait]
impl ScoringOracle for Complexity {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        Ok(complexity(text))
    }
}

#[async_trait]
impl ScoringOracle for Factuality {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        Ok(factuality(text))
    }
}

#[async_trait]
impl ScoringOracle for Composite {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        Ok(composite(text, self.ground_truth.as_deref()))
    }
}
