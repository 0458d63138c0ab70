//! Sentiment scoring boundary
//!
//! Polarity scoring of raw text is upstream of this crate; the pipeline only
//! consumes a compound score in [-1, 1]. This module defines that seam as a
//! trait plus a small lexicon-based reference scorer so the request boundary
//! and tests have a concrete implementation to stand in for the real one.

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// VADER-shaped polarity breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Overall polarity in [-1, 1]
    pub compound: f64,
    /// Fraction of positive tokens
    pub pos: f64,
    /// Fraction of negative tokens
    pub neg: f64,
    /// Fraction of neutral tokens
    pub neu: f64,
}

/// Upstream sentiment scorer seam
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<SentimentScore, AnalyticsError>;
}

const POSITIVE_WORDS: [&str; 14] = [
    "good", "great", "excellent", "love", "amazing", "wonderful", "happy", "fantastic",
    "awesome", "best", "calm", "grateful", "excited", "hopeful",
];

const NEGATIVE_WORDS: [&str; 14] = [
    "bad", "terrible", "awful", "hate", "horrible", "worst", "sad", "angry", "disappointed",
    "poor", "lonely", "worried", "anxious", "tired",
];

/// Word-list scorer. Not a serious polarity model; it exists so the boundary
/// works end to end without an external service.
#[derive(Debug, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<SentimentScore, AnalyticsError> {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|t| {
                t.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return Ok(SentimentScore {
                compound: 0.0,
                pos: 0.0,
                neg: 0.0,
                neu: 1.0,
            });
        }

        let total = tokens.len() as f64;
        let positive = tokens
            .iter()
            .filter(|t| POSITIVE_WORDS.contains(&t.as_str()))
            .count() as f64;
        let negative = tokens
            .iter()
            .filter(|t| NEGATIVE_WORDS.contains(&t.as_str()))
            .count() as f64;

        let hits = positive + negative;
        let compound = if hits == 0.0 {
            0.0
        } else {
            (positive - negative) / hits * (hits / total).sqrt()
        };

        Ok(SentimentScore {
            compound: compound.clamp(-1.0, 1.0),
            pos: positive / total,
            neg: negative / total,
            neu: (total - hits) / total,
        })
    }
}
