//! Mood classification
//!
//! Maps a compound sentiment score in [-1, 1] to a discrete mood bucket.
//! One threshold pair is applied at every call site.

use serde::{Deserialize, Serialize};

/// Scores at or above this are positive
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Scores at or below this are negative
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Discrete mood bucket derived from a compound sentiment score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Neutral,
    Negative,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Neutral => "neutral",
            Mood::Negative => "negative",
        }
    }

    /// Classify a compound sentiment score into a mood bucket
    pub fn classify(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            Mood::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            Mood::Negative
        } else {
            Mood::Neutral
        }
    }

    /// Classify an optional score; users without a recent journal entry
    /// default to neutral.
    pub fn classify_opt(compound: Option<f64>) -> Self {
        compound.map(Self::classify).unwrap_or(Mood::Neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_thresholds_are_inclusive() {
        assert_eq!(Mood::classify(POSITIVE_THRESHOLD), Mood::Positive);
        assert_eq!(Mood::classify(NEGATIVE_THRESHOLD), Mood::Negative);
    }

    #[test]
    fn test_just_inside_the_neutral_band() {
        assert_eq!(Mood::classify(0.049), Mood::Neutral);
        assert_eq!(Mood::classify(-0.049), Mood::Neutral);
        assert_eq!(Mood::classify(0.0), Mood::Neutral);
    }

    #[test]
    fn test_just_outside_the_neutral_band() {
        assert_eq!(Mood::classify(0.051), Mood::Positive);
        assert_eq!(Mood::classify(-0.051), Mood::Negative);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(Mood::classify(1.0), Mood::Positive);
        assert_eq!(Mood::classify(-1.0), Mood::Negative);
    }

    #[test]
    fn test_missing_score_defaults_to_neutral() {
        assert_eq!(Mood::classify_opt(None), Mood::Neutral);
        assert_eq!(Mood::classify_opt(Some(0.9)), Mood::Positive);
    }

    #[test]
    fn test_classification_is_pure() {
        for score in [-1.0, -0.5, -0.05, 0.0, 0.05, 0.5, 1.0] {
            assert_eq!(Mood::classify(score), Mood::classify(score));
        }
    }
}
