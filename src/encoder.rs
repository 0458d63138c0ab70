//! Feature encoding
//!
//! This module turns raw journal records into fixed-width numeric feature
//! rows for the outlier model:
//! - Canonical one-hot emotion encoding (versioned vocabulary)
//! - Batch-mean sentiment imputation
//! - Date filtering (unparseable and future-dated records excluded)
//! - Chronological ordering and `sentiment_change` derivation

use chrono::{DateTime, NaiveDate, Utc};
use ndarray::Array2;
use tracing::debug;

use crate::error::AnalyticsError;
use crate::types::{EncodedFeatureRow, JournalRecord};

/// Version of the canonical emotion vocabulary below. Bump when the set
/// changes so persisted feature rows stay interpretable.
pub const VOCABULARY_VERSION: &str = "1.0.0";

/// Sentinel category for missing or unrecognized emotion labels
pub const UNKNOWN_EMOTION: &str = "unknown";

/// Canonical emotion vocabulary shared by every batch. The encoder folds
/// labels outside this set into [`UNKNOWN_EMOTION`], so feature width never
/// depends on the input batch.
pub const EMOTION_VOCABULARY: [&str; 13] = [
    "happy", "excited", "grateful", "calm", "bored", "numb", "confused", "doubt", "angry",
    "lonely", "sad", "worried", UNKNOWN_EMOTION,
];

/// Index of a label in the canonical vocabulary, folding unknowns
fn vocabulary_index(label: &str) -> usize {
    EMOTION_VOCABULARY
        .iter()
        .position(|&e| e == label)
        .unwrap_or(EMOTION_VOCABULARY.len() - 1)
}

/// Fold a raw emotion label into the canonical vocabulary
fn canonical_emotion(raw: Option<&str>) -> &'static str {
    match raw {
        Some(label) => EMOTION_VOCABULARY[vocabulary_index(label.trim())],
        None => UNKNOWN_EMOTION,
    }
}

/// Parse a client-supplied date string (YYYY-MM-DD or RFC 3339)
fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// An encoded batch: ordered feature rows plus the vocabulary they were
/// encoded against.
#[derive(Debug, Clone)]
pub struct EncodedBatch {
    pub rows: Vec<EncodedFeatureRow>,
    pub vocabulary_version: &'static str,
}

impl EncodedBatch {
    /// The sentiment column fed to the outlier model, one row per record.
    /// The one-hot emotion columns and `sentiment_change` stay on the rows
    /// (the reporter needs the change, the one-hot is scaffolding for
    /// experimentation) but are not part of the canonical scoring input.
    pub fn sentiment_features(&self) -> Array2<f64> {
        let mut features = Array2::zeros((self.rows.len(), 1));
        for (i, row) in self.rows.iter().enumerate() {
            features[[i, 0]] = row.sentiment;
        }
        features
    }
}

/// Encoder for converting journal batches into feature rows
pub struct FeatureEncoder {
    reference_date: NaiveDate,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureEncoder {
    /// Create an encoder anchored to today (UTC). Records dated after the
    /// reference date are excluded from analysis, never deleted.
    pub fn new() -> Self {
        Self {
            reference_date: Utc::now().date_naive(),
        }
    }

    /// Create an encoder with an explicit processing date
    pub fn with_reference_date(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// Encode a batch of journal records.
    ///
    /// Records with unparseable or future dates are dropped silently; the
    /// batch fails only when fewer than two valid rows remain or every
    /// surviving row is missing its sentiment score.
    pub fn encode(&self, records: &[JournalRecord]) -> Result<EncodedBatch, AnalyticsError> {
        let mut valid: Vec<(NaiveDate, &'static str, Option<f64>)> = Vec::new();

        for record in records {
            let date = match record.date.as_deref().and_then(parse_record_date) {
                Some(date) => date,
                None => {
                    debug!(date = ?record.date, "dropping record with unparseable date");
                    continue;
                }
            };
            if date > self.reference_date {
                debug!(%date, "excluding future-dated record");
                continue;
            }
            valid.push((date, canonical_emotion(record.emotion.as_deref()), record.sentiment));
        }

        if valid.len() < 2 {
            return Err(AnalyticsError::InsufficientData(format!(
                "need at least 2 valid records, got {}",
                valid.len()
            )));
        }

        let observed: Vec<f64> = valid.iter().filter_map(|(_, _, s)| *s).collect();
        if observed.is_empty() {
            return Err(AnalyticsError::InsufficientData(
                "every record is missing its sentiment score".to_string(),
            ));
        }
        let batch_mean = observed.iter().sum::<f64>() / observed.len() as f64;

        // Chronological order is required for sentiment_change; stable sort
        // keeps same-day records in submission order.
        valid.sort_by_key(|(date, _, _)| *date);

        let mut rows = Vec::with_capacity(valid.len());
        let mut previous: Option<f64> = None;
        for (date, emotion, sentiment) in valid {
            let sentiment = sentiment.unwrap_or(batch_mean);
            let mut onehot = vec![0.0; EMOTION_VOCABULARY.len()];
            onehot[vocabulary_index(emotion)] = 1.0;

            rows.push(EncodedFeatureRow {
                date,
                emotion: emotion.to_string(),
                emotion_onehot: onehot,
                sentiment,
                sentiment_change: previous.map(|p| sentiment - p).unwrap_or(0.0),
            });
            previous = Some(sentiment);
        }

        Ok(EncodedBatch {
            rows,
            vocabulary_version: VOCABULARY_VERSION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_record(emotion: Option<&str>, sentiment: Option<f64>, date: &str) -> JournalRecord {
        JournalRecord {
            user_id: Some("u1".to_string()),
            emotion: emotion.map(str::to_string),
            sentiment,
            date: Some(date.to_string()),
        }
    }

    fn test_encoder() -> FeatureEncoder {
        FeatureEncoder::with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn test_rows_sorted_ascending_and_first_change_is_zero() {
        let records = vec![
            make_record(Some("happy"), Some(0.9), "2024-01-02"),
            make_record(Some("sad"), Some(-0.8), "2024-01-01"),
            make_record(Some("happy"), Some(0.85), "2024-01-03"),
        ];
        let batch = test_encoder().encode(&records).unwrap();

        let dates: Vec<String> = batch.rows.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(batch.rows[0].sentiment_change, 0.0);
        assert!((batch.rows[1].sentiment_change - 1.7).abs() < 1e-9);
        assert!((batch.rows[2].sentiment_change - (-0.05)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_emotion_becomes_unknown() {
        let records = vec![
            make_record(None, Some(0.1), "2024-01-01"),
            make_record(Some("melancholic"), Some(0.2), "2024-01-02"),
        ];
        let batch = test_encoder().encode(&records).unwrap();

        assert_eq!(batch.rows[0].emotion, UNKNOWN_EMOTION);
        // Labels outside the canonical vocabulary fold into the sentinel too.
        assert_eq!(batch.rows[1].emotion, UNKNOWN_EMOTION);
        let unknown_idx = EMOTION_VOCABULARY.len() - 1;
        assert_eq!(batch.rows[0].emotion_onehot[unknown_idx], 1.0);
        assert_eq!(batch.rows[0].emotion_onehot.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_missing_sentiment_imputed_with_batch_mean() {
        let records = vec![
            make_record(Some("happy"), Some(0.4), "2024-01-01"),
            make_record(Some("calm"), None, "2024-01-02"),
            make_record(Some("happy"), Some(0.8), "2024-01-03"),
        ];
        let batch = test_encoder().encode(&records).unwrap();
        // Mean of 0.4 and 0.8
        assert!((batch.rows[1].sentiment - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_all_sentiments_missing_is_insufficient_data() {
        let records = vec![
            make_record(Some("happy"), None, "2024-01-01"),
            make_record(Some("sad"), None, "2024-01-02"),
        ];
        let err = test_encoder().encode(&records).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData(_)));
    }

    #[test]
    fn test_unparseable_dates_dropped_not_failed() {
        let records = vec![
            make_record(Some("happy"), Some(0.5), "not-a-date"),
            make_record(Some("happy"), Some(0.5), "2024-01-01"),
            make_record(Some("sad"), Some(-0.5), "2024-01-02"),
        ];
        let batch = test_encoder().encode(&records).unwrap();
        assert_eq!(batch.rows.len(), 2);
    }

    #[test]
    fn test_future_dates_excluded() {
        let records = vec![
            make_record(Some("happy"), Some(0.5), "2024-01-01"),
            make_record(Some("sad"), Some(-0.5), "2024-01-02"),
            make_record(Some("happy"), Some(0.9), "2031-01-01"),
        ];
        let batch = test_encoder().encode(&records).unwrap();
        assert_eq!(batch.rows.len(), 2);
        assert!(batch.rows.iter().all(|r| r.date.to_string() != "2031-01-01"));
    }

    #[test]
    fn test_fewer_than_two_valid_rows_is_insufficient_data() {
        let records = vec![
            make_record(Some("happy"), Some(0.5), "2024-01-01"),
            make_record(Some("sad"), Some(-0.5), "bogus"),
        ];
        let err = test_encoder().encode(&records).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData(_)));
    }

    #[test]
    fn test_batch_carries_vocabulary_version() {
        let records = vec![
            make_record(Some("happy"), Some(0.5), "2024-01-01"),
            make_record(Some("sad"), Some(-0.5), "2024-01-02"),
        ];
        let batch = test_encoder().encode(&records).unwrap();
        assert_eq!(batch.vocabulary_version, VOCABULARY_VERSION);
        // Feature width is vocabulary-fixed, not batch-local.
        assert!(batch
            .rows
            .iter()
            .all(|r| r.emotion_onehot.len() == EMOTION_VOCABULARY.len()));
    }

    #[test]
    fn test_rfc3339_dates_accepted() {
        let records = vec![
            make_record(Some("happy"), Some(0.5), "2024-01-01T10:30:00+00:00"),
            make_record(Some("sad"), Some(-0.5), "2024-01-02"),
        ];
        let batch = test_encoder().encode(&records).unwrap();
        assert_eq!(batch.rows[0].date.to_string(), "2024-01-01");
    }

    #[test]
    fn test_sentiment_features_shape() {
        let records = vec![
            make_record(Some("happy"), Some(0.5), "2024-01-01"),
            make_record(Some("sad"), Some(-0.5), "2024-01-02"),
        ];
        let batch = test_encoder().encode(&records).unwrap();
        let features = batch.sentiment_features();
        assert_eq!(features.shape(), &[2, 1]);
        assert_eq!(features[[0, 0]], 0.5);
        assert_eq!(features[[1, 0]], -0.5);
    }
}
