//! Core types for the Moodscope pipelines
//!
//! This module defines the data structures that flow through both pipelines:
//! journal records and their encoded feature rows (anomaly path), feedback
//! records and catalog items (recommendation path).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::mood::Mood;

/// A single mood journal entry as submitted by the journaling client.
///
/// Fields arrive from an untyped document store, so everything except the
/// calendar date is optional here; the feature encoder decides what a missing
/// field means (sentinel emotion, imputed sentiment, dropped record).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRecord {
    /// Owning user (absent on anonymized batches)
    #[serde(default)]
    pub user_id: Option<String>,
    /// Categorical emotion label chosen by the user
    #[serde(default)]
    pub emotion: Option<String>,
    /// Compound sentiment score in [-1, 1]
    #[serde(default, alias = "sentimentScore", alias = "sentiment_score")]
    pub sentiment: Option<f64>,
    /// Entry date as recorded by the client (YYYY-MM-DD or RFC 3339)
    #[serde(default, alias = "timestamp")]
    pub date: Option<String>,
}

/// One encoded feature row, derived 1:1 from a valid journal record.
///
/// Rows are batch-local: they exist for a single pipeline invocation and are
/// discarded with the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedFeatureRow {
    /// Entry date (parsed, past-or-present)
    pub date: NaiveDate,
    /// Canonical emotion label after vocabulary folding
    pub emotion: String,
    /// One-hot encoding of `emotion` against the canonical vocabulary
    pub emotion_onehot: Vec<f64>,
    /// Sentiment score, imputed with the batch mean when missing
    pub sentiment: f64,
    /// Signed difference from the chronologically preceding row (first row: 0)
    pub sentiment_change: f64,
}

/// Inlier/outlier label attached 1:1 to an encoded feature row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierLabel {
    Inlier,
    Outlier,
}

impl OutlierLabel {
    pub fn is_outlier(&self) -> bool {
        matches!(self, OutlierLabel::Outlier)
    }
}

/// One reported anomaly: the day it happened and the sentiment swing
/// leading into it, as a percentage rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Full weekday, month name, day and year (e.g. "Tuesday, January 2, 2024")
    pub day: String,
    /// Sentiment change x 100, rounded to 2 decimals
    pub change: f64,
}

/// Catalog item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Activity,
    Resource,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Activity => "activity",
            ItemKind::Resource => "resource",
        }
    }

    /// Parse a request-supplied kind string; anything unrecognized is None
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "activity" => Some(ItemKind::Activity),
            "resource" => Some(ItemKind::Resource),
            _ => None,
        }
    }
}

/// A coping activity or resource from the reference catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Mood buckets this item is appropriate for
    pub emotional_impact: Vec<Mood>,
}

/// One like/dislike feedback event. Append-only: the core never mutates
/// or deletes these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub user_id: String,
    pub item_id: String,
    /// Item title used as the matrix column key
    pub item_title: String,
    pub item_type: ItemKind,
    pub like: bool,
    pub timestamp: DateTime<Utc>,
}
