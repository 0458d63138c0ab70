//! Pipeline orchestration
//!
//! This module provides the public API for Moodscope. Each request runs one
//! full fetch -> encode -> model -> respond pipeline; models are refit from
//! scratch every time and nothing is shared between requests.

use chrono::Utc;
use tracing::debug;

use crate::encoder::FeatureEncoder;
use crate::error::AnalyticsError;
use crate::outlier::{IsolationForest, DEFAULT_CONTAMINATION, DEFAULT_TREE_COUNT};
use crate::recommend::{RecommendationEngine, DEFAULT_RANK, DEFAULT_SEED};
use crate::report::AnomalyReporter;
use crate::store::MoodStore;
use crate::types::{AnomalyReport, FeedbackRecord, ItemKind, JournalRecord};

/// Model parameters applied to every request served by a service instance
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Expected outlier fraction for the anomaly model
    pub contamination: f64,
    /// Trees in the isolation forest ensemble
    pub tree_count: usize,
    /// Seed shared by the outlier model and the factorizer
    pub seed: u64,
    /// Latent rank of the recommendation factorization
    pub rank: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            tree_count: DEFAULT_TREE_COUNT,
            seed: DEFAULT_SEED,
            rank: DEFAULT_RANK,
        }
    }
}

/// Stateless-between-requests analytics service.
///
/// The store handle is injected at construction and shared by reference into
/// each pipeline run; substituting a fake store in tests needs no globals.
pub struct AnalyticsService<S: MoodStore> {
    store: S,
    config: AnalyticsConfig,
}

impl<S: MoodStore> AnalyticsService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: AnalyticsConfig::default(),
        }
    }

    pub fn with_config(store: S, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Flag dates whose sentiment deviates abnormally from the batch.
    ///
    /// A batch with fewer than two valid records (or nothing but missing
    /// sentiment) yields an empty report, not an error; genuine model
    /// failures propagate.
    pub fn detect_anomalies(
        &self,
        records: &[JournalRecord],
    ) -> Result<Vec<AnomalyReport>, AnalyticsError> {
        let batch = match FeatureEncoder::new().encode(records) {
            Ok(batch) => batch,
            Err(AnalyticsError::InsufficientData(reason)) => {
                debug!(%reason, "anomaly batch below modeling threshold");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let forest = IsolationForest::with_params(
            self.config.tree_count,
            self.config.contamination,
            self.config.seed,
        )?;
        let labels = forest.fit_predict(&batch.sentiment_features())?;

        Ok(AnomalyReporter::report(&batch.rows, &labels))
    }

    /// Recommend up to ten coping activities/resources for a user
    pub fn recommend(&self, user_id: &str) -> Result<Vec<String>, AnalyticsError> {
        RecommendationEngine::with_config(&self.store, self.config.rank, self.config.seed)
            .recommend(user_id)
    }

    /// Record a like/dislike on a catalog item.
    ///
    /// Increments the item's reaction counter and appends a feedback record
    /// for future matrix builds. Unknown kinds are rejected before any write.
    pub fn rate(
        &self,
        user_id: &str,
        item_id: &str,
        kind: &str,
        like: bool,
    ) -> Result<(), AnalyticsError> {
        let kind = ItemKind::parse(kind)
            .ok_or_else(|| AnalyticsError::InvalidRequest("Invalid type provided.".to_string()))?;

        self.store.increment_reaction(kind, item_id, like)?;

        // Matrix columns are keyed by title; fall back to the raw id for
        // items that have left the catalog.
        let title = self
            .store
            .list_catalog()?
            .into_iter()
            .find(|item| item.kind == kind && item.id == item_id)
            .map(|item| item.title)
            .unwrap_or_else(|| item_id.to_string());

        self.store.append_feedback(FeedbackRecord {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            item_title: title,
            item_type: kind,
            like,
            timestamp: Utc::now(),
        })?;

        Ok(())
    }
}
