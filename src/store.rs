//! Storage boundary
//!
//! The persistent document store (journals, catalog, feedback) lives outside
//! this crate. [`MoodStore`] is the seam the pipelines consume: synchronous,
//! each call independently fallible with `UpstreamUnavailable`, no retries at
//! this layer. [`MemoryStore`] is the in-process implementation used by tests
//! and the CLI.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AnalyticsError;
use crate::types::{CatalogItem, FeedbackRecord, ItemKind, JournalRecord};

/// Document-store operations consumed by the pipelines.
///
/// Implementations must be safe to share across concurrently executing
/// requests; all pipeline state is request-local.
pub trait MoodStore: Send + Sync {
    /// Most recent journal entry for a user, by entry date
    fn latest_journal(&self, user_id: &str) -> Result<Option<JournalRecord>, AnalyticsError>;

    /// Full activity/resource catalog, in catalog order
    fn list_catalog(&self) -> Result<Vec<CatalogItem>, AnalyticsError>;

    /// All feedback records across the whole population
    fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, AnalyticsError>;

    /// Append a feedback record; returns the assigned document id
    fn append_feedback(&self, record: FeedbackRecord) -> Result<String, AnalyticsError>;

    /// Increment the like/dislike counter on a catalog item
    fn increment_reaction(
        &self,
        kind: ItemKind,
        item_id: &str,
        like: bool,
    ) -> Result<(), AnalyticsError>;
}

/// Parse a journal entry date for recency comparison
fn entry_date(record: &JournalRecord) -> Option<NaiveDate> {
    let raw = record.date.as_deref()?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// In-memory document store backed by `RwLock`-guarded collections
#[derive(Debug, Default)]
pub struct MemoryStore {
    journals: RwLock<Vec<JournalRecord>>,
    catalog: RwLock<Vec<CatalogItem>>,
    feedback: RwLock<Vec<(String, FeedbackRecord)>>,
    reactions: RwLock<HashMap<(ItemKind, String), (u64, u64)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a catalog
    pub fn with_catalog(catalog: Vec<CatalogItem>) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            ..Self::default()
        }
    }

    /// Load a catalog from its static JSON document form
    pub fn load_catalog_json(json: &str) -> Result<Self, AnalyticsError> {
        let catalog: Vec<CatalogItem> = serde_json::from_str(json)?;
        Ok(Self::with_catalog(catalog))
    }

    pub fn add_journal(&self, record: JournalRecord) -> Result<(), AnalyticsError> {
        self.journals
            .write()
            .map_err(|_| lock_error())?
            .push(record);
        Ok(())
    }

    pub fn add_feedback(&self, record: FeedbackRecord) -> Result<(), AnalyticsError> {
        self.append_feedback(record).map(|_| ())
    }

    /// Current (likes, dislikes) counters for an item
    pub fn reaction_counts(
        &self,
        kind: ItemKind,
        item_id: &str,
    ) -> Result<(u64, u64), AnalyticsError> {
        Ok(self
            .reactions
            .read()
            .map_err(|_| lock_error())?
            .get(&(kind, item_id.to_string()))
            .copied()
            .unwrap_or((0, 0)))
    }
}

fn lock_error() -> AnalyticsError {
    AnalyticsError::UpstreamUnavailable("store lock poisoned".to_string())
}

impl MoodStore for MemoryStore {
    fn latest_journal(&self, user_id: &str) -> Result<Option<JournalRecord>, AnalyticsError> {
        let journals = self.journals.read().map_err(|_| lock_error())?;
        Ok(journals
            .iter()
            .filter(|j| j.user_id.as_deref() == Some(user_id))
            .filter_map(|j| entry_date(j).map(|d| (d, j)))
            .max_by_key(|(d, _)| *d)
            .map(|(_, j)| j.clone()))
    }

    fn list_catalog(&self) -> Result<Vec<CatalogItem>, AnalyticsError> {
        Ok(self.catalog.read().map_err(|_| lock_error())?.clone())
    }

    fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, AnalyticsError> {
        Ok(self
            .feedback
            .read()
            .map_err(|_| lock_error())?
            .iter()
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn append_feedback(&self, record: FeedbackRecord) -> Result<String, AnalyticsError> {
        let id = Uuid::new_v4().to_string();
        self.feedback
            .write()
            .map_err(|_| lock_error())?
            .push((id.clone(), record));
        Ok(id)
    }

    fn increment_reaction(
        &self,
        kind: ItemKind,
        item_id: &str,
        like: bool,
    ) -> Result<(), AnalyticsError> {
        let mut reactions = self.reactions.write().map_err(|_| lock_error())?;
        let counts = reactions
            .entry((kind, item_id.to_string()))
            .or_insert((0, 0));
        if like {
            counts.0 += 1;
        } else {
            counts.1 += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn make_journal(user: &str, date: &str, sentiment: f64) -> JournalRecord {
        JournalRecord {
            user_id: Some(user.to_string()),
            emotion: Some("calm".to_string()),
            sentiment: Some(sentiment),
            date: Some(date.to_string()),
        }
    }

    #[test]
    fn test_latest_journal_picks_most_recent_date() {
        let store = MemoryStore::new();
        store.add_journal(make_journal("u1", "2024-01-01", 0.1)).unwrap();
        store.add_journal(make_journal("u1", "2024-03-01", 0.9)).unwrap();
        store.add_journal(make_journal("u1", "2024-02-01", 0.5)).unwrap();
        store.add_journal(make_journal("u2", "2024-12-01", -0.9)).unwrap();

        let latest = store.latest_journal("u1").unwrap().unwrap();
        assert_eq!(latest.sentiment, Some(0.9));
    }

    #[test]
    fn test_latest_journal_none_for_unknown_user() {
        let store = MemoryStore::new();
        assert!(store.latest_journal("nobody").unwrap().is_none());
    }

    #[test]
    fn test_append_feedback_assigns_unique_ids() {
        let store = MemoryStore::new();
        let record = FeedbackRecord {
            user_id: "u1".to_string(),
            item_id: "act-01".to_string(),
            item_title: "Take a short walk".to_string(),
            item_type: ItemKind::Activity,
            like: true,
            timestamp: Utc::now(),
        };
        let a = store.append_feedback(record.clone()).unwrap();
        let b = store.append_feedback(record).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list_feedback().unwrap().len(), 2);
    }

    #[test]
    fn test_increment_reaction_counters() {
        let store = MemoryStore::new();
        store
            .increment_reaction(ItemKind::Activity, "act-01", true)
            .unwrap();
        store
            .increment_reaction(ItemKind::Activity, "act-01", true)
            .unwrap();
        store
            .increment_reaction(ItemKind::Activity, "act-01", false)
            .unwrap();

        let (likes, dislikes) = store.reaction_counts(ItemKind::Activity, "act-01").unwrap();
        assert_eq!((likes, dislikes), (2, 1));
    }

    #[test]
    fn test_load_catalog_json() {
        let json = r#"[
            {
                "id": "act-01",
                "type": "activity",
                "title": "Take a short walk",
                "emotionalImpact": ["negative"]
            },
            {
                "id": "res-01",
                "type": "resource",
                "title": "Breathing exercise guide",
                "emotionalImpact": ["negative", "neutral"]
            }
        ]"#;
        let store = MemoryStore::load_catalog_json(json).unwrap();
        let catalog = store.list_catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[1].kind, ItemKind::Resource);
    }
}
