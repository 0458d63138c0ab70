//! Recommendation engine
//!
//! Per-request state machine: mood lookup -> candidate filtering -> feedback
//! pivot -> cold-start or factorization branch -> ranked, filtered, truncated
//! titles. All state is request-local; the matrix and factors are discarded
//! with the response.

use tracing::debug;

use crate::error::AnalyticsError;
use crate::mood::Mood;
use crate::store::MoodStore;

use super::factorize::{factorize, DEFAULT_RANK};
use super::matrix::UserItemMatrix;

/// Upper bound on returned recommendations
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Default seed for factor initialization
pub const DEFAULT_SEED: u64 = 42;

/// Collaborative-filtering recommender with a content-based cold-start
/// fallback
pub struct RecommendationEngine<'a> {
    store: &'a dyn MoodStore,
    rank: usize,
    seed: u64,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(store: &'a dyn MoodStore) -> Self {
        Self {
            store,
            rank: DEFAULT_RANK,
            seed: DEFAULT_SEED,
        }
    }

    /// Engine with explicit factorization rank and seed
    pub fn with_config(store: &'a dyn MoodStore, rank: usize, seed: u64) -> Self {
        Self { store, rank, seed }
    }

    /// Produce up to [`MAX_RECOMMENDATIONS`] item titles for a user.
    ///
    /// An empty result is a valid outcome, not an error.
    pub fn recommend(&self, user_id: &str) -> Result<Vec<String>, AnalyticsError> {
        if user_id.is_empty() {
            return Err(AnalyticsError::InvalidRequest(
                "userId must not be empty".to_string(),
            ));
        }

        let latest = self.store.latest_journal(user_id)?;
        let mood = Mood::classify_opt(latest.and_then(|j| j.sentiment));
        debug!(user_id, mood = mood.as_str(), "resolved user mood");

        let candidates: Vec<String> = self
            .store
            .list_catalog()?
            .into_iter()
            .filter(|item| item.emotional_impact.contains(&mood))
            .map(|item| item.title)
            .collect();

        let feedback = self.store.list_feedback()?;
        let matrix = UserItemMatrix::from_feedback(&feedback);

        let (matrix, user_row) = match matrix {
            Some(matrix) => match matrix.user_row(user_id) {
                Some(row) => (matrix, row),
                None => {
                    debug!(user_id, "no feedback row, using content-based fallback");
                    return Ok(truncate(candidates));
                }
            },
            None => {
                debug!("empty feedback population, using content-based fallback");
                return Ok(truncate(candidates));
            }
        };

        // A rank at or above min(rows, cols) cannot be fit; such matrices are
        // served like cold-start users.
        if self.rank >= matrix.n_users().min(matrix.n_items()) {
            debug!(
                users = matrix.n_users(),
                items = matrix.n_items(),
                rank = self.rank,
                "matrix too small for factorization, using content-based fallback"
            );
            return Ok(truncate(candidates));
        }

        let model = factorize(matrix.values(), self.rank, self.seed)?;
        let predicted = model.predict_user(user_row);

        let mut ranked: Vec<usize> = (0..matrix.n_items()).collect();
        ranked.sort_by(|&a, &b| predicted[b].total_cmp(&predicted[a]).then(a.cmp(&b)));

        Ok(ranked
            .into_iter()
            .filter(|&col| !matrix.rated(user_row, col))
            .map(|col| matrix.items()[col].clone())
            .take(MAX_RECOMMENDATIONS)
            .collect())
    }
}

fn truncate(titles: Vec<String>) -> Vec<String> {
    titles.into_iter().take(MAX_RECOMMENDATIONS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{CatalogItem, FeedbackRecord, ItemKind, JournalRecord};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn make_item(id: &str, title: &str, impact: &[Mood]) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            kind: ItemKind::Activity,
            title: title.to_string(),
            description: String::new(),
            emotional_impact: impact.to_vec(),
        }
    }

    fn make_feedback(user: &str, title: &str, like: bool, offset_secs: u32) -> FeedbackRecord {
        FeedbackRecord {
            user_id: user.to_string(),
            item_id: format!("id-{title}"),
            item_title: title.to_string(),
            item_type: ItemKind::Activity,
            like,
            timestamp: Utc.timestamp_opt(1_704_100_000 + offset_secs as i64, 0).unwrap(),
        }
    }

    fn make_journal(user: &str, date: &str, sentiment: f64) -> JournalRecord {
        JournalRecord {
            user_id: Some(user.to_string()),
            emotion: None,
            sentiment: Some(sentiment),
            date: Some(date.to_string()),
        }
    }

    fn negative_mood_catalog(n: usize) -> Vec<CatalogItem> {
        (0..n)
            .map(|i| make_item(&format!("act-{i}"), &format!("Activity {i}"), &[Mood::Negative]))
            .collect()
    }

    #[test]
    fn test_cold_start_returns_mood_filtered_catalog_order() {
        let store = MemoryStore::with_catalog(vec![
            make_item("a", "Walk", &[Mood::Negative]),
            make_item("b", "Party planning", &[Mood::Positive]),
            make_item("c", "Breathing guide", &[Mood::Negative, Mood::Neutral]),
        ]);
        store.add_journal(make_journal("u1", "2024-01-05", -0.7)).unwrap();

        let engine = RecommendationEngine::new(&store);
        let titles = engine.recommend("u1").unwrap();
        assert_eq!(titles, vec!["Walk", "Breathing guide"]);
    }

    #[test]
    fn test_cold_start_truncates_to_ten() {
        let store = MemoryStore::with_catalog(negative_mood_catalog(15));
        store.add_journal(make_journal("u1", "2024-01-05", -0.7)).unwrap();

        let titles = RecommendationEngine::new(&store).recommend("u1").unwrap();
        assert_eq!(titles.len(), MAX_RECOMMENDATIONS);
        assert_eq!(titles[0], "Activity 0");
    }

    #[test]
    fn test_no_journal_defaults_to_neutral_candidates() {
        let store = MemoryStore::with_catalog(vec![
            make_item("a", "Walk", &[Mood::Negative]),
            make_item("b", "Read a chapter", &[Mood::Neutral]),
        ]);

        let titles = RecommendationEngine::new(&store).recommend("u1").unwrap();
        assert_eq!(titles, vec!["Read a chapter"]);
    }

    #[test]
    fn test_warm_user_never_sees_rated_items() {
        let store = MemoryStore::new();
        // 4 users x 4 items so rank 2 fits
        for (user, likes) in [
            ("u1", [true, true, false, false]),
            ("u2", [true, false, false, true]),
            ("u3", [false, true, true, false]),
        ] {
            for (i, like) in likes.iter().enumerate() {
                store
                    .add_feedback(make_feedback(user, &format!("Item {i}"), *like, i as u32))
                    .unwrap();
            }
        }
        // u4 rated only two items; the other two are fair game
        store.add_feedback(make_feedback("u4", "Item 0", true, 30)).unwrap();
        store.add_feedback(make_feedback("u4", "Item 3", false, 31)).unwrap();

        let engine = RecommendationEngine::with_config(&store, 2, 42);
        let titles = engine.recommend("u4").unwrap();

        assert!(!titles.contains(&"Item 0".to_string()));
        assert!(!titles.contains(&"Item 3".to_string()));
        assert_eq!(titles.len(), 2);
    }

    #[test]
    fn test_warm_user_with_everything_rated_gets_empty_result() {
        let store = MemoryStore::new();
        for user in ["u1", "u2", "u3"] {
            for i in 0..4 {
                store
                    .add_feedback(make_feedback(user, &format!("Item {i}"), i % 2 == 0, i))
                    .unwrap();
            }
        }

        let engine = RecommendationEngine::with_config(&store, 2, 42);
        let titles = engine.recommend("u2").unwrap();
        assert_eq!(titles, Vec::<String>::new());
    }

    #[test]
    fn test_single_user_matrix_falls_back_to_cold_start() {
        let store = MemoryStore::with_catalog(negative_mood_catalog(3));
        store.add_journal(make_journal("u1", "2024-01-05", -0.7)).unwrap();
        // Only one user in the population: rank >= min(1, n) always
        store.add_feedback(make_feedback("u1", "Activity 0", true, 0)).unwrap();
        store.add_feedback(make_feedback("u1", "Activity 1", false, 1)).unwrap();

        let titles = RecommendationEngine::new(&store).recommend("u1").unwrap();
        assert_eq!(titles, vec!["Activity 0", "Activity 1", "Activity 2"]);
    }

    #[test]
    fn test_empty_user_id_is_invalid_request() {
        let store = MemoryStore::new();
        let err = RecommendationEngine::new(&store).recommend("").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidRequest(_)));
    }

    #[test]
    fn test_result_never_exceeds_ten() {
        let store = MemoryStore::new();
        // 6 users x 12 items, u6 rated nothing beyond one item
        for u in 0..6 {
            for i in 0..12 {
                if u == 5 && i > 0 {
                    continue;
                }
                store
                    .add_feedback(make_feedback(
                        &format!("u{u}"),
                        &format!("Item {i}"),
                        (u + i) % 2 == 0,
                        (u * 12 + i) as u32,
                    ))
                    .unwrap();
            }
        }

        let engine = RecommendationEngine::with_config(&store, 3, 42);
        let titles = engine.recommend("u5").unwrap();
        assert!(titles.len() <= MAX_RECOMMENDATIONS);
        assert!(!titles.contains(&"Item 0".to_string()));
    }

    #[test]
    fn test_recommendation_is_deterministic_for_fixed_seed() {
        let store = MemoryStore::new();
        for u in 0..4 {
            for i in 0..4 {
                store
                    .add_feedback(make_feedback(
                        &format!("u{u}"),
                        &format!("Item {i}"),
                        (u * i) % 3 == 0,
                        (u * 4 + i) as u32,
                    ))
                    .unwrap();
            }
        }
        let engine = RecommendationEngine::with_config(&store, 2, 11);
        assert_eq!(engine.recommend("u1").unwrap(), engine.recommend("u1").unwrap());
    }
}
