//! User-item interaction matrix
//!
//! Pivot of the full feedback population: rows = distinct users, columns =
//! distinct item titles, cells = +1 (like), -1 (dislike), 0 (unrated).
//! Rebuilt from scratch on every request; never updated incrementally.

use std::collections::HashMap;

use ndarray::Array2;

use crate::types::FeedbackRecord;

/// Dense pivot of feedback records
#[derive(Debug, Clone)]
pub struct UserItemMatrix {
    users: Vec<String>,
    items: Vec<String>,
    values: Array2<f64>,
}

impl UserItemMatrix {
    /// Build the pivot from feedback records. Returns None for an empty
    /// population. When a user rated the same item more than once, the
    /// most recent rating wins.
    pub fn from_feedback(records: &[FeedbackRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        // First-seen order keeps rows/columns deterministic for a given
        // feedback history.
        let mut users: Vec<String> = Vec::new();
        let mut items: Vec<String> = Vec::new();
        let mut user_index: HashMap<&str, usize> = HashMap::new();
        let mut item_index: HashMap<&str, usize> = HashMap::new();

        for record in records {
            if !user_index.contains_key(record.user_id.as_str()) {
                user_index.insert(record.user_id.as_str(), users.len());
                users.push(record.user_id.clone());
            }
            if !item_index.contains_key(record.item_title.as_str()) {
                item_index.insert(record.item_title.as_str(), items.len());
                items.push(record.item_title.clone());
            }
        }

        let mut ordered: Vec<&FeedbackRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.timestamp);

        let mut values = Array2::zeros((users.len(), items.len()));
        for record in ordered {
            let row = user_index[record.user_id.as_str()];
            let col = item_index[record.item_title.as_str()];
            values[[row, col]] = if record.like { 1.0 } else { -1.0 };
        }

        Some(Self {
            users,
            items,
            values,
        })
    }

    /// Row index of a user, when they have any feedback
    pub fn user_row(&self, user_id: &str) -> Option<usize> {
        self.users.iter().position(|u| u == user_id)
    }

    /// Item titles in column order
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// True when the user has rated the item (cell != 0)
    pub fn rated(&self, user_row: usize, item_col: usize) -> bool {
        self.values[[user_row, item_col]] != 0.0
    }
}
