//! Anomaly reporting
//!
//! Pure transform from labeled feature rows to the human-readable change
//! report: one entry per outlier row, ordered ascending by date (the order
//! the encoder already established).

use chrono::NaiveDate;

use crate::types::{AnomalyReport, EncodedFeatureRow, OutlierLabel};

/// Reporter for converting labeled rows into change reports
pub struct AnomalyReporter;

impl AnomalyReporter {
    /// Emit one report entry per outlier row. `rows` and `labels` are
    /// parallel slices; extra elements on either side are ignored.
    pub fn report(rows: &[EncodedFeatureRow], labels: &[OutlierLabel]) -> Vec<AnomalyReport> {
        rows.iter()
            .zip(labels.iter())
            .filter(|(_, label)| label.is_outlier())
            .map(|(row, _)| AnomalyReport {
                day: format_day(row.date),
                change: round2(row.sentiment_change * 100.0),
            })
            .collect()
    }
}

/// Full weekday, month name, day-of-month and year
fn format_day(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Round to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
