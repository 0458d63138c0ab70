//! Error types for Moodscope

use thiserror::Error;

/// Errors that can occur during analysis or recommendation
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Model fit failed: {0}")]
    ModelFit(String),

    #[error("Upstream store unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),
}
