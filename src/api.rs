//! Request boundary
//!
//! Transport-agnostic handlers for the operations a host HTTP layer exposes.
//! Each handler takes a raw JSON body and returns a status code plus JSON
//! response; every pipeline failure is caught here and mapped to the error
//! taxonomy, so nothing below this layer reaches the transport unwrapped.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::AnalyticsError;
use crate::pipeline::AnalyticsService;
use crate::sentiment::SentimentScorer;
use crate::store::MoodStore;
use crate::types::JournalRecord;

/// Status code plus JSON body, ready for any transport to serialize
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

fn status_for(error: &AnalyticsError) -> u16 {
    match error {
        AnalyticsError::InvalidRequest(_)
        | AnalyticsError::JsonError(_)
        | AnalyticsError::InsufficientData(_)
        | AnalyticsError::DateParseError(_) => 400,
        AnalyticsError::ModelFit(_) | AnalyticsError::UpstreamUnavailable(_) => 500,
    }
}

fn from_error(error: AnalyticsError) -> ApiResponse {
    let status = status_for(&error);
    if status >= 500 {
        warn!(%error, "request failed");
    }
    // Client errors carry the bare message (clients match on it);
    // server errors keep the taxonomy prefix.
    match error {
        AnalyticsError::InvalidRequest(message) => ApiResponse::error(status, message),
        other => ApiResponse::error(status, other.to_string()),
    }
}

/// `POST detect_anomalies`: journal record batch in, change report out.
/// Batches too small to model return an empty report with status 200.
pub fn handle_detect_anomalies<S: MoodStore>(
    service: &AnalyticsService<S>,
    body: &str,
) -> ApiResponse {
    let records: Vec<JournalRecord> = match serde_json::from_str(body) {
        Ok(records) => records,
        Err(e) => return ApiResponse::error(400, format!("Invalid JSON: {e}")),
    };

    match service.detect_anomalies(&records) {
        Ok(report) => ApiResponse::ok(json!({ "anomalies": report })),
        Err(e) => from_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

/// `POST recommend`: user id in, ranked titles out. An empty result is a
/// 200 with a message, not an error.
pub fn handle_recommend<S: MoodStore>(service: &AnalyticsService<S>, body: &str) -> ApiResponse {
    let request: RecommendRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(400, format!("Invalid JSON: {e}")),
    };

    let user_id = match request.user_id {
        Some(ref id) if !id.is_empty() => id,
        _ => return ApiResponse::error(400, "userId is required"),
    };

    match service.recommend(user_id) {
        Ok(titles) if titles.is_empty() => ApiResponse::ok(json!({
            "message": "No recommendations available."
        })),
        Ok(titles) => ApiResponse::ok(json!({ "recommendations": titles })),
        Err(e) => from_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct RateRequest {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
    #[serde(default, alias = "itemId")]
    id: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(rename = "isLike", default, alias = "like")]
    is_like: Option<bool>,
}

/// `POST rate`: record a like/dislike. Pure storage delegation.
pub fn handle_rate<S: MoodStore>(service: &AnalyticsService<S>, body: &str) -> ApiResponse {
    let request: RateRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(400, format!("Invalid JSON: {e}")),
    };

    let (user_id, id, kind, is_like) = match (
        request.user_id,
        request.id,
        request.kind,
        request.is_like,
    ) {
        (Some(user_id), Some(id), Some(kind), Some(is_like)) => (user_id, id, kind, is_like),
        _ => return ApiResponse::error(400, "userId, id, type and isLike are required"),
    };

    match service.rate(&user_id, &id, &kind, is_like) {
        Ok(()) => ApiResponse::ok(json!({ "message": "Rating updated successfully." })),
        Err(e) => from_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    emotion: String,
}

/// `POST analyze`: score free text (plus the picked emotion label) with the
/// upstream sentiment scorer.
pub fn handle_analyze(scorer: &dyn SentimentScorer, body: &str) -> ApiResponse {
    let request: AnalyzeRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(400, format!("Invalid JSON: {e}")),
    };

    if request.text.is_empty() && request.emotion.is_empty() {
        return ApiResponse::error(400, "No text or emotion provided");
    }

    let combined = format!("{} {}", request.emotion, request.text)
        .trim()
        .to_lowercase();

    match scorer.score(&combined) {
        Ok(score) => match serde_json::to_value(&score) {
            Ok(body) => ApiResponse::ok(body),
            Err(e) => from_error(e.into()),
        },
        Err(e) => from_error(e),
    }
}
