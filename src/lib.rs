//! Moodscope - Analytics engine for mood journal signals
//!
//! Moodscope turns raw journal entries and like/dislike feedback into two
//! deterministic, per-request pipelines:
//!
//! - **Anomaly Pipeline**: journal batch → feature encoding → isolation
//!   forest → dated change report
//! - **Recommendation Pipeline**: feedback population → user-item matrix →
//!   low-rank factorization → ranked coping activities/resources, with a
//!   content-based mood fallback for users without history
//!
//! Persistent storage and the HTTP transport are collaborators behind the
//! [`store::MoodStore`] trait and the [`api`] request boundary.

pub mod api;
pub mod encoder;
pub mod error;
pub mod mood;
pub mod outlier;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod sentiment;
pub mod store;
pub mod types;

pub use error::AnalyticsError;
pub use mood::Mood;
pub use pipeline::{AnalyticsConfig, AnalyticsService};
pub use recommend::{RecommendationEngine, MAX_RECOMMENDATIONS};
pub use store::{MemoryStore, MoodStore};

/// Moodscope version embedded in CLI output
pub const MOODSCOPE_VERSION: &str = env!("CARGO_PKG_VERSION");
