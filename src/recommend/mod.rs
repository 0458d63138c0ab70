//! Recommendation pipeline
//!
//! Builds a user-item matrix from accumulated like/dislike feedback,
//! factorizes it into latent factors, and ranks unrated items for a user.
//! Users without feedback history fall back to content-based mood matching.
//!
//! Pipeline: feedback records -> UserItemMatrix -> Factorization -> ranked titles

pub mod engine;
pub mod factorize;
pub mod matrix;

pub use engine::{RecommendationEngine, DEFAULT_SEED, MAX_RECOMMENDATIONS};
pub use factorize::{factorize, Factorization, DEFAULT_RANK};
pub use matrix::UserItemMatrix;
