//! Low-rank matrix factorization
//!
//! Approximates the user-item matrix as the product of a user-factor and an
//! item-factor matrix, learned by seeded gradient descent. The value domain
//! is signed (+1/-1/0), so this is a general decomposition rather than NMF.
//! Refit per request; factors never outlive the response.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::AnalyticsError;

/// Default latent factor dimensionality
pub const DEFAULT_RANK: usize = 5;

const LEARNING_RATE: f64 = 0.05;
const REGULARIZATION: f64 = 0.02;
const EPOCHS: usize = 200;
const INIT_SCALE: f64 = 0.1;

/// Learned factor matrices
#[derive(Debug, Clone)]
pub struct Factorization {
    /// rows x rank
    pub user_factors: Array2<f64>,
    /// cols x rank
    pub item_factors: Array2<f64>,
}

impl Factorization {
    /// Reconstruct the dense predicted-affinity row for one user
    pub fn predict_user(&self, user_row: usize) -> Array1<f64> {
        self.item_factors.dot(&self.user_factors.row(user_row))
    }
}

/// Factorize `matrix` into rank-`rank` factors.
///
/// The rank must be strictly below min(rows, cols); degenerate shapes are a
/// fit error here, and callers that can fall back (cold start) check before
/// calling.
pub fn factorize(
    matrix: &Array2<f64>,
    rank: usize,
    seed: u64,
) -> Result<Factorization, AnalyticsError> {
    let (rows, cols) = matrix.dim();
    if rank == 0 {
        return Err(AnalyticsError::ModelFit("rank must be at least 1".to_string()));
    }
    if rank >= rows.min(cols) {
        return Err(AnalyticsError::ModelFit(format!(
            "rank {rank} is degenerate for a {rows}x{cols} matrix"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut user_factors =
        Array2::from_shape_fn((rows, rank), |_| rng.gen_range(-INIT_SCALE..INIT_SCALE));
    let mut item_factors =
        Array2::from_shape_fn((cols, rank), |_| rng.gen_range(-INIT_SCALE..INIT_SCALE));

    for _ in 0..EPOCHS {
        for i in 0..rows {
            for j in 0..cols {
                let prediction = user_factors.row(i).dot(&item_factors.row(j));
                let error = matrix[[i, j]] - prediction;
                for f in 0..rank {
                    let u = user_factors[[i, f]];
                    let v = item_factors[[j, f]];
                    user_factors[[i, f]] += LEARNING_RATE * (error * v - REGULARIZATION * u);
                    item_factors[[j, f]] += LEARNING_RATE * (error * u - REGULARIZATION * v);
                }
            }
        }
    }

    if user_factors.iter().chain(item_factors.iter()).any(|v| !v.is_finite()) {
        return Err(AnalyticsError::ModelFit(
            "factorization diverged to non-finite factors".to_string(),
        ));
    }

    debug!(rows, cols, rank, "factorized user-item matrix");
    Ok(Factorization {
        user_factors,
        item_factors,
    })
}
