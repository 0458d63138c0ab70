//! Outlier detection
//!
//! Seeded isolation forest over encoded sentiment features. The model is
//! refit from scratch on every request; nothing is cached between calls.
//! Calibration follows the contamination contract: for a batch of n rows,
//! the ceil(contamination x n) highest-scoring rows are labeled outliers.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::AnalyticsError;
use crate::types::OutlierLabel;

/// Expected fraction of true outliers in an uncalibrated batch
pub const DEFAULT_CONTAMINATION: f64 = 0.10;

/// Trees in the ensemble
pub const DEFAULT_TREE_COUNT: usize = 100;

/// Per-tree subsample cap
const MAX_SUBSAMPLE: usize = 256;

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// A single random partitioning tree
enum IsolationTree {
    Leaf {
        size: usize,
    },
    Split {
        dim: usize,
        threshold: f64,
        left: Box<IsolationTree>,
        right: Box<IsolationTree>,
    },
}

/// Isolation forest outlier model.
///
/// Deterministic for a fixed input and seed; the seed is a required
/// constructor argument rather than an uncontrolled default.
pub struct IsolationForest {
    tree_count: usize,
    contamination: f64,
    seed: u64,
}

impl IsolationForest {
    /// Create a forest with default tree count and contamination
    pub fn new(seed: u64) -> Self {
        Self {
            tree_count: DEFAULT_TREE_COUNT,
            contamination: DEFAULT_CONTAMINATION,
            seed,
        }
    }

    /// Create a forest with explicit parameters
    pub fn with_params(
        tree_count: usize,
        contamination: f64,
        seed: u64,
    ) -> Result<Self, AnalyticsError> {
        if tree_count == 0 {
            return Err(AnalyticsError::ModelFit(
                "tree count must be at least 1".to_string(),
            ));
        }
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(AnalyticsError::ModelFit(format!(
                "contamination must be in (0, 0.5], got {contamination}"
            )));
        }
        Ok(Self {
            tree_count,
            contamination,
            seed,
        })
    }

    /// Fit the forest on `data` (rows = points) and label every row.
    ///
    /// Fit failures surface as errors and are never retried here.
    pub fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<OutlierLabel>, AnalyticsError> {
        let scores = self.score_samples(data)?;
        let n = scores.len();

        let flagged = ((self.contamination * n as f64).ceil() as usize).min(n);
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

        let mut labels = vec![OutlierLabel::Inlier; n];
        for &idx in order.iter().take(flagged) {
            labels[idx] = OutlierLabel::Outlier;
        }

        debug!(rows = n, flagged, "isolation forest labeled batch");
        Ok(labels)
    }

    /// Anomaly score per row in [0, 1]; higher means easier to isolate
    pub fn score_samples(&self, data: &Array2<f64>) -> Result<Vec<f64>, AnalyticsError> {
        let n = data.nrows();
        if n < 2 {
            return Err(AnalyticsError::InsufficientData(format!(
                "outlier model needs at least 2 points, got {n}"
            )));
        }
        if is_degenerate(data) {
            return Err(AnalyticsError::ModelFit(
                "degenerate input: all feature rows are identical".to_string(),
            ));
        }

        let subsample = n.min(MAX_SUBSAMPLE);
        let height_limit = (subsample as f64).log2().ceil() as usize;
        let normalizer = average_path_length(subsample);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut path_sums = vec![0.0; n];

        for _ in 0..self.tree_count {
            let indices: Vec<usize> = if subsample < n {
                sample(&mut rng, n, subsample).into_vec()
            } else {
                (0..n).collect()
            };
            let tree = build_tree(data, &indices, 0, height_limit, &mut rng);
            for (i, sums) in path_sums.iter_mut().enumerate() {
                *sums += path_length(&tree, data.row(i), 0.0);
            }
        }

        let trees = self.tree_count as f64;
        Ok(path_sums
            .into_iter()
            .map(|sum| 2.0_f64.powf(-(sum / trees) / normalizer))
            .collect())
    }
}

/// True when every row equals the first row
fn is_degenerate(data: &Array2<f64>) -> bool {
    let first = data.row(0);
    data.rows().into_iter().all(|row| row == first)
}

/// Expected path length of an unsuccessful BST search over `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let m = n as f64;
            2.0 * ((m - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (m - 1.0) / m
        }
    }
}

fn build_tree(
    data: &Array2<f64>,
    indices: &[usize],
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> IsolationTree {
    if indices.len() <= 1 || depth >= height_limit {
        return IsolationTree::Leaf {
            size: indices.len(),
        };
    }

    // Only dimensions with spread can split this node
    let splittable: Vec<(usize, f64, f64)> = (0..data.ncols())
        .filter_map(|dim| {
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for &i in indices {
                lo = lo.min(data[[i, dim]]);
                hi = hi.max(data[[i, dim]]);
            }
            (lo < hi).then_some((dim, lo, hi))
        })
        .collect();

    if splittable.is_empty() {
        return IsolationTree::Leaf {
            size: indices.len(),
        };
    }

    let (dim, lo, hi) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(lo..hi);

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| data[[i, dim]] < threshold);

    IsolationTree::Split {
        dim,
        threshold,
        left: Box::new(build_tree(data, &left, depth + 1, height_limit, rng)),
        right: Box::new(build_tree(data, &right, depth + 1, height_limit, rng)),
    }
}

fn path_length(tree: &IsolationTree, point: ArrayView1<f64>, depth: f64) -> f64 {
    match tree {
        IsolationTree::Leaf { size } => depth + average_path_length(*size),
        IsolationTree::Split {
            dim,
            threshold,
            left,
            right,
        } => {
            if point[*dim] < *threshold {
                path_length(left, point, depth + 1.0)
            } else {
                path_length(right, point, depth + 1.0)
            }
        }
    }
}
