//! Tree-based regression models.
//!
//! Implements CART-style regression trees with variance-reduction splits,
//! plus a bagged random forest built on top of them. Gradient boosting
//! lives in the [`gradient_boosting`] submodule.

pub mod gradient_boosting;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TasarError};
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;

pub use gradient_boosting::{GradientBoostingRegressor, Loss};

/// Number of candidate features examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Consider every feature at every split.
    All,
    /// Consider `round(sqrt(p))` features.
    Sqrt,
    /// Consider `round(log2(p))` features.
    Log2,
}

impl MaxFeatures {
    /// Parses the textual form used in hyperparameter spaces.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than `"none"`, `"sqrt"`, or
    /// `"log2"`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::All),
            "sqrt" => Ok(Self::Sqrt),
            "log2" => Ok(Self::Log2),
            other => Err(TasarError::InvalidHyperparameter {
                param: "max_features".to_string(),
                value: other.to_string(),
                constraint: "must be one of none, sqrt, log2".to_string(),
            }),
        }
    }

    /// Resolves to a concrete feature count for `total` features.
    ///
    /// Always returns at least 1.
    #[must_use]
    pub fn n_features(&self, total: usize) -> usize {
        let k = match self {
            Self::All => total,
            Self::Sqrt => (total as f64).sqrt().round() as usize,
            Self::Log2 => (total as f64).log2().round() as usize,
        };
        k.clamp(1, total.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f32,
    },
    Internal {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict_one(&self, row: &[f32]) -> f32 {
        match self {
            Self::Leaf { value } => *value,
            Self::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict_one(row)
                } else {
                    right.predict_one(row)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

fn mean_of(y: &[f32], indices: &[usize]) -> f32 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f32>() / indices.len() as f32
}

fn variance_of(y: &[f32], indices: &[usize]) -> f32 {
    if indices.len() < 2 {
        return 0.0;
    }
    let mean = mean_of(y, indices);
    indices.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f32>() / indices.len() as f32
}

/// Candidate thresholds are the midpoints between consecutive distinct
/// feature values.
fn candidate_thresholds(x: &Matrix<f32>, indices: &[usize], feature: usize) -> Vec<f32> {
    let mut values: Vec<f32> = indices.iter().map(|&i| x.get(i, feature)).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values.dedup();

    values
        .windows(2)
        .map(|w| (w[0] + w[1]) / 2.0)
        .collect()
}

fn partition_by_threshold(
    x: &Matrix<f32>,
    indices: &[usize],
    feature: usize,
    threshold: f32,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &i in indices {
        if x.get(i, feature) <= threshold {
            left.push(i);
        } else {
            right.push(i);
        }
    }
    (left, right)
}

struct Split {
    feature: usize,
    threshold: f32,
    gain: f32,
    left: Vec<usize>,
    right: Vec<usize>,
}

struct TreeBuilder<'a> {
    x: &'a Matrix<f32>,
    y: &'a [f32],
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
}

impl TreeBuilder<'_> {
    fn build(&self, indices: &[usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let leaf = TreeNode::Leaf {
            value: mean_of(self.y, indices),
        };

        if indices.len() < self.min_samples_split {
            return leaf;
        }
        if let Some(max_depth) = self.max_depth {
            if depth >= max_depth {
                return leaf;
            }
        }
        if variance_of(self.y, indices) < 1e-12 {
            return leaf;
        }

        match self.find_best_split(indices, rng) {
            Some(split) => TreeNode::Internal {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(self.build(&split.left, depth + 1, rng)),
                right: Box::new(self.build(&split.right, depth + 1, rng)),
            },
            None => leaf,
        }
    }

    fn find_best_split(&self, indices: &[usize], rng: &mut StdRng) -> Option<Split> {
        let p = self.x.n_cols();
        let k = self.max_features.n_features(p);

        let features: Vec<usize> = if k < p {
            rand::seq::index::sample(rng, p, k).into_vec()
        } else {
            (0..p).collect()
        };

        let parent_variance = variance_of(self.y, indices);
        let n = indices.len() as f32;

        let mut best: Option<Split> = None;
        for feature in features {
            for threshold in candidate_thresholds(self.x, indices, feature) {
                let (left, right) = partition_by_threshold(self.x, indices, feature, threshold);
                if left.len() < self.min_samples_leaf || right.len() < self.min_samples_leaf {
                    continue;
                }

                let weighted = (left.len() as f32 * variance_of(self.y, &left)
                    + right.len() as f32 * variance_of(self.y, &right))
                    / n;
                let gain = parent_variance - weighted;
                if gain <= 1e-12 {
                    continue;
                }

                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Split {
                        feature,
                        threshold,
                        gain,
                        left,
                        right,
                    });
                }
            }
        }
        best
    }
}

/// CART regression tree minimizing within-node variance.
///
/// Splits greedily on the feature/threshold pair with the largest
/// variance reduction, subject to depth and sample-count constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    tree: Option<TreeNode>,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
    random_state: Option<u64>,
}

impl DecisionTreeRegressor {
    /// Creates an unconstrained regression tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            random_state: None,
        }
    }

    /// Limits tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split.max(2);
        self
    }

    /// Sets the minimum number of samples allowed in a leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf.max(1);
        self
    }

    /// Sets the per-split feature subsampling policy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Seeds feature subsampling for reproducible trees.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Returns the depth of the fitted tree, or 0 if unfitted.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tree.as_ref().map_or(0, TreeNode::depth)
    }

    /// Returns true once `fit` has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.tree.is_some()
    }
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for DecisionTreeRegressor {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        if x.n_rows() != y.len() {
            return Err(TasarError::DimensionMismatch {
                expected: x.n_rows(),
                actual: y.len(),
            });
        }
        if x.n_rows() == 0 {
            return Err("Cannot fit on empty dataset".into());
        }

        let builder = TreeBuilder {
            x,
            y: y.as_slice(),
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        };

        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let indices: Vec<usize> = (0..x.n_rows()).collect();
        self.tree = Some(builder.build(&indices, 0, &mut rng));
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let Some(tree) = &self.tree else {
            return Vector::from_vec(vec![0.0; x.n_rows()]);
        };

        let mut preds = Vec::with_capacity(x.n_rows());
        let mut row = vec![0.0_f32; x.n_cols()];
        for i in 0..x.n_rows() {
            for j in 0..x.n_cols() {
                row[j] = x.get(i, j);
            }
            preds.push(tree.predict_one(&row));
        }
        Vector::from_vec(preds)
    }
}

fn bootstrap_sample(n: usize, rng: &mut StdRng) -> Vec<usize> {
    let dist = Uniform::from(0..n);
    (0..n).map(|_| dist.sample(rng)).collect()
}

/// Random forest regressor: bagged variance-reduction trees.
///
/// Each tree is fitted on a bootstrap resample of the training data,
/// and predictions are averaged across trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
    random_state: Option<u64>,
}

impl RandomForestRegressor {
    /// Creates a forest with the given tree count.
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators: n_estimators.max(1),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            random_state: None,
        }
    }

    /// Limits the depth of every tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split.max(2);
        self
    }

    /// Sets the minimum number of samples allowed in a leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf.max(1);
        self
    }

    /// Sets the per-split feature subsampling policy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Seeds bootstrap resampling and feature subsampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Returns the number of fitted trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Estimator for RandomForestRegressor {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        if x.n_rows() != y.len() {
            return Err(TasarError::DimensionMismatch {
                expected: x.n_rows(),
                actual: y.len(),
            });
        }
        if x.n_rows() == 0 {
            return Err("Cannot fit on empty dataset".into());
        }

        self.trees = Vec::with_capacity(self.n_estimators);
        let n = x.n_rows();

        for t in 0..self.n_estimators {
            // Offset the seed per tree so trees differ while the whole
            // forest stays reproducible.
            let tree_seed = self.random_state.map(|s| s.wrapping_add(t as u64));
            let mut rng = match tree_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let sample = bootstrap_sample(n, &mut rng);
            let (x_boot, y_boot) = crate::model_selection::take_samples(x, y, &sample)?;

            let mut tree = DecisionTreeRegressor::new()
                .with_min_samples_split(self.min_samples_split)
                .with_min_samples_leaf(self.min_samples_leaf)
                .with_max_features(self.max_features);
            if let Some(depth) = self.max_depth {
                tree = tree.with_max_depth(depth);
            }
            if let Some(seed) = tree_seed {
                tree = tree.with_random_state(seed);
            }

            tree.fit(&x_boot, &y_boot)?;
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        if self.trees.is_empty() {
            return Vector::from_vec(vec![0.0; x.n_rows()]);
        }

        let mut sums = vec![0.0_f32; x.n_rows()];
        for tree in &self.trees {
            let preds = tree.predict(x);
            for (sum, p) in sums.iter_mut().zip(preds.as_slice()) {
                *sum += p;
            }
        }
        let count = self.trees.len() as f32;
        Vector::from_vec(sums.into_iter().map(|s| s / count).collect())
    }
}
