//! Gradient boosted regression trees.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TasarError};
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;

use super::{DecisionTreeRegressor, MaxFeatures};

/// Loss function minimized by the boosting stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Loss {
    /// Plain least squares. Pseudo-residuals are the raw residuals.
    SquaredError,
    /// Huber loss. Residuals beyond the transition point are clipped,
    /// making the fit robust to outliers.
    Huber,
}

impl Loss {
    /// Parses the textual form used in hyperparameter spaces.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than `"squared_error"` or
    /// `"huber"`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "squared_error" => Ok(Self::SquaredError),
            "huber" => Ok(Self::Huber),
            other => Err(TasarError::InvalidHyperparameter {
                param: "loss".to_string(),
                value: other.to_string(),
                constraint: "must be one of squared_error, huber".to_string(),
            }),
        }
    }
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Empirical quantile by linear interpolation between order statistics.
fn quantile(values: &[f32], q: f32) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let pos = q * (n - 1) as f32;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f32;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Gradient boosting regressor with shallow tree base learners.
///
/// Each stage fits a regression tree to the pseudo-residuals of the
/// current ensemble and adds its predictions scaled by the learning rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    estimators: Vec<DecisionTreeRegressor>,
    init_prediction: f32,
    n_estimators: usize,
    learning_rate: f32,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: MaxFeatures,
    loss: Loss,
    random_state: Option<u64>,
}

impl GradientBoostingRegressor {
    /// Creates a boosting ensemble with default stage count and shrinkage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            estimators: Vec::new(),
            init_prediction: 0.0,
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            loss: Loss::SquaredError,
            random_state: None,
        }
    }

    /// Sets the number of boosting stages.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators.max(1);
        self
    }

    /// Sets the shrinkage applied to each stage's contribution.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Limits the depth of every stage tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
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

    /// Selects the loss function.
    #[must_use]
    pub fn with_loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    /// Seeds per-stage feature subsampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Returns the number of fitted stages.
    #[must_use]
    pub fn n_stages(&self) -> usize {
        self.estimators.len()
    }

    fn pseudo_residuals(&self, residuals: &[f32]) -> Vec<f32> {
        match self.loss {
            Loss::SquaredError => residuals.to_vec(),
            Loss::Huber => {
                let abs: Vec<f32> = residuals.iter().map(|r| r.abs()).collect();
                let delta = quantile(&abs, 0.9).max(1e-10);
                residuals
                    .iter()
                    .map(|&r| if r.abs() <= delta { r } else { delta * r.signum() })
                    .collect()
            }
        }
    }
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for GradientBoostingRegressor {
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
        if self.learning_rate <= 0.0 {
            return Err(TasarError::InvalidHyperparameter {
                param: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                constraint: "must be positive".to_string(),
            });
        }

        self.init_prediction = match self.loss {
            Loss::SquaredError => y.mean(),
            Loss::Huber => median(y.as_slice()),
        };

        let n = x.n_rows();
        let mut raw = vec![self.init_prediction; n];
        self.estimators = Vec::with_capacity(self.n_estimators);

        for m in 0..self.n_estimators {
            let residuals: Vec<f32> = (0..n).map(|i| y[i] - raw[i]).collect();
            let targets = Vector::from_vec(self.pseudo_residuals(&residuals));

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(self.max_depth)
                .with_min_samples_split(self.min_samples_split)
                .with_min_samples_leaf(self.min_samples_leaf)
                .with_max_features(self.max_features);
            if let Some(seed) = self.random_state {
                tree = tree.with_random_state(seed.wrapping_add(m as u64));
            }
            tree.fit(x, &targets)?;

            let update = tree.predict(x);
            for i in 0..n {
                raw[i] += self.learning_rate * update[i];
            }
            self.estimators.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let mut preds = vec![self.init_prediction; x.n_rows()];
        for tree in &self.estimators {
            let stage = tree.predict(x);
            for (p, s) in preds.iter_mut().zip(stage.as_slice()) {
                *p += self.learning_rate * s;
            }
        }
        Vector::from_vec(preds)
    }
}
