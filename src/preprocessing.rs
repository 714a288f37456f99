//! Data preprocessing utilities.
//!
//! Feature scaling for use ahead of linear and tree-based regressors.

use crate::error::Result;
use crate::primitives::Matrix;
use crate::traits::Transformer;

/// Standardizes features by removing the mean and scaling to unit variance.
///
/// The transform computes `z = (x - mean) / std` per feature. Statistics are
/// learned on `fit` and reused for every subsequent `transform`, so test data
/// is scaled with training statistics.
///
/// # Examples
///
/// ```
/// use tasar::preprocessing::StandardScaler;
/// use tasar::primitives::Matrix;
/// use tasar::traits::Transformer;
///
/// let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&x).unwrap();
/// assert!((scaled.get(1, 0)).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Option<Vec<f32>>,
    std: Option<Vec<f32>>,
    with_mean: bool,
    with_std: bool,
}

impl StandardScaler {
    /// Creates a new scaler that centers and scales.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            with_mean: true,
            with_std: true,
        }
    }

    /// Controls whether features are centered before scaling.
    #[must_use]
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Controls whether features are scaled to unit variance.
    #[must_use]
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.with_std = with_std;
        self
    }

    /// Returns learned per-feature means, if fitted.
    #[must_use]
    pub fn mean(&self) -> Option<&[f32]> {
        self.mean.as_deref()
    }

    /// Returns learned per-feature standard deviations, if fitted.
    #[must_use]
    pub fn std(&self) -> Option<&[f32]> {
        self.std.as_deref()
    }

    /// Returns true once `fit` has been called.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some() && self.std.is_some()
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        if x.n_rows() == 0 {
            return Err("Cannot fit scaler on empty matrix".into());
        }

        let n_features = x.n_cols();
        let n_samples = x.n_rows() as f32;

        let mut means = vec![0.0_f32; n_features];
        let mut stds = vec![1.0_f32; n_features];

        for j in 0..n_features {
            let col = x.column(j);
            let mean = col.iter().sum::<f32>() / n_samples;
            means[j] = mean;

            // Population standard deviation
            let variance = col.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n_samples;
            let std = variance.sqrt();
            // Guard against zero-variance columns
            stds[j] = if std < 1e-10 { 1.0 } else { std };
        }

        self.mean = Some(means);
        self.std = Some(stds);
        Ok(())
    }

    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let (Some(means), Some(stds)) = (&self.mean, &self.std) else {
            return Err("StandardScaler must be fitted before transform".into());
        };

        if x.n_cols() != means.len() {
            return Err(crate::error::TasarError::DimensionMismatch {
                expected: means.len(),
                actual: x.n_cols(),
            });
        }

        let mut data = Vec::with_capacity(x.n_rows() * x.n_cols());
        for i in 0..x.n_rows() {
            for j in 0..x.n_cols() {
                let mut v = x.get(i, j);
                if self.with_mean {
                    v -= means[j];
                }
                if self.with_std {
                    v /= stds[j];
                }
                data.push(v);
            }
        }

        Matrix::from_vec(x.n_rows(), x.n_cols(), data).map_err(Into::into)
    }
}
