//! Linear models with coefficient regularization.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TasarError};
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;

/// Lasso regression (L1-regularized least squares).
///
/// Minimizes `(1/2n) * ||y - Xβ||² + α * ||β||₁` by cyclic coordinate
/// descent with soft-thresholding. The L1 penalty drives small
/// coefficients to exactly zero, giving sparse solutions.
///
/// # Examples
///
/// ```
/// use tasar::linear_model::Lasso;
/// use tasar::primitives::{Matrix, Vector};
/// use tasar::traits::Estimator;
///
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0]);
///
/// let mut model = Lasso::new(0.01);
/// model.fit(&x, &y).unwrap();
/// assert!(model.score(&x, &y) > 0.99);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lasso {
    alpha: f32,
    coefficients: Option<Vector<f32>>,
    intercept: f32,
    fit_intercept: bool,
    max_iter: usize,
    tol: f32,
}

impl Lasso {
    /// Creates a Lasso model with the given regularization strength.
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            max_iter: 1000,
            tol: 1e-4,
        }
    }

    /// Controls whether an intercept term is estimated.
    #[must_use]
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Sets the coordinate descent iteration cap.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance on coefficient updates.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Returns the regularization strength.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Returns fitted coefficients, if any.
    #[must_use]
    pub fn coefficients(&self) -> Option<&Vector<f32>> {
        self.coefficients.as_ref()
    }

    /// Returns the fitted intercept.
    #[must_use]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    /// Returns true once `fit` has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

fn soft_threshold(rho: f32, threshold: f32) -> f32 {
    if rho > threshold {
        rho - threshold
    } else if rho < -threshold {
        rho + threshold
    } else {
        0.0
    }
}

impl Estimator for Lasso {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        if self.alpha < 0.0 {
            return Err(TasarError::InvalidHyperparameter {
                param: "alpha".to_string(),
                value: self.alpha.to_string(),
                constraint: "must be non-negative".to_string(),
            });
        }
        if x.n_rows() != y.len() {
            return Err(TasarError::DimensionMismatch {
                expected: x.n_rows(),
                actual: y.len(),
            });
        }
        if x.n_rows() == 0 {
            return Err("Cannot fit on empty dataset".into());
        }

        let n = x.n_rows();
        let p = x.n_cols();
        let n_f = n as f32;

        // Center columns and target so the intercept drops out of the
        // coordinate updates.
        let mut x_means = vec![0.0_f32; p];
        let mut y_mean = 0.0_f32;
        if self.fit_intercept {
            for j in 0..p {
                x_means[j] = x.column(j).iter().sum::<f32>() / n_f;
            }
            y_mean = y.mean();
        }

        let mut centered = vec![0.0_f32; n * p];
        for i in 0..n {
            for j in 0..p {
                centered[i * p + j] = x.get(i, j) - x_means[j];
            }
        }

        let col_sq: Vec<f32> = (0..p)
            .map(|j| (0..n).map(|i| centered[i * p + j].powi(2)).sum())
            .collect();

        let mut beta = vec![0.0_f32; p];
        let mut residual: Vec<f32> = (0..n).map(|i| y[i] - y_mean).collect();
        let threshold = self.alpha * n_f;

        for _ in 0..self.max_iter {
            let mut max_delta = 0.0_f32;

            for j in 0..p {
                if col_sq[j] < 1e-12 {
                    beta[j] = 0.0;
                    continue;
                }

                // rho is the partial correlation with beta_j removed
                let mut rho = 0.0_f32;
                for i in 0..n {
                    rho += centered[i * p + j] * residual[i];
                }
                rho += beta[j] * col_sq[j];

                let new_beta = soft_threshold(rho, threshold) / col_sq[j];
                let delta = new_beta - beta[j];
                if delta != 0.0 {
                    for i in 0..n {
                        residual[i] -= delta * centered[i * p + j];
                    }
                }
                max_delta = max_delta.max(delta.abs());
                beta[j] = new_beta;
            }

            if max_delta < self.tol {
                break;
            }
        }

        self.intercept = if self.fit_intercept {
            let mut offset = y_mean;
            for j in 0..p {
                offset -= beta[j] * x_means[j];
            }
            offset
        } else {
            0.0
        };
        self.coefficients = Some(Vector::from_vec(beta));
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let Some(beta) = &self.coefficients else {
            return Vector::from_vec(vec![0.0; x.n_rows()]);
        };

        let mut preds = Vec::with_capacity(x.n_rows());
        for i in 0..x.n_rows() {
            let mut value = self.intercept;
            for j in 0..x.n_cols() {
                value += beta[j] * x.get(i, j);
            }
            preds.push(value);
        }
        Vector::from_vec(preds)
    }
}
