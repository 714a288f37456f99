//! Scaler + regressor pipeline.

use crate::error::Result;
use crate::metrics::r_squared;
use crate::preprocessing::StandardScaler;
use crate::primitives::{Matrix, Vector};
use crate::traits::{Estimator, Transformer};

/// Two-stage pipeline: standardize features, then fit a regressor.
///
/// The scaler learns its statistics during `fit` and applies them to
/// every later `predict`, so train and test data go through the same
/// transformation.
pub struct Pipeline {
    scaler: StandardScaler,
    regressor: Box<dyn Estimator>,
}

impl Pipeline {
    /// Wraps a regressor behind a standard scaler.
    #[must_use]
    pub fn new(regressor: Box<dyn Estimator>) -> Self {
        Self {
            scaler: StandardScaler::new(),
            regressor,
        }
    }

    /// Fits the scaler on `x`, then the regressor on scaled features.
    ///
    /// # Errors
    ///
    /// Propagates scaler and regressor fitting errors.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let scaled = self.scaler.fit_transform(x)?;
        self.regressor.fit(&scaled, y)
    }

    /// Predicts targets for `x` through the fitted pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline has not been fitted.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let scaled = self.scaler.transform(x)?;
        Ok(self.regressor.predict(&scaled))
    }

    /// R² of the pipeline's predictions against `y`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline has not been fitted.
    pub fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<f32> {
        let y_pred = self.predict(x)?;
        Ok(r_squared(&y_pred, y))
    }
}
