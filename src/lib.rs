//! Tasar: regression model benchmarking with Bayesian hyperparameter search.
//!
//! Tasar trains and compares regression models on a pricing dataset. Each
//! model's hyperparameters are tuned with a Tree-structured Parzen
//! Estimator, every trial is scored by k-fold cross-validation, and the
//! winning configuration is refitted and evaluated on a held-out split.
//!
//! # Quick Start
//!
//! ```
//! use tasar::prelude::*;
//!
//! // Create training data (y = 2*x + 1)
//! let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);
//!
//! // Train a Lasso regressor
//! let mut model = Lasso::new(0.001);
//! model.fit(&x, &y).unwrap();
//!
//! let r2 = model.score(&x, &y);
//! assert!(r2 > 0.99);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`data`]: CSV dataset loading
//! - [`linear_model`]: Lasso regression
//! - [`tree`]: Decision tree, random forest, and gradient boosting regressors
//! - [`metrics`]: Evaluation metrics
//! - [`model_selection`]: Cross-validation and train/test splitting
//! - [`preprocessing`]: Feature scaling
//! - [`pipeline`]: Scaler + regressor composition
//! - [`automl`]: Search spaces, random search, and TPE optimization
//! - [`registry`]: Model names, search spaces, and construction
//! - [`experiment`]: End-to-end experiment runner
//! - [`report`]: Result CSV persistence

pub mod automl;
pub mod data;
pub mod error;
pub mod experiment;
pub mod linear_model;
pub mod metrics;
pub mod model_selection;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod registry;
pub mod report;
pub mod traits;
pub mod tree;

pub use error::{Result, TasarError};
pub use primitives::{Matrix, Vector};
pub use traits::{Estimator, Transformer};
