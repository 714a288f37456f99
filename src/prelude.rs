//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use tasar::prelude::*;
//! ```

pub use crate::linear_model::Lasso;
pub use crate::metrics::{mae, mse, r_squared, rmse};
pub use crate::pipeline::Pipeline;
pub use crate::preprocessing::StandardScaler;
pub use crate::primitives::{Matrix, Vector};
pub use crate::registry::ModelKind;
pub use crate::traits::{Estimator, Transformer};
pub use crate::tree::{
    DecisionTreeRegressor, GradientBoostingRegressor, RandomForestRegressor,
};
