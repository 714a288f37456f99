//! Hyperparameter optimization.
//!
//! A typed search space plus two strategies: random search as the
//! baseline and a Tree-structured Parzen Estimator for model-based
//! sequential optimization.

pub mod params;
pub mod search;
pub mod tpe;

pub use params::{GenericParam, ParamKey};
pub use search::{
    HyperParam, ParamValue, RandomSearch, SearchSpace, SearchStrategy, Trial, TrialResult,
};
pub use tpe::{Tpe, TpeConfig};
