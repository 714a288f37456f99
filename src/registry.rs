//! Model registry: names, search spaces, and estimator construction.
//!
//! Each model kind owns the hyperparameter space searched during tuning
//! and knows how to build a concrete estimator from one trial. Parameter
//! keys carry the `regressor_model__` prefix naming the pipeline stage
//! they configure, and that prefix flows through to report headers.

use crate::automl::{GenericParam, SearchSpace, Trial};
use crate::error::{Result, TasarError};
use crate::linear_model::Lasso;
use crate::traits::Estimator;
use crate::tree::{
    DecisionTreeRegressor, GradientBoostingRegressor, Loss, MaxFeatures, RandomForestRegressor,
};

const ALPHA: GenericParam = GenericParam("regressor_model__alpha");
const MAX_DEPTH: GenericParam = GenericParam("regressor_model__max_depth");
const MIN_SAMPLES_LEAF: GenericParam = GenericParam("regressor_model__min_samples_leaf");
const MIN_SAMPLES_SPLIT: GenericParam = GenericParam("regressor_model__min_samples_split");
const MAX_FEATURES: GenericParam = GenericParam("regressor_model__max_features");
const N_ESTIMATORS: GenericParam = GenericParam("regressor_model__n_estimators");
const LEARNING_RATE: GenericParam = GenericParam("regressor_model__learning_rate");
const LOSS: GenericParam = GenericParam("regressor_model__loss");

/// Seed handed to tree-based estimators so repeated runs of the same
/// trial give the same fit.
const ESTIMATOR_SEED: u64 = 0;

/// The regression models available for experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Lasso,
    DecisionTree,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    /// All registered models, in canonical order.
    #[must_use]
    pub fn all() -> [Self; 4] {
        [
            Self::Lasso,
            Self::DecisionTree,
            Self::RandomForest,
            Self::GradientBoosting,
        ]
    }

    /// Parses a model name as it appears on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`TasarError::UnknownModel`] for unregistered names.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "Lasso" => Ok(Self::Lasso),
            "DT" => Ok(Self::DecisionTree),
            "RF" => Ok(Self::RandomForest),
            "GBM" => Ok(Self::GradientBoosting),
            other => Err(TasarError::UnknownModel {
                name: other.to_string(),
            }),
        }
    }

    /// Parses a comma-separated list of model names.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown name; no partial list is returned.
    pub fn parse_list(names: &str) -> Result<Vec<Self>> {
        names
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Canonical short name, used in report filenames and output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lasso => "Lasso",
            Self::DecisionTree => "DT",
            Self::RandomForest => "RF",
            Self::GradientBoosting => "GBM",
        }
    }

    /// The hyperparameter space tuned for this model.
    #[must_use]
    pub fn search_space(&self) -> SearchSpace<GenericParam> {
        match self {
            Self::Lasso => SearchSpace::new().add_log_uniform(ALPHA, 1e-4, 1.0),
            Self::DecisionTree => SearchSpace::new()
                .add(MAX_DEPTH, 3..18)
                .add(MIN_SAMPLES_LEAF, 10..101)
                .add(MIN_SAMPLES_SPLIT, 2..51)
                .add_categorical(MAX_FEATURES, ["sqrt", "log2", "none"]),
            Self::RandomForest => SearchSpace::new()
                .add(N_ESTIMATORS, 200..1501)
                .add(MAX_DEPTH, 3..18)
                .add(MIN_SAMPLES_LEAF, 10..51)
                .add(MIN_SAMPLES_SPLIT, 3..21)
                .add_categorical(MAX_FEATURES, ["sqrt", "log2", "none"]),
            Self::GradientBoosting => SearchSpace::new()
                .add(N_ESTIMATORS, 2000..6001)
                .add_continuous(LEARNING_RATE, 0.01, 0.05)
                .add(MAX_DEPTH, 2..7)
                .add_categorical(MAX_FEATURES, ["sqrt"])
                .add(MIN_SAMPLES_LEAF, 10..21)
                .add(MIN_SAMPLES_SPLIT, 10..21)
                .add_categorical(LOSS, ["huber"]),
        }
    }

    /// Builds an unfitted estimator configured from `trial`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trial is missing a parameter this model
    /// needs, or a categorical value fails to parse.
    pub fn build(&self, trial: &Trial<GenericParam>) -> Result<Box<dyn Estimator>> {
        match self {
            Self::Lasso => {
                let alpha = require_f64(trial, &ALPHA, self)?;
                Ok(Box::new(Lasso::new(alpha as f32)))
            }
            Self::DecisionTree => {
                let max_features = require_str(trial, &MAX_FEATURES, self)?;
                Ok(Box::new(
                    DecisionTreeRegressor::new()
                        .with_max_depth(require_usize(trial, &MAX_DEPTH, self)?)
                        .with_min_samples_leaf(require_usize(trial, &MIN_SAMPLES_LEAF, self)?)
                        .with_min_samples_split(require_usize(trial, &MIN_SAMPLES_SPLIT, self)?)
                        .with_max_features(MaxFeatures::parse(max_features)?)
                        .with_random_state(ESTIMATOR_SEED),
                ))
            }
            Self::RandomForest => {
                let max_features = require_str(trial, &MAX_FEATURES, self)?;
                Ok(Box::new(
                    RandomForestRegressor::new(require_usize(trial, &N_ESTIMATORS, self)?)
                        .with_max_depth(require_usize(trial, &MAX_DEPTH, self)?)
                        .with_min_samples_leaf(require_usize(trial, &MIN_SAMPLES_LEAF, self)?)
                        .with_min_samples_split(require_usize(trial, &MIN_SAMPLES_SPLIT, self)?)
                        .with_max_features(MaxFeatures::parse(max_features)?)
                        .with_random_state(ESTIMATOR_SEED),
                ))
            }
            Self::GradientBoosting => {
                let max_features = require_str(trial, &MAX_FEATURES, self)?;
                let loss = require_str(trial, &LOSS, self)?;
                Ok(Box::new(
                    GradientBoostingRegressor::new()
                        .with_n_estimators(require_usize(trial, &N_ESTIMATORS, self)?)
                        .with_learning_rate(require_f64(trial, &LEARNING_RATE, self)? as f32)
                        .with_max_depth(require_usize(trial, &MAX_DEPTH, self)?)
                        .with_max_features(MaxFeatures::parse(max_features)?)
                        .with_min_samples_leaf(require_usize(trial, &MIN_SAMPLES_LEAF, self)?)
                        .with_min_samples_split(require_usize(trial, &MIN_SAMPLES_SPLIT, self)?)
                        .with_loss(Loss::parse(loss)?)
                        .with_random_state(ESTIMATOR_SEED),
                ))
            }
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn missing(key: &GenericParam, model: &ModelKind) -> TasarError {
    format!("Trial is missing parameter {} for model {}", key.0, model.name()).into()
}

fn require_f64(trial: &Trial<GenericParam>, key: &GenericParam, model: &ModelKind) -> Result<f64> {
    trial.get_f64(key).ok_or_else(|| missing(key, model))
}

fn require_usize(
    trial: &Trial<GenericParam>,
    key: &GenericParam,
    model: &ModelKind,
) -> Result<usize> {
    trial.get_usize(key).ok_or_else(|| missing(key, model))
}

fn require_str<'a>(
    trial: &'a Trial<GenericParam>,
    key: &GenericParam,
    model: &ModelKind,
) -> Result<&'a str> {
    trial.get_str(key).ok_or_else(|| missing(key, model))
}
