//! Experiment runner: tune, refit, score, report.
//!
//! For each requested model, runs TPE hyperparameter search where every
//! trial is scored by k-fold cross-validation on the training split,
//! refits the best configuration on the full training split, and reports
//! R² on the held-out test split.

use std::path::PathBuf;

use crate::automl::{GenericParam, ParamKey, ParamValue, SearchStrategy, Tpe, Trial, TrialResult};
use crate::data::Dataset;
use crate::error::Result;
use crate::model_selection::{take_samples, train_test_split, KFold};
use crate::pipeline::Pipeline;
use crate::primitives::{Matrix, Vector};
use crate::registry::ModelKind;
use crate::report::write_model_result;

/// Column holding the regression target in the input CSV.
pub const TARGET_COLUMN: &str = "price";

/// Settings shared by every model in a run.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Input CSV with features and a `price` column.
    pub data_path: PathBuf,
    /// Directory receiving one result CSV per model.
    pub report_dir: PathBuf,
    /// Hyperparameter search budget per model.
    pub n_iter: usize,
    /// Fraction of rows held out for final scoring.
    pub test_size: f32,
    /// Seed for the train/test split.
    pub split_seed: u64,
    /// Seed for the hyperparameter optimizer.
    pub search_seed: u64,
    /// Folds used to score each trial on the training split.
    pub cv_folds: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("model_data.csv"),
            report_dir: PathBuf::from("reports"),
            n_iter: 10,
            test_size: 0.2,
            split_seed: 42,
            search_seed: 7,
            cv_folds: 5,
        }
    }
}

/// Train/test partition of a loaded dataset.
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: Matrix<f32>,
    pub x_test: Matrix<f32>,
    pub y_train: Vector<f32>,
    pub y_test: Vector<f32>,
}

/// Loads the dataset and performs the seeded train/test split.
///
/// # Errors
///
/// Propagates dataset loading and split validation errors.
pub fn load_split(config: &ExperimentConfig) -> Result<SplitData> {
    let dataset = Dataset::from_csv(&config.data_path, TARGET_COLUMN)?;
    let (x_train, x_test, y_train, y_test) = train_test_split(
        dataset.features(),
        dataset.target(),
        config.test_size,
        Some(config.split_seed),
    )?;
    Ok(SplitData {
        x_train,
        x_test,
        y_train,
        y_test,
    })
}

/// Outcome of tuning and evaluating one model.
#[derive(Debug, Clone)]
pub struct ModelResult {
    /// Which model was tuned.
    pub model: ModelKind,
    /// R² on the held-out test split after refitting the best trial.
    pub score: f32,
    /// Best hyperparameters, in search space declaration order.
    pub best_params: Vec<(String, ParamValue)>,
}

/// Mean cross-validated R² for one trial on the training split.
///
/// A fresh pipeline is built for every fold so no state leaks between
/// folds.
///
/// # Errors
///
/// Fails if the training split has fewer samples than folds.
fn cross_val_score(
    kind: ModelKind,
    trial: &Trial<GenericParam>,
    data: &SplitData,
    cv_folds: usize,
) -> Result<f32> {
    let n_train = data.x_train.n_rows();
    if n_train < cv_folds {
        return Err(format!(
            "Training split has {n_train} samples, fewer than the {cv_folds} cross-validation folds"
        )
        .into());
    }

    let kfold = KFold::new(cv_folds);
    let folds = kfold.split(data.x_train.n_rows());

    let mut total = 0.0_f32;
    for (train_idx, val_idx) in &folds {
        let (x_fit, y_fit) = take_samples(&data.x_train, &data.y_train, train_idx)?;
        let (x_val, y_val) = take_samples(&data.x_train, &data.y_train, val_idx)?;

        let mut pipeline = Pipeline::new(kind.build(trial)?);
        pipeline.fit(&x_fit, &y_fit)?;
        total += pipeline.score(&x_val, &y_val)?;
    }
    Ok(total / folds.len() as f32)
}

/// Tunes one model, refits the winner, and scores it on the test split.
///
/// # Errors
///
/// Propagates estimator construction, fitting, and scoring errors. Also
/// fails if the search produces no trials (zero budget).
pub fn run_model(kind: ModelKind, data: &SplitData, config: &ExperimentConfig) -> Result<ModelResult> {
    let space = kind.search_space();
    let mut optimizer = Tpe::new(config.n_iter).with_seed(config.search_seed);

    let mut best: Option<TrialResult<GenericParam>> = None;

    loop {
        let trials = optimizer.suggest(&space, 1);
        if trials.is_empty() {
            break;
        }

        let mut results = Vec::with_capacity(trials.len());
        for trial in trials {
            let score = f64::from(cross_val_score(kind, &trial, data, config.cv_folds)?);
            results.push(TrialResult { trial, score });
        }
        optimizer.update(&space, &results);

        for result in results {
            if best.as_ref().map_or(true, |b| result.score > b.score) {
                best = Some(result);
            }
        }
    }

    let best = best.ok_or_else(|| {
        crate::error::TasarError::from(format!(
            "No trials evaluated for model {} (n_iter = {})",
            kind.name(),
            config.n_iter
        ))
    })?;

    // Refit the winning configuration on the whole training split and
    // score it on data the search never saw.
    let mut pipeline = Pipeline::new(kind.build(&best.trial)?);
    pipeline.fit(&data.x_train, &data.y_train)?;
    let score = pipeline.score(&data.x_test, &data.y_test)?;

    let best_params: Vec<(String, ParamValue)> = space
        .iter()
        .filter_map(|(key, _)| {
            best.trial
                .get(key)
                .map(|v| (key.name().to_string(), v.clone()))
        })
        .collect();

    Ok(ModelResult {
        model: kind,
        score,
        best_params,
    })
}

/// Runs experiments for every requested model.
///
/// Each model's report is written as soon as that model finishes, so an
/// error in a later model cannot lose earlier results.
///
/// # Errors
///
/// Returns the first error encountered; reports written before the
/// failure remain on disk.
pub fn run_experiments(
    models: &[ModelKind],
    config: &ExperimentConfig,
) -> Result<Vec<ModelResult>> {
    let data = load_split(config)?;

    let mut results = Vec::with_capacity(models.len());
    for &kind in models {
        let result = run_model(kind, &data, config)?;
        write_model_result(&config.report_dir, &result)?;
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_pricing_csv(dir: &std::path::Path, rows: usize) -> PathBuf {
        let path = dir.join("model_data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "sqft,bedrooms,price").unwrap();
        for i in 0..rows {
            let sqft = 800.0 + (i as f32) * 37.0;
            let bedrooms = 1 + (i % 4);
            let price = 150.0 * sqft + 10_000.0 * bedrooms as f32 + (i % 7) as f32 * 500.0;
            writeln!(file, "{sqft},{bedrooms},{price}").unwrap();
        }
        path
    }

    fn test_config(dir: &std::path::Path, n_iter: usize) -> ExperimentConfig {
        ExperimentConfig {
            data_path: dir.join("model_data.csv"),
            report_dir: dir.join("reports"),
            n_iter,
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn test_load_split_sizes() {
        let dir = tempfile::tempdir().unwrap();
        write_pricing_csv(dir.path(), 50);
        let config = test_config(dir.path(), 1);

        let data = load_split(&config).unwrap();
        assert_eq!(data.x_train.n_rows(), 40);
        assert_eq!(data.x_test.n_rows(), 10);
        assert_eq!(data.y_train.len(), 40);
        assert_eq!(data.y_test.len(), 10);
    }

    #[test]
    fn test_load_split_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write_pricing_csv(dir.path(), 50);
        let config = test_config(dir.path(), 1);

        let a = load_split(&config).unwrap();
        let b = load_split(&config).unwrap();
        assert_eq!(a.y_test.as_slice(), b.y_test.as_slice());
    }

    #[test]
    fn test_run_model_lasso() {
        let dir = tempfile::tempdir().unwrap();
        write_pricing_csv(dir.path(), 60);
        let config = test_config(dir.path(), 5);
        let data = load_split(&config).unwrap();

        let result = run_model(ModelKind::Lasso, &data, &config).unwrap();
        assert_eq!(result.model, ModelKind::Lasso);
        // Near-linear data, any alpha in range fits well
        assert!(result.score > 0.9, "score was {}", result.score);
        assert_eq!(result.best_params.len(), 1);

        let (name, value) = &result.best_params[0];
        assert_eq!(name, "regressor_model__alpha");
        let alpha = value.as_f64().unwrap();
        assert!((1e-4..=1.0).contains(&alpha));
    }

    #[test]
    fn test_run_model_zero_budget_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_pricing_csv(dir.path(), 40);
        let config = test_config(dir.path(), 0);
        let data = load_split(&config).unwrap();

        assert!(run_model(ModelKind::Lasso, &data, &config).is_err());
    }

    #[test]
    fn test_run_experiments_writes_report_per_model() {
        let dir = tempfile::tempdir().unwrap();
        write_pricing_csv(dir.path(), 60);
        let config = test_config(dir.path(), 2);

        let results =
            run_experiments(&[ModelKind::Lasso, ModelKind::DecisionTree], &config).unwrap();
        assert_eq!(results.len(), 2);
        assert!(config.report_dir.join("model_results_Lasso.csv").exists());
        assert!(config.report_dir.join("model_results_DT.csv").exists());
    }

    #[test]
    fn test_run_experiments_tiny_dataset_errors_without_panic() {
        // 5 rows leave a 4-row training split, fewer than the 5 default
        // cross-validation folds.
        let dir = tempfile::tempdir().unwrap();
        write_pricing_csv(dir.path(), 5);
        let config = test_config(dir.path(), 2);

        let err = run_experiments(&[ModelKind::Lasso], &config).unwrap_err();
        assert!(err.to_string().contains("cross-validation folds"));
        assert!(!config.report_dir.join("model_results_Lasso.csv").exists());
    }

    #[test]
    fn test_run_experiments_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 2);
        assert!(run_experiments(&[ModelKind::Lasso], &config).is_err());
    }

    #[test]
    fn test_run_model_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write_pricing_csv(dir.path(), 60);
        let config = test_config(dir.path(), 3);
        let data = load_split(&config).unwrap();

        let a = run_model(ModelKind::Lasso, &data, &config).unwrap();
        let b = run_model(ModelKind::Lasso, &data, &config).unwrap();
        assert_eq!(a.score, b.score);
        assert_eq!(a.best_params, b.best_params);
    }
}
