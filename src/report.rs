//! Result persistence.
//!
//! Each finished experiment is written to its own CSV so partial progress
//! survives a crash in a later model.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::experiment::ModelResult;

/// Writes one model's result to `<dir>/model_results_<NAME>.csv`.
///
/// The file has a header row of `Model`, `Score`, then one column per
/// tuned hyperparameter in search space order, and a single data row.
/// The directory is created if missing and an existing file for the same
/// model is overwritten.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn write_model_result<P: AsRef<Path>>(dir: P, result: &ModelResult) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let path = dir.join(format!("model_results_{}.csv", result.model.name()));
    let mut writer = csv::Writer::from_path(&path)?;

    let mut header = vec!["Model".to_string(), "Score".to_string()];
    header.extend(result.best_params.iter().map(|(name, _)| name.clone()));
    writer.write_record(&header)?;

    let mut row = vec![result.model.name().to_string(), result.score.to_string()];
    row.extend(result.best_params.iter().map(|(_, v)| v.to_string()));
    writer.write_record(&row)?;

    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automl::ParamValue;
    use crate::registry::ModelKind;

    fn lasso_result() -> ModelResult {
        ModelResult {
            model: ModelKind::Lasso,
            score: 0.8731,
            best_params: vec![(
                "regressor_model__alpha".to_string(),
                ParamValue::Float(0.0123),
            )],
        }
    }

    #[test]
    fn test_writes_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model_result(dir.path(), &lasso_result()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "model_results_Lasso.csv"
        );

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "Model,Score,regressor_model__alpha");
        let row = lines.next().unwrap();
        assert!(row.starts_with("Lasso,0.8731,"));
        assert!(row.ends_with("0.0123"));
    }

    #[test]
    fn test_creates_missing_report_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports").join("run1");
        let path = write_model_result(&nested, &lasso_result()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_overwrites_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut result = lasso_result();
        write_model_result(dir.path(), &result).unwrap();

        result.score = 0.99;
        let path = write_model_result(dir.path(), &result).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("0.99"));
        assert!(!content.contains("0.8731"));
    }

    #[test]
    fn test_param_columns_follow_given_order() {
        let dir = tempfile::tempdir().unwrap();
        let result = ModelResult {
            model: ModelKind::DecisionTree,
            score: 0.5,
            best_params: vec![
                (
                    "regressor_model__max_depth".to_string(),
                    ParamValue::Int(7),
                ),
                (
                    "regressor_model__max_features".to_string(),
                    ParamValue::String("sqrt".to_string()),
                ),
            ],
        };
        let path = write_model_result(dir.path(), &result).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(
            "Model,Score,regressor_model__max_depth,regressor_model__max_features"
        ));
        assert!(content.contains("DT,0.5,7,sqrt"));
    }
}
