//! End-to-end experiment runs against a synthetic pricing dataset.

use std::io::Write;
use std::path::Path;

use tasar::automl::ParamValue;
use tasar::experiment::{run_experiments, ExperimentConfig};
use tasar::registry::ModelKind;

fn write_pricing_csv(dir: &Path, rows: usize) {
    let mut file = std::fs::File::create(dir.join("model_data.csv")).unwrap();
    writeln!(file, "sqft,bedrooms,age,price").unwrap();
    for i in 0..rows {
        let sqft = 700.0 + (i as f32) * 23.0;
        let bedrooms = 1 + (i % 5);
        let age = (i * 3) % 40;
        let price = 120.0 * sqft + 8_000.0 * bedrooms as f32 - 450.0 * age as f32
            + (i % 11) as f32 * 700.0;
        writeln!(file, "{sqft},{bedrooms},{age},{price}").unwrap();
    }
}

fn config_for(dir: &Path, n_iter: usize) -> ExperimentConfig {
    ExperimentConfig {
        data_path: dir.join("model_data.csv"),
        report_dir: dir.join("reports"),
        n_iter,
        ..ExperimentConfig::default()
    }
}

#[test]
fn lasso_run_writes_report_with_expected_columns() {
    let dir = tempfile::tempdir().unwrap();
    write_pricing_csv(dir.path(), 100);
    let config = config_for(dir.path(), 5);

    let results = run_experiments(&[ModelKind::Lasso], &config).unwrap();
    assert_eq!(results.len(), 1);

    let report = config.report_dir.join("model_results_Lasso.csv");
    let content = std::fs::read_to_string(&report).unwrap();
    let mut lines = content.lines();

    assert_eq!(lines.next().unwrap(), "Model,Score,regressor_model__alpha");

    let row: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(row[0], "Lasso");
    let score: f32 = row[1].parse().unwrap();
    assert!(score.is_finite());
    let alpha: f64 = row[2].parse().unwrap();
    assert!((1e-4..=1.0).contains(&alpha));
}

#[test]
fn subset_run_writes_one_report_per_model() {
    let dir = tempfile::tempdir().unwrap();
    write_pricing_csv(dir.path(), 80);
    let config = config_for(dir.path(), 2);

    let results =
        run_experiments(&[ModelKind::Lasso, ModelKind::DecisionTree], &config).unwrap();
    assert_eq!(results.len(), 2);
    assert!(config.report_dir.join("model_results_Lasso.csv").exists());
    assert!(config.report_dir.join("model_results_DT.csv").exists());
    assert!(!config.report_dir.join("model_results_RF.csv").exists());
}

#[test]
fn best_params_match_search_space_order() {
    let dir = tempfile::tempdir().unwrap();
    write_pricing_csv(dir.path(), 80);
    let config = config_for(dir.path(), 2);

    let results = run_experiments(&[ModelKind::DecisionTree], &config).unwrap();
    let names: Vec<&str> = results[0]
        .best_params
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "regressor_model__max_depth",
            "regressor_model__min_samples_leaf",
            "regressor_model__min_samples_split",
            "regressor_model__max_features",
        ]
    );

    // Values respect the space bounds
    for (name, value) in &results[0].best_params {
        match name.as_str() {
            "regressor_model__max_depth" => {
                let v = value.as_i64().unwrap();
                assert!((3..=17).contains(&v));
            }
            "regressor_model__max_features" => {
                assert!(matches!(
                    value,
                    ParamValue::String(s) if ["sqrt", "log2", "none"].contains(&s.as_str())
                ));
            }
            _ => {}
        }
    }
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_pricing_csv(dir.path(), 100);
    let config = config_for(dir.path(), 3);

    let first = run_experiments(&[ModelKind::Lasso], &config).unwrap();
    let second = run_experiments(&[ModelKind::Lasso], &config).unwrap();

    assert_eq!(first[0].score, second[0].score);
    assert_eq!(first[0].best_params, second[0].best_params);
}

#[test]
fn missing_dataset_fails_before_any_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), 2);

    assert!(run_experiments(&[ModelKind::Lasso], &config).is_err());
    assert!(!config.report_dir.join("model_results_Lasso.csv").exists());
}
