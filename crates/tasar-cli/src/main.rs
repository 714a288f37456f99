//! tasar - regression model experiment runner
//!
//! Usage:
//!   tasar --model_names_list=Lasso,DT,RF,GBM --n_iter=10
//!
//! Reads `model_data.csv` from the working directory, tunes each requested
//! model with TPE-based hyperparameter search, and writes one result CSV
//! per model under `reports/`.

use std::process::ExitCode;

use clap::Parser;

use tasar::experiment::{load_split, run_model, ExperimentConfig};
use tasar::registry::ModelKind;
use tasar::report::write_model_result;

mod error;
mod output;

use error::{CliError, Result};

/// Runs experiments with Bayesian hyperparameter search for selected
/// regression models on the pricing dataset.
#[derive(Parser)]
#[command(name = "tasar")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Comma-separated list of models to run (Lasso, DT, RF, GBM)
    #[arg(long = "model_names_list")]
    model_names_list: String,

    /// Number of iterations for hyperparameter tuning
    #[arg(long = "n_iter")]
    n_iter: usize,
}

fn run(cli: &Cli) -> Result<()> {
    let models = ModelKind::parse_list(&cli.model_names_list)?;
    if models.is_empty() {
        return Err(CliError::InvalidArguments(
            "model_names_list must name at least one model".to_string(),
        ));
    }
    if cli.n_iter == 0 {
        return Err(CliError::InvalidArguments(
            "n_iter must be at least 1".to_string(),
        ));
    }

    let config = ExperimentConfig {
        n_iter: cli.n_iter,
        ..ExperimentConfig::default()
    };

    output::info("Loading models...");
    let data = load_split(&config)?;

    for kind in models {
        output::section(&format!("Running experiments for {kind}"));
        let result = run_model(kind, &data, &config)?;
        let path = write_model_result(&config.report_dir, &result)?;
        output::kv("Score", result.score);
        output::kv("Report", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Errors are reported but do not fail the process, so a long batch
    // invoked from a script keeps whatever reports were already written.
    if let Err(e) = run(&cli) {
        eprintln!("An error occurred: {e}");
    }
    ExitCode::SUCCESS
}
