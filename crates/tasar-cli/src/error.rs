//! Error types for tasar-cli.

use thiserror::Error;

/// Result type alias for CLI operations
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// Bad command-line input
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Anything raised while loading data or running experiments
    #[error("{0}")]
    Experiment(#[from] tasar::TasarError),
}
