//! Error types for tasar operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for tasar operations.
///
/// Covers dimension mismatches, invalid hyperparameters, dataset problems,
/// and I/O failures.
///
/// # Examples
///
/// ```
/// use tasar::error::TasarError;
///
/// let err = TasarError::DimensionMismatch {
///     expected: 100,
///     actual: 50,
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug)]
pub enum TasarError {
    /// Sample or feature counts don't match for the operation.
    DimensionMismatch {
        /// Expected count
        expected: usize,
        /// Actual count found
        actual: usize,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Requested model name is not in the registry.
    UnknownModel {
        /// The name as given on the command line
        name: String,
    },

    /// Dataset is missing a required column.
    MissingColumn {
        /// Column name
        column: String,
        /// Dataset path
        path: String,
    },

    /// A dataset cell could not be parsed as a number.
    InvalidCell {
        /// 1-based data row (excluding the header)
        row: usize,
        /// Column name
        column: String,
        /// Parse failure detail
        message: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// CSV read/write error.
    Csv(csv::Error),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for TasarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TasarError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
            TasarError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            TasarError::UnknownModel { name } => {
                write!(f, "Unknown model name: {name}")
            }
            TasarError::MissingColumn { column, path } => {
                write!(f, "Column '{column}' not found in {path}")
            }
            TasarError::InvalidCell {
                row,
                column,
                message,
            } => {
                write!(f, "Row {row}, column '{column}': {message}")
            }
            TasarError::Io(e) => write!(f, "I/O error: {e}"),
            TasarError::Csv(e) => write!(f, "CSV error: {e}"),
            TasarError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for TasarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TasarError::Io(e) => Some(e),
            TasarError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TasarError {
    fn from(err: std::io::Error) -> Self {
        TasarError::Io(err)
    }
}

impl From<csv::Error> for TasarError {
    fn from(err: csv::Error) -> Self {
        TasarError::Csv(err)
    }
}

impl From<&str> for TasarError {
    fn from(msg: &str) -> Self {
        TasarError::Other(msg.to_string())
    }
}

impl From<String> for TasarError {
    fn from(msg: String) -> Self {
        TasarError::Other(msg)
    }
}

/// Result type alias using [`TasarError`].
pub type Result<T> = std::result::Result<T, TasarError>;
