//! Tabular dataset loading.

use std::path::Path;

use crate::error::{Result, TasarError};
use crate::primitives::{Matrix, Vector};

/// A numeric feature table with one designated target column.
///
/// Loaded from CSV with a header row. Every non-target column becomes a
/// feature; all cells must parse as floating point numbers.
#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    features: Matrix<f32>,
    target: Vector<f32>,
}

impl Dataset {
    /// Loads a dataset from a CSV file, splitting out `target_column`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the target column is
    /// missing from the header, the table is empty, or any cell fails to
    /// parse as a number.
    pub fn from_csv<P: AsRef<Path>>(path: P, target_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        let target_idx = headers
            .iter()
            .position(|h| h == target_column)
            .ok_or_else(|| TasarError::MissingColumn {
                column: target_column.to_string(),
                path: path.display().to_string(),
            })?;

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut data = Vec::new();
        let mut target = Vec::new();
        let mut n_rows = 0;

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            for (col_idx, cell) in record.iter().enumerate() {
                let value: f32 = cell.trim().parse().map_err(|_| TasarError::InvalidCell {
                    row: row_idx + 1,
                    column: headers
                        .get(col_idx)
                        .unwrap_or("<unknown>")
                        .to_string(),
                    message: format!("cannot parse {cell:?} as a number"),
                })?;
                if col_idx == target_idx {
                    target.push(value);
                } else {
                    data.push(value);
                }
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(format!("No data rows in {}", path.display()).into());
        }

        let features = Matrix::from_vec(n_rows, feature_names.len(), data)?;
        Ok(Self {
            feature_names,
            features,
            target: Vector::from_vec(target),
        })
    }

    /// Feature column names, in file order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature matrix, one row per sample.
    #[must_use]
    pub fn features(&self) -> &Matrix<f32> {
        &self.features
    }

    /// Target values.
    #[must_use]
    pub fn target(&self) -> &Vector<f32> {
        &self.target
    }

    /// Number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.n_rows()
    }
}
