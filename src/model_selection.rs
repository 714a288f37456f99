//! Model selection utilities.
//!
//! Provides train/test splitting and k-fold cross-validation index
//! generation. Both accept an optional seed and are fully deterministic
//! when one is given.

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Result, TasarError};
use crate::primitives::{Matrix, Vector};

fn validate_split_inputs(x: &Matrix<f32>, y: &Vector<f32>, test_size: f32) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(TasarError::DimensionMismatch {
            expected: x.n_rows(),
            actual: y.len(),
        });
    }
    if x.n_rows() == 0 {
        return Err("Cannot split empty dataset".into());
    }
    if !(0.0..1.0).contains(&test_size) || test_size <= 0.0 {
        return Err(format!(
            "test_size must be in (0, 1), got {test_size}"
        )
        .into());
    }
    Ok(())
}

fn shuffle_indices(n: usize, random_state: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    match random_state {
        Some(seed) => {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
        }
        None => {
            let mut rng = rand::thread_rng();
            indices.shuffle(&mut rng);
        }
    }
    indices
}

fn extract_samples(
    x: &Matrix<f32>,
    y: &Vector<f32>,
    indices: &[usize],
) -> Result<(Matrix<f32>, Vector<f32>)> {
    let n_cols = x.n_cols();
    let mut data = Vec::with_capacity(indices.len() * n_cols);
    let mut targets = Vec::with_capacity(indices.len());
    for &i in indices {
        for j in 0..n_cols {
            data.push(x.get(i, j));
        }
        targets.push(y[i]);
    }
    let matrix = Matrix::from_vec(indices.len(), n_cols, data)?;
    Ok((matrix, Vector::from_vec(targets)))
}

/// Splits features and targets into random train and test subsets.
///
/// Rows are shuffled before splitting. With `random_state` set, the split
/// is identical across calls.
///
/// # Errors
///
/// Returns an error if `x` and `y` disagree on sample count, the dataset
/// is empty, or `test_size` is outside `(0, 1)`.
///
/// # Examples
///
/// ```
/// use tasar::model_selection::train_test_split;
/// use tasar::primitives::{Matrix, Vector};
///
/// let x = Matrix::from_vec(10, 1, (0..10).map(|v| v as f32).collect()).unwrap();
/// let y = Vector::from_vec((0..10).map(|v| v as f32).collect());
/// let (x_train, x_test, y_train, y_test) =
///     train_test_split(&x, &y, 0.2, Some(42)).unwrap();
/// assert_eq!(x_train.n_rows(), 8);
/// assert_eq!(x_test.n_rows(), 2);
/// assert_eq!(y_train.len(), 8);
/// assert_eq!(y_test.len(), 2);
/// ```
pub fn train_test_split(
    x: &Matrix<f32>,
    y: &Vector<f32>,
    test_size: f32,
    random_state: Option<u64>,
) -> Result<(Matrix<f32>, Matrix<f32>, Vector<f32>, Vector<f32>)> {
    validate_split_inputs(x, y, test_size)?;

    let n_samples = x.n_rows();
    let n_test = ((n_samples as f32) * test_size).round() as usize;
    let n_test = n_test.clamp(1, n_samples - 1);

    let indices = shuffle_indices(n_samples, random_state);
    let (test_idx, train_idx) = indices.split_at(n_test);

    let (x_train, y_train) = extract_samples(x, y, train_idx)?;
    let (x_test, y_test) = extract_samples(x, y, test_idx)?;

    Ok((x_train, x_test, y_train, y_test))
}

/// K-fold cross-validation index generator.
///
/// Splits `n` samples into `n_splits` consecutive folds. Each fold serves
/// once as the validation set while the remaining folds form the training
/// set. Optional shuffling with a seed makes fold assignment reproducible.
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl KFold {
    /// Creates a k-fold splitter without shuffling.
    ///
    /// # Panics
    ///
    /// Panics if `n_splits < 2`.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        assert!(n_splits >= 2, "n_splits must be at least 2");
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    /// Enables shuffling before fold assignment.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Sets the seed used when shuffling is enabled.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Returns the number of folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generates `(train_indices, validation_indices)` pairs for `n` samples.
    ///
    /// The first `n % n_splits` folds receive one extra sample so every
    /// index appears in exactly one validation fold.
    ///
    /// # Panics
    ///
    /// Panics if `n < n_splits`.
    #[must_use]
    pub fn split(&self, n: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        assert!(
            n >= self.n_splits,
            "Cannot split {n} samples into {} folds",
            self.n_splits
        );

        let indices = if self.shuffle {
            shuffle_indices(n, self.random_state)
        } else {
            (0..n).collect()
        };

        let base = n / self.n_splits;
        let remainder = n % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < remainder);
            let val: Vec<usize> = indices[start..start + size].to_vec();
            let train: Vec<usize> = indices[..start]
                .iter()
                .chain(indices[start + size..].iter())
                .copied()
                .collect();
            folds.push((train, val));
            start += size;
        }
        folds
    }
}

/// Gathers the rows of `x` and entries of `y` selected by `indices`.
///
/// # Errors
///
/// Returns an error if any index is out of bounds.
pub fn take_samples(
    x: &Matrix<f32>,
    y: &Vector<f32>,
    indices: &[usize],
) -> Result<(Matrix<f32>, Vector<f32>)> {
    if let Some(&bad) = indices.iter().find(|&&i| i >= x.n_rows()) {
        return Err(format!("Index {bad} out of bounds for {} rows", x.n_rows()).into());
    }
    extract_samples(x, y, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data(n: usize) -> (Matrix<f32>, Vector<f32>) {
        let x = Matrix::from_vec(n, 2, (0..n * 2).map(|v| v as f32).collect()).unwrap();
        let y = Vector::from_vec((0..n).map(|v| v as f32).collect());
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = sample_data(10);
        let (x_train, x_test, y_train, y_test) =
            train_test_split(&x, &y, 0.3, Some(0)).unwrap();
        assert_eq!(x_train.n_rows(), 7);
        assert_eq!(x_test.n_rows(), 3);
        assert_eq!(y_train.len(), 7);
        assert_eq!(y_test.len(), 3);
    }

    #[test]
    fn test_split_deterministic_with_seed() {
        let (x, y) = sample_data(20);
        let (a_train, _, _, _) = train_test_split(&x, &y, 0.2, Some(42)).unwrap();
        let (b_train, _, _, _) = train_test_split(&x, &y, 0.2, Some(42)).unwrap();
        assert_eq!(a_train.as_slice(), b_train.as_slice());
    }

    #[test]
    fn test_split_rows_stay_paired() {
        let (x, y) = sample_data(12);
        let (x_train, _, y_train, _) = train_test_split(&x, &y, 0.25, Some(1)).unwrap();
        // y equals the row index, and column 1 equals 2 * row + 1
        for i in 0..x_train.n_rows() {
            let row = y_train[i] as usize;
            assert_eq!(x_train.get(i, 1), (row * 2 + 1) as f32);
        }
    }

    #[test]
    fn test_split_invalid_test_size() {
        let (x, y) = sample_data(5);
        assert!(train_test_split(&x, &y, 0.0, None).is_err());
        assert!(train_test_split(&x, &y, 1.0, None).is_err());
        assert!(train_test_split(&x, &y, 1.5, None).is_err());
    }

    #[test]
    fn test_split_mismatched_lengths() {
        let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let y = Vector::from_slice(&[1.0, 2.0]);
        assert!(train_test_split(&x, &y, 0.5, None).is_err());
    }

    #[test]
    fn test_kfold_covers_every_index_once() {
        let kfold = KFold::new(4);
        let folds = kfold.split(10);
        assert_eq!(folds.len(), 4);

        let mut seen = vec![0_usize; 10];
        for (train, val) in &folds {
            assert_eq!(train.len() + val.len(), 10);
            for &i in val {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_kfold_uneven_fold_sizes() {
        let folds = KFold::new(3).split(10);
        let sizes: Vec<usize> = folds.iter().map(|(_, val)| val.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_kfold_shuffle_deterministic() {
        let a = KFold::new(5).with_shuffle(true).with_random_state(7).split(25);
        let b = KFold::new(5).with_shuffle(true).with_random_state(7).split(25);
        assert_eq!(a, b);
    }

    #[test]
    fn test_kfold_train_excludes_validation() {
        let folds = KFold::new(3).with_shuffle(true).with_random_state(0).split(9);
        for (train, val) in &folds {
            for i in val {
                assert!(!train.contains(i));
            }
        }
    }

    #[test]
    #[should_panic(expected = "at least 2")]
    fn test_kfold_requires_two_splits() {
        let _ = KFold::new(1);
    }

    #[test]
    fn test_take_samples() {
        let (x, y) = sample_data(5);
        let (xs, ys) = take_samples(&x, &y, &[4, 0]).unwrap();
        assert_eq!(xs.n_rows(), 2);
        assert_eq!(ys[0], 4.0);
        assert_eq!(ys[1], 0.0);
    }

    #[test]
    fn test_take_samples_out_of_bounds() {
        let (x, y) = sample_data(3);
        assert!(take_samples(&x, &y, &[5]).is_err());
    }
}
