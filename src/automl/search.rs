//! Search space definition and random search baseline.
//!
//! # References
//!
//! Bergstra & Bengio (2012). Random Search for Hyper-Parameter Optimization. JMLR.

use std::collections::HashMap;
use std::ops::Range;

use crate::automl::params::{GenericParam, ParamKey};

/// Hyperparameter value that can be sampled.
#[derive(Debug, Clone)]
pub enum HyperParam {
    /// Continuous parameter in [low, high].
    Continuous {
        low: f64,
        high: f64,
        log_scale: bool,
    },
    /// Integer parameter in [low, high].
    Integer { low: i64, high: i64 },
    /// Categorical parameter with discrete choices.
    Categorical { choices: Vec<ParamValue> },
}

impl HyperParam {
    /// Create continuous parameter from range.
    #[must_use]
    pub fn continuous(low: f64, high: f64) -> Self {
        Self::Continuous {
            low,
            high,
            log_scale: false,
        }
    }

    /// Create continuous parameter sampled uniformly in log space.
    #[must_use]
    pub fn continuous_log(low: f64, high: f64) -> Self {
        Self::Continuous {
            low,
            high,
            log_scale: true,
        }
    }

    /// Create integer parameter from inclusive bounds.
    #[must_use]
    pub fn integer(low: i64, high: i64) -> Self {
        Self::Integer { low, high }
    }

    /// Create categorical parameter from choices.
    #[must_use]
    pub fn categorical<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        Self::Categorical {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// Sample a random value from this parameter's distribution.
    #[must_use]
    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match self {
            Self::Continuous {
                low,
                high,
                log_scale,
            } => {
                let value = if *log_scale {
                    let log_low = low.ln();
                    let log_high = high.ln();
                    let u = rng.gen_f64();
                    (log_low + u * (log_high - log_low)).exp()
                } else {
                    rng.gen_f64_range(*low, *high)
                };
                ParamValue::Float(value)
            }
            Self::Integer { low, high } => {
                let value = rng.gen_i64_range(*low, *high);
                ParamValue::Int(value)
            }
            Self::Categorical { choices } => {
                let idx = rng.gen_usize(choices.len());
                choices[idx].clone()
            }
        }
    }
}

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    String(String),
}

impl ParamValue {
    /// Get as f64 if numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::String(_) => None,
        }
    }

    /// Get as i64 if integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            Self::String(_) => None,
        }
    }

    /// Get as string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
        }
    }
}

/// Type-safe search space for hyperparameters.
///
/// Parameters keep their declaration order, which fixes both the report
/// column layout and the dimension order seen by optimizers.
///
/// # Example
///
/// ```
/// use tasar::automl::{GenericParam, SearchSpace};
///
/// let space = SearchSpace::new()
///     .add(GenericParam("n_estimators"), 10..501)
///     .add(GenericParam("max_depth"), 2..21);
///
/// assert_eq!(space.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SearchSpace<P: ParamKey = GenericParam> {
    params: Vec<(P, HyperParam)>,
}

impl<P: ParamKey> Default for SearchSpace<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ParamKey> SearchSpace<P> {
    /// Create an empty search space.
    #[must_use]
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Number of parameters in the space.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if space is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn insert(&mut self, key: P, param: HyperParam) {
        if let Some(slot) = self.params.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = param;
        } else {
            self.params.push((key, param));
        }
    }

    /// Add an integer parameter from a half-open range.
    #[must_use]
    pub fn add(mut self, key: P, range: Range<i64>) -> Self {
        self.insert(
            key,
            HyperParam::Integer {
                low: range.start,
                high: range.end - 1,
            },
        );
        self
    }

    /// Add a continuous parameter with uniform sampling.
    #[must_use]
    pub fn add_continuous(mut self, key: P, low: f64, high: f64) -> Self {
        self.insert(key, HyperParam::continuous(low, high));
        self
    }

    /// Add a continuous parameter with log-uniform sampling.
    #[must_use]
    pub fn add_log_uniform(mut self, key: P, low: f64, high: f64) -> Self {
        self.insert(key, HyperParam::continuous_log(low, high));
        self
    }

    /// Add a categorical parameter.
    #[must_use]
    pub fn add_categorical<I, V>(mut self, key: P, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.insert(key, HyperParam::categorical(choices));
        self
    }

    /// Get parameter definition by key.
    #[must_use]
    pub fn get(&self, key: &P) -> Option<&HyperParam> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p)
    }

    /// Iterate over parameter definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&P, &HyperParam)> {
        self.params.iter().map(|(k, p)| (k, p))
    }

    /// Sample a random configuration.
    #[must_use]
    pub fn sample(&self, rng: &mut impl Rng) -> Trial<P> {
        let values: HashMap<P, ParamValue> = self
            .params
            .iter()
            .map(|(k, p)| (*k, p.sample(rng)))
            .collect();
        Trial { values }
    }
}

/// A hyperparameter configuration to evaluate.
#[derive(Debug, Clone)]
pub struct Trial<P: ParamKey = GenericParam> {
    /// Parameter values for this trial.
    pub values: HashMap<P, ParamValue>,
}

impl<P: ParamKey> Trial<P> {
    /// Get a parameter value.
    #[must_use]
    pub fn get(&self, key: &P) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Get parameter as f64.
    #[must_use]
    pub fn get_f64(&self, key: &P) -> Option<f64> {
        self.values.get(key).and_then(ParamValue::as_f64)
    }

    /// Get parameter as i64.
    #[must_use]
    pub fn get_i64(&self, key: &P) -> Option<i64> {
        self.values.get(key).and_then(ParamValue::as_i64)
    }

    /// Get parameter as usize.
    #[must_use]
    pub fn get_usize(&self, key: &P) -> Option<usize> {
        self.values
            .get(key)
            .and_then(ParamValue::as_i64)
            .map(|v| v as usize)
    }

    /// Get parameter as string slice.
    #[must_use]
    pub fn get_str(&self, key: &P) -> Option<&str> {
        self.values.get(key).and_then(ParamValue::as_str)
    }
}

impl<P: ParamKey> std::fmt::Display for Trial<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut params: Vec<(&'static str, &ParamValue)> = self
            .values
            .iter()
            .map(|(k, v)| (k.name(), v))
            .collect();
        params.sort_by_key(|(name, _)| *name);
        let joined: Vec<String> = params
            .iter()
            .map(|(name, v)| format!("{name}={v}"))
            .collect();
        write!(f, "{{{}}}", joined.join(", "))
    }
}

/// Result of evaluating a trial.
#[derive(Debug, Clone)]
pub struct TrialResult<P: ParamKey = GenericParam> {
    /// The trial configuration.
    pub trial: Trial<P>,
    /// Objective score (higher is better).
    pub score: f64,
}

/// Search strategy trait for hyperparameter optimization.
pub trait SearchStrategy<P: ParamKey> {
    /// Generate candidate configurations to evaluate.
    fn suggest(&mut self, space: &SearchSpace<P>, n: usize) -> Vec<Trial<P>>;

    /// Update strategy with evaluation results (for adaptive methods).
    fn update(&mut self, _space: &SearchSpace<P>, _results: &[TrialResult<P>]) {}
}

/// Simple random number generator trait.
pub trait Rng {
    /// Generate uniform random in [0, 1).
    fn gen_f64(&mut self) -> f64;

    /// Generate random f64 in range [low, high).
    fn gen_f64_range(&mut self, low: f64, high: f64) -> f64 {
        low + self.gen_f64() * (high - low)
    }

    /// Generate random i64 in range [low, high].
    fn gen_i64_range(&mut self, low: i64, high: i64) -> i64;

    /// Generate random usize in range [0, len).
    fn gen_usize(&mut self, len: usize) -> usize;
}

/// Xorshift64 RNG for deterministic reproducibility.
#[derive(Debug, Clone)]
pub(crate) struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    #[must_use]
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl Rng for XorShift64 {
    fn gen_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    fn gen_i64_range(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        let range = (high - low + 1) as u64;
        low + (self.next_u64() % range) as i64
    }

    fn gen_usize(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() as usize) % len
    }
}

/// Random search optimizer.
///
/// Samples the space uniformly within each dimension's bounds. Useful as
/// a baseline to compare adaptive optimizers against.
///
/// # Example
///
/// ```
/// use tasar::automl::{GenericParam, RandomSearch, SearchSpace, SearchStrategy};
///
/// let space = SearchSpace::new().add(GenericParam("max_depth"), 2..21);
///
/// let mut search = RandomSearch::new(50).with_seed(42);
/// let trials = search.suggest(&space, 10);
/// assert_eq!(trials.len(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct RandomSearch {
    /// Total number of trials to run.
    pub n_iter: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
    rng: XorShift64,
    trials_generated: usize,
}

impl RandomSearch {
    /// Create random search with n iterations.
    #[must_use]
    pub fn new(n_iter: usize) -> Self {
        Self {
            n_iter,
            seed: 42,
            rng: XorShift64::new(42),
            trials_generated: 0,
        }
    }

    /// Set random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = XorShift64::new(seed);
        self
    }

    /// Remaining trials to generate.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.n_iter.saturating_sub(self.trials_generated)
    }
}

impl<P: ParamKey> SearchStrategy<P> for RandomSearch {
    fn suggest(&mut self, space: &SearchSpace<P>, n: usize) -> Vec<Trial<P>> {
        let n = n.min(self.remaining());
        let trials: Vec<Trial<P>> = (0..n).map(|_| space.sample(&mut self.rng)).collect();
        self.trials_generated += trials.len();
        trials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTH: GenericParam = GenericParam("max_depth");
    const TREES: GenericParam = GenericParam("n_estimators");
    const ALPHA: GenericParam = GenericParam("alpha");
    const FEATURES: GenericParam = GenericParam("max_features");

    #[test]
    fn test_search_space_builder() {
        let space = SearchSpace::new()
            .add(TREES, 10..501)
            .add(DEPTH, 2..21);

        assert_eq!(space.len(), 2);
        assert!(space.get(&TREES).is_some());
        assert!(space.get(&DEPTH).is_some());
    }

    #[test]
    fn test_search_space_preserves_declaration_order() {
        let space = SearchSpace::new()
            .add(TREES, 10..501)
            .add_log_uniform(ALPHA, 1e-4, 1.0)
            .add(DEPTH, 2..21);

        let names: Vec<&str> = space.iter().map(|(k, _)| k.name()).collect();
        assert_eq!(names, vec!["n_estimators", "alpha", "max_depth"]);
    }

    #[test]
    fn test_search_space_replaces_duplicate_key() {
        let space = SearchSpace::new().add(DEPTH, 2..5).add(DEPTH, 10..20);
        assert_eq!(space.len(), 1);
        match space.get(&DEPTH) {
            Some(HyperParam::Integer { low, high }) => {
                assert_eq!(*low, 10);
                assert_eq!(*high, 19);
            }
            other => panic!("unexpected param: {other:?}"),
        }
    }

    #[test]
    fn test_integer_range_is_half_open() {
        let space = SearchSpace::new().add(DEPTH, 3..18);
        match space.get(&DEPTH) {
            Some(HyperParam::Integer { low, high }) => {
                assert_eq!(*low, 3);
                assert_eq!(*high, 17);
            }
            other => panic!("unexpected param: {other:?}"),
        }
    }

    #[test]
    fn test_random_search_deterministic() {
        let space = SearchSpace::new().add(TREES, 10..501).add(DEPTH, 2..21);

        let mut search1 = RandomSearch::new(10).with_seed(42);
        let mut search2 = RandomSearch::new(10).with_seed(42);

        let trials1 = search1.suggest(&space, 5);
        let trials2 = search2.suggest(&space, 5);

        for (t1, t2) in trials1.iter().zip(trials2.iter()) {
            assert_eq!(t1.get(&TREES), t2.get(&TREES));
        }
    }

    #[test]
    fn test_random_search_respects_budget() {
        let space = SearchSpace::new().add(TREES, 10..501);

        let mut search = RandomSearch::new(5);

        let trials1 = search.suggest(&space, 3);
        assert_eq!(trials1.len(), 3);
        assert_eq!(search.remaining(), 2);

        let trials2 = search.suggest(&space, 10);
        assert_eq!(trials2.len(), 2);
        assert_eq!(search.remaining(), 0);
    }

    #[test]
    fn test_trial_accessors() {
        let space = SearchSpace::new()
            .add(TREES, 100..101)
            .add_categorical(FEATURES, ["sqrt", "log2"]);

        let mut rng = XorShift64::new(42);
        let trial = space.sample(&mut rng);

        assert_eq!(trial.get_i64(&TREES), Some(100));
        assert_eq!(trial.get_usize(&TREES), Some(100));
        assert!(matches!(trial.get_str(&FEATURES), Some("sqrt" | "log2")));
    }

    #[test]
    fn test_param_value_conversions() {
        assert_eq!(ParamValue::from(42_i32).as_i64(), Some(42));
        assert_eq!(ParamValue::from(1.234_f64).as_f64(), Some(1.234));
        assert_eq!(ParamValue::from("sqrt").as_str(), Some("sqrt"));
        assert_eq!(ParamValue::from(7_usize).as_i64(), Some(7));
        assert!(ParamValue::Int(1).as_str().is_none());
    }

    #[test]
    fn test_hyperparam_sampling_bounds() {
        let mut rng = XorShift64::new(42);

        let continuous = HyperParam::continuous(0.0, 1.0);
        for _ in 0..100 {
            let v = continuous.sample(&mut rng).as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v));
        }

        let integer = HyperParam::integer(10, 20);
        for _ in 0..100 {
            let v = integer.sample(&mut rng).as_i64().unwrap();
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_log_uniform_sampling() {
        let mut rng = XorShift64::new(42);
        let param = HyperParam::continuous_log(1e-4, 1.0);

        let mut samples = Vec::new();
        for _ in 0..1000 {
            let v = param.sample(&mut rng).as_f64().unwrap();
            assert!((1e-4..=1.0).contains(&v));
            samples.push(v);
        }

        // Log scale puts most mass below the linear midpoint
        let below_01 = samples.iter().filter(|&&v| v < 0.1).count();
        assert!(below_01 > 500);
    }

    #[test]
    fn test_trial_display_sorted_by_name() {
        let mut values = HashMap::new();
        values.insert(TREES, ParamValue::Int(100));
        values.insert(DEPTH, ParamValue::Int(5));

        let trial = Trial { values };
        let s = format!("{trial}");
        assert_eq!(s, "{max_depth=5, n_estimators=100}");
    }

    #[test]
    fn test_xorshift_rng_range() {
        let mut rng = XorShift64::new(12345);
        for _ in 0..1000 {
            let v = rng.gen_f64();
            assert!((0.0..1.0).contains(&v));
        }
        for _ in 0..100 {
            assert!((0..10).contains(&rng.gen_usize(10)));
        }
        assert_eq!(rng.gen_i64_range(5, 5), 5);
    }

    #[test]
    fn test_xorshift_zero_seed_is_valid() {
        let mut rng = XorShift64::new(0);
        let v1 = rng.gen_f64();
        let v2 = rng.gen_f64();
        assert_ne!(v1, v2);
    }
}
