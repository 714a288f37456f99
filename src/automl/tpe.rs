//! Tree-structured Parzen Estimator (TPE) optimizer.
//!
//! TPE is a sequential model-based optimization algorithm that models
//! p(x|y) instead of p(y|x), making it more sample-efficient than random
//! search once enough observations exist.
//!
//! # Algorithm
//!
//! 1. Split observations into "good" (l) and "bad" (g) at the gamma quantile
//! 2. Fit Gaussian kernel density estimators to each group
//! 3. Sample candidates and keep the one maximizing the ratio l(x) / g(x)
//!
//! # References
//!
//! Bergstra et al. (2011). Algorithms for Hyper-Parameter Optimization. `NeurIPS`.

use crate::automl::params::ParamKey;
use crate::automl::search::{
    HyperParam, ParamValue, Rng, SearchSpace, SearchStrategy, Trial, TrialResult, XorShift64,
};

/// TPE optimizer configuration.
#[derive(Debug, Clone)]
pub struct TpeConfig {
    /// Quantile for splitting good/bad observations (default: 0.25)
    pub gamma: f32,
    /// Number of candidates sampled per suggestion (default: 24)
    pub n_candidates: usize,
    /// Random trials before the model kicks in (default: 10)
    pub n_startup_trials: usize,
}

impl Default for TpeConfig {
    fn default() -> Self {
        Self {
            gamma: 0.25,
            n_candidates: 24,
            n_startup_trials: 10,
        }
    }
}

/// Observation record for TPE history.
///
/// Values are stored normalized to [0, 1] per dimension so KDE bandwidths
/// are comparable across parameters of different scales.
#[derive(Debug, Clone)]
struct Observation {
    values: Vec<f64>,
    score: f64,
}

/// Tree-structured Parzen Estimator optimizer.
///
/// # Example
///
/// ```
/// use tasar::automl::{GenericParam, SearchSpace, SearchStrategy, Tpe};
///
/// let space = SearchSpace::new()
///     .add(GenericParam("n_estimators"), 10..501)
///     .add(GenericParam("max_depth"), 2..21);
///
/// let mut tpe = Tpe::new(100).with_seed(7);
/// let trials = tpe.suggest(&space, 1);
/// assert_eq!(trials.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Tpe {
    config: TpeConfig,
    n_trials: usize,
    history: Vec<Observation>,
    trials_suggested: usize,
    seed: u64,
}

impl Tpe {
    /// Create TPE optimizer with a trial budget.
    #[must_use]
    pub fn new(n_trials: usize) -> Self {
        Self {
            config: TpeConfig::default(),
            n_trials,
            history: Vec::new(),
            trials_suggested: 0,
            seed: 42,
        }
    }

    /// Set random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set gamma (quantile for good/bad split), clamped to [0.01, 0.5].
    #[must_use]
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma.clamp(0.01, 0.5);
        self
    }

    /// Set number of random startup trials before the model is used.
    #[must_use]
    pub fn with_startup_trials(mut self, n: usize) -> Self {
        self.config.n_startup_trials = n;
        self
    }

    /// Remaining trials in the budget.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.n_trials.saturating_sub(self.trials_suggested)
    }

    /// Number of observations in history.
    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.history.len()
    }

    fn should_use_model(&self) -> bool {
        self.history.len() >= self.config.n_startup_trials
    }

    /// Gaussian KDE density at a point.
    fn kde_density(samples: &[f64], point: f64, bandwidth: f64) -> f64 {
        if samples.is_empty() {
            return 1.0; // Uniform prior
        }

        let n = samples.len() as f64;
        let sum: f64 = samples
            .iter()
            .map(|&x| {
                let z = (point - x) / bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum();

        let norm = (2.0 * std::f64::consts::PI).sqrt() * bandwidth * n;
        sum / norm
    }

    /// Bandwidth by Scott's rule: h = n^(-1/5) * std.
    fn compute_bandwidth(samples: &[f64]) -> f64 {
        if samples.len() < 2 {
            return 1.0;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
        // Floor the std to keep the bandwidth positive
        let std = variance.sqrt().max(0.01);

        std * n.powf(-0.2)
    }

    /// Split observations into good (l) and bad (g) at the gamma quantile.
    fn split_observations(&self) -> (Vec<&Observation>, Vec<&Observation>) {
        if self.history.is_empty() {
            return (Vec::new(), Vec::new());
        }

        // Higher score is better
        let mut sorted: Vec<&Observation> = self.history.iter().collect();
        sorted.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let n_good = ((self.history.len() as f32) * self.config.gamma).ceil() as usize;
        let n_good = n_good.max(1).min(sorted.len() - 1);

        let good = sorted[..n_good].to_vec();
        let bad = sorted[n_good..].to_vec();

        (good, bad)
    }

    /// Expected Improvement ratio l(x) / g(x) for a candidate.
    fn compute_ei_ratio(candidate: &[f64], good: &[&Observation], bad: &[&Observation]) -> f64 {
        if candidate.is_empty() {
            return 0.0;
        }

        let mut l_density = 1.0;
        for (dim, &x) in candidate.iter().enumerate() {
            let good_samples: Vec<f64> = good
                .iter()
                .filter_map(|o| o.values.get(dim).copied())
                .collect();
            let bandwidth = Self::compute_bandwidth(&good_samples);
            l_density *= Self::kde_density(&good_samples, x, bandwidth);
        }

        let mut g_density = 1.0;
        for (dim, &x) in candidate.iter().enumerate() {
            let bad_samples: Vec<f64> = bad
                .iter()
                .filter_map(|o| o.values.get(dim).copied())
                .collect();
            let bandwidth = Self::compute_bandwidth(&bad_samples);
            g_density *= Self::kde_density(&bad_samples, x, bandwidth);
        }

        l_density / (g_density + 1e-10)
    }

    /// Sample a candidate point in [0, 1]^d space.
    fn sample_candidate<R: Rng>(n_dims: usize, rng: &mut R) -> Vec<f64> {
        (0..n_dims).map(|_| rng.gen_f64()).collect()
    }

    /// Map normalized [0, 1] values back to parameter values.
    fn denormalize_candidate<P: ParamKey>(
        candidate: &[f64],
        space: &SearchSpace<P>,
    ) -> std::collections::HashMap<P, ParamValue> {
        let mut values = std::collections::HashMap::new();

        for (i, (key, param)) in space.iter().enumerate() {
            let Some(&norm_val) = candidate.get(i) else {
                continue;
            };
            let value = match param {
                HyperParam::Continuous {
                    low,
                    high,
                    log_scale,
                } => {
                    let v = if *log_scale {
                        let log_low = low.ln();
                        let log_high = high.ln();
                        (log_low + norm_val * (log_high - log_low)).exp()
                    } else {
                        low + norm_val * (high - low)
                    };
                    ParamValue::Float(v)
                }
                HyperParam::Integer { low, high } => {
                    let range = (high - low + 1) as f64;
                    let v = *low + (norm_val * range).floor() as i64;
                    ParamValue::Int(v.clamp(*low, *high))
                }
                HyperParam::Categorical { choices } => {
                    let idx = (norm_val * choices.len() as f64).floor() as usize;
                    let idx = idx.min(choices.len().saturating_sub(1));
                    choices[idx].clone()
                }
            };
            values.insert(*key, value);
        }

        values
    }

    /// Map an evaluated trial into normalized [0, 1]^d space using the
    /// space's declaration order. Inverse of [`Self::denormalize_candidate`].
    fn normalize<P: ParamKey>(space: &SearchSpace<P>, trial: &Trial<P>) -> Vec<f64> {
        space
            .iter()
            .map(|(key, param)| {
                let value = trial.get(key);
                let norm = match (param, value) {
                    (
                        HyperParam::Continuous {
                            low,
                            high,
                            log_scale,
                        },
                        Some(v),
                    ) => {
                        let v = v.as_f64().unwrap_or(*low);
                        if *log_scale {
                            let log_low = low.ln();
                            let log_high = high.ln();
                            if log_high > log_low {
                                (v.max(f64::MIN_POSITIVE).ln() - log_low) / (log_high - log_low)
                            } else {
                                0.5
                            }
                        } else if high > low {
                            (v - low) / (high - low)
                        } else {
                            0.5
                        }
                    }
                    (HyperParam::Integer { low, high }, Some(v)) => {
                        let v = v.as_i64().unwrap_or(*low);
                        let range = (high - low + 1) as f64;
                        ((v - low) as f64 + 0.5) / range
                    }
                    (HyperParam::Categorical { choices }, Some(v)) => {
                        let idx = choices.iter().position(|c| c == v).unwrap_or(0);
                        (idx as f64 + 0.5) / choices.len() as f64
                    }
                    (_, None) => 0.5,
                };
                norm.clamp(0.0, 1.0)
            })
            .collect()
    }
}

impl<P: ParamKey> SearchStrategy<P> for Tpe {
    fn suggest(&mut self, space: &SearchSpace<P>, n: usize) -> Vec<Trial<P>> {
        let n = n.min(self.remaining());
        if n == 0 {
            return Vec::new();
        }

        let mut rng = XorShift64::new(self.seed.wrapping_add(self.trials_suggested as u64));
        let n_dims = space.len();

        let trials: Vec<Trial<P>> = if !self.should_use_model() || n_dims == 0 {
            // Startup phase: random sampling
            (0..n).map(|_| space.sample(&mut rng)).collect()
        } else {
            let (good, bad) = self.split_observations();

            (0..n)
                .map(|_| {
                    let mut best_candidate = Self::sample_candidate(n_dims, &mut rng);
                    let mut best_ei = Self::compute_ei_ratio(&best_candidate, &good, &bad);

                    for _ in 1..self.config.n_candidates {
                        let candidate = Self::sample_candidate(n_dims, &mut rng);
                        let ei = Self::compute_ei_ratio(&candidate, &good, &bad);

                        if ei > best_ei {
                            best_ei = ei;
                            best_candidate = candidate;
                        }
                    }

                    let values = Self::denormalize_candidate(&best_candidate, space);
                    Trial { values }
                })
                .collect()
        };

        self.trials_suggested += trials.len();
        trials
    }

    fn update(&mut self, space: &SearchSpace<P>, results: &[TrialResult<P>]) {
        for result in results {
            self.history.push(Observation {
                values: Self::normalize(space, &result.trial),
                score: result.score,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automl::params::GenericParam;
    use proptest::prelude::*;

    const ALPHA: GenericParam = GenericParam("alpha");
    const DEPTH: GenericParam = GenericParam("max_depth");
    const FEATURES: GenericParam = GenericParam("max_features");

    fn toy_space() -> SearchSpace<GenericParam> {
        SearchSpace::new()
            .add_log_uniform(ALPHA, 1e-4, 1.0)
            .add(DEPTH, 3..18)
            .add_categorical(FEATURES, ["sqrt", "log2", "none"])
    }

    fn evaluate(trial: &Trial<GenericParam>) -> f64 {
        // Peak near alpha = 0.01
        let alpha = trial.get_f64(&ALPHA).unwrap();
        -(alpha.ln() - 0.01_f64.ln()).abs()
    }

    #[test]
    fn test_startup_phase_is_random_sampling() {
        let mut tpe = Tpe::new(20).with_seed(7);
        let space = toy_space();
        let trials = tpe.suggest(&space, 5);
        assert_eq!(trials.len(), 5);
        assert_eq!(tpe.n_observations(), 0);

        for trial in &trials {
            let alpha = trial.get_f64(&ALPHA).unwrap();
            assert!((1e-4..=1.0).contains(&alpha));
            let depth = trial.get_i64(&DEPTH).unwrap();
            assert!((3..=17).contains(&depth));
        }
    }

    #[test]
    fn test_model_phase_respects_bounds() {
        let space = toy_space();
        let mut tpe = Tpe::new(100).with_seed(7).with_startup_trials(5);

        for _ in 0..5 {
            let trials = tpe.suggest(&space, 3);
            let results: Vec<TrialResult<GenericParam>> = trials
                .into_iter()
                .map(|t| {
                    let score = evaluate(&t);
                    TrialResult { trial: t, score }
                })
                .collect();
            tpe.update(&space, &results);
        }
        assert!(tpe.n_observations() >= 10);

        // Now in model phase
        let trials = tpe.suggest(&space, 10);
        for trial in &trials {
            let alpha = trial.get_f64(&ALPHA).unwrap();
            assert!((1e-4..=1.0).contains(&alpha));
            let depth = trial.get_i64(&DEPTH).unwrap();
            assert!((3..=17).contains(&depth));
            assert!(matches!(
                trial.get_str(&FEATURES),
                Some("sqrt" | "log2" | "none")
            ));
        }
    }

    #[test]
    fn test_gamma_clamped() {
        let tpe = Tpe::new(10).with_gamma(0.9);
        assert!((tpe.config.gamma - 0.5).abs() < 1e-6);
        let tpe = Tpe::new(10).with_gamma(0.001);
        assert!((tpe.config.gamma - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_budget_respected() {
        let space = toy_space();
        let mut tpe = Tpe::new(5).with_seed(1);
        assert_eq!(tpe.suggest(&space, 3).len(), 3);
        assert_eq!(tpe.remaining(), 2);
        assert_eq!(tpe.suggest(&space, 10).len(), 2);
        assert!(tpe.suggest(&space, 1).is_empty());
    }

    #[test]
    fn test_deterministic_with_seed() {
        let space = toy_space();
        let mut a = Tpe::new(10).with_seed(7);
        let mut b = Tpe::new(10).with_seed(7);
        let ta = a.suggest(&space, 5);
        let tb = b.suggest(&space, 5);
        for (x, y) in ta.iter().zip(tb.iter()) {
            assert_eq!(x.get(&ALPHA), y.get(&ALPHA));
            assert_eq!(x.get(&DEPTH), y.get(&DEPTH));
        }
    }

    #[test]
    fn test_normalize_roundtrips_through_denormalize() {
        let space = toy_space();
        let mut rng = XorShift64::new(3);
        let trial = space.sample(&mut rng);

        let norm = Tpe::normalize(&space, &trial);
        assert_eq!(norm.len(), space.len());
        assert!(norm.iter().all(|v| (0.0..=1.0).contains(v)));

        // Integers and categoricals recover exactly
        let values = Tpe::denormalize_candidate(&norm, &space);
        assert_eq!(values.get(&DEPTH), trial.get(&DEPTH));
        assert_eq!(values.get(&FEATURES), trial.get(&FEATURES));
    }

    #[test]
    fn test_split_observations_keeps_best_in_good() {
        let space = SearchSpace::new().add_continuous(ALPHA, 0.0, 1.0);
        let mut tpe = Tpe::new(100).with_seed(7).with_startup_trials(4);

        let trials = tpe.suggest(&space, 8);
        let results: Vec<TrialResult<GenericParam>> = trials
            .into_iter()
            .enumerate()
            .map(|(i, trial)| TrialResult {
                trial,
                score: i as f64,
            })
            .collect();
        tpe.update(&space, &results);

        let (good, bad) = tpe.split_observations();
        assert!(!good.is_empty());
        assert!(!bad.is_empty());
        let worst_good = good
            .iter()
            .map(|o| o.score)
            .fold(f64::INFINITY, f64::min);
        let best_bad = bad
            .iter()
            .map(|o| o.score)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(worst_good >= best_bad);
    }

    #[test]
    fn test_kde_density_positive() {
        let samples = [0.2, 0.3, 0.4];
        let bw = Tpe::compute_bandwidth(&samples);
        assert!(bw > 0.0);
        assert!(Tpe::kde_density(&samples, 0.3, bw) > 0.0);
        // Uniform prior when no samples
        assert!((Tpe::kde_density(&[], 0.5, 1.0) - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_suggest_never_exceeds_budget(budget in 0_usize..30, ask in 0_usize..50) {
            let space = toy_space();
            let mut tpe = Tpe::new(budget).with_seed(7);
            let trials = tpe.suggest(&space, ask);
            prop_assert!(trials.len() <= budget);
            prop_assert!(trials.len() <= ask);
        }

        #[test]
        fn prop_normalized_values_in_unit_interval(seed in 0_u64..1000) {
            let space = toy_space();
            let mut rng = XorShift64::new(seed);
            let trial = space.sample(&mut rng);
            let norm = Tpe::normalize(&space, &trial);
            prop_assert!(norm.iter().all(|v| (0.0..=1.0).contains(v)));
        }

        #[test]
        fn prop_same_seed_same_suggestions(seed in 0_u64..1000) {
            let space = toy_space();
            let mut a = Tpe::new(5).with_seed(seed);
            let mut b = Tpe::new(5).with_seed(seed);
            let ta = a.suggest(&space, 5);
            let tb = b.suggest(&space, 5);
            for (x, y) in ta.iter().zip(tb.iter()) {
                prop_assert_eq!(x.get(&ALPHA), y.get(&ALPHA));
            }
        }
    }
}
