//! Coordinate-ascent variational inference over symbol probabilities.
//!
//! The latent per-symbol probability vector gets a Dirichlet approximation
//! starting from the symmetric prior Dir(1, 1, 1, 1). Each symbol also
//! carries a Gaussian (mean, spread) fitted to the observations equal to
//! it. Each iteration:
//!
//! 1. steps every concentration by
//!    `lr · (count_i · (ψ(Σα) − ψ(α_i)) + 1)`
//! 2. refits each Gaussian from that symbol's observations, flooring the
//!    spread at `sigma_floor`
//! 3. evaluates ELBO = −KL(q ‖ prior)
//!
//! and stops once the ELBO moves by less than `tolerance`.
//!
//! `uncertainty = spread · sqrt(α)` is a heuristic width, not a calibrated
//! credible interval.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::prediction::{ModelPrediction, Predictor, argmax};
use crate::special::{MIN_ARGUMENT, digamma, dirichlet_kl};
use crate::symbol::{ALPHABET_SIZE, Symbol, symbol_counts};

/// Symmetric, uninformative prior.
pub const PRIOR_CONCENTRATION: [f64; ALPHABET_SIZE] = [1.0; ALPHABET_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationalConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub learning_rate: f64,
    pub sigma_floor: f64,
    pub min_symbols: usize,
}

impl Default for VariationalConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-4,
            learning_rate: 0.01,
            sigma_floor: 0.1,
            min_symbols: 10,
        }
    }
}

impl VariationalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AnalysisError::config(
                "variational.max_iterations must be at least 1",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(AnalysisError::config(
                "variational.tolerance must be a positive number",
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AnalysisError::config(
                "variational.learning_rate must be a positive number",
            ));
        }
        if !(self.sigma_floor.is_finite() && self.sigma_floor >= MIN_ARGUMENT) {
            return Err(AnalysisError::config(format!(
                "variational.sigma_floor must be at least {MIN_ARGUMENT}"
            )));
        }
        Ok(())
    }
}

/// Variational parameters, updated in place each iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationalState {
    pub concentration: [f64; ALPHABET_SIZE],
    pub means: [f64; ALPHABET_SIZE],
    pub spreads: [f64; ALPHABET_SIZE],
}

impl Default for VariationalState {
    fn default() -> Self {
        Self {
            concentration: PRIOR_CONCENTRATION,
            means: [0.0; ALPHABET_SIZE],
            spreads: [1.0; ALPHABET_SIZE],
        }
    }
}

/// Mean and sample standard deviation of one symbol's observations.
#[derive(Debug, Clone, Copy)]
struct GroupStats {
    count: u32,
    mean: f64,
    std_dev: f64,
}

fn group_stats(symbols: &[Symbol]) -> [GroupStats; ALPHABET_SIZE] {
    let counts = symbol_counts(symbols);
    std::array::from_fn(|i| {
        let n = counts[i];
        let value = f64::from(Symbol::ALL[i].value());
        let values = symbols.iter().filter(|s| s.index() == i).map(|_| value);
        let mean = if n > 0 {
            values.clone().sum::<f64>() / f64::from(n)
        } else {
            0.0
        };
        let std_dev = if n > 1 {
            let ss: f64 = values.map(|v| (v - mean).powi(2)).sum();
            (ss / f64::from(n - 1)).sqrt()
        } else {
            0.0
        };
        GroupStats {
            count: n,
            mean,
            std_dev,
        }
    })
}

impl VariationalState {
    fn update(&mut self, stats: &[GroupStats; ALPHABET_SIZE], config: &VariationalConfig) {
        let digamma_total = digamma(self.concentration.iter().sum());
        let previous = self.concentration;
        for (i, alpha) in self.concentration.iter_mut().enumerate() {
            let grad = f64::from(stats[i].count) * (digamma_total - digamma(previous[i])) + 1.0;
            *alpha = (previous[i] + config.learning_rate * grad).max(MIN_ARGUMENT);
        }
        for (i, g) in stats.iter().enumerate() {
            if g.count > 0 {
                self.means[i] = g.mean;
                self.spreads[i] = g.std_dev.max(config.sigma_floor);
            }
        }
    }

    pub fn elbo(&self) -> f64 {
        -dirichlet_kl(&self.concentration, &PRIOR_CONCENTRATION)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationalPosterior {
    /// `α_i / Σα`.
    pub symbol_probabilities: [f64; ALPHABET_SIZE],
    /// `spread_i · sqrt(α_i)`.
    pub uncertainty: [f64; ALPHABET_SIZE],
    pub concentration: [f64; ALPHABET_SIZE],
    pub means: [f64; ALPHABET_SIZE],
    pub spreads: [f64; ALPHABET_SIZE],
    /// ELBO of the returned concentration, i.e. after the final update.
    /// On convergence this is the newer of the two values compared against
    /// `tolerance`, not the one before it.
    pub elbo: f64,
    /// Updates performed, at most `max_iterations`. The update whose ELBO
    /// change fell below `tolerance` is counted, so the earliest possible
    /// convergence reports 2, not 1.
    pub iterations: usize,
    pub converged: bool,
    /// Most probable symbol under the posterior.
    pub prediction: ModelPrediction,
}

impl Predictor for VariationalPosterior {
    fn prediction(&self) -> Option<ModelPrediction> {
        Some(self.prediction)
    }
}

/// Fit the posterior; any sequence is accepted (empty gives uniform).
pub fn run_variational_inference(
    symbols: &[Symbol],
    config: &VariationalConfig,
) -> VariationalPosterior {
    let stats = group_stats(symbols);
    let mut state = VariationalState::default();
    let mut previous_elbo = f64::NEG_INFINITY;
    let mut elbo = f64::NEG_INFINITY;
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iterations {
        state.update(&stats, config);
        iterations += 1;
        elbo = state.elbo();
        trace!("vi iteration {iterations}: elbo={elbo:.6} alpha={:?}", state.concentration);
        if (elbo - previous_elbo).abs() < config.tolerance {
            converged = true;
            break;
        }
        previous_elbo = elbo;
    }

    let total: f64 = state.concentration.iter().sum();
    let symbol_probabilities = state.concentration.map(|a| a / total);
    let uncertainty = std::array::from_fn(|i| state.spreads[i] * state.concentration[i].sqrt());
    let (best, p) = argmax(&symbol_probabilities);
    debug!(
        "vi: {} symbols, {iterations} iterations, converged={converged}, elbo={elbo:.4}",
        symbols.len()
    );

    VariationalPosterior {
        symbol_probabilities,
        uncertainty,
        concentration: state.concentration,
        means: state.means,
        spreads: state.spreads,
        elbo,
        iterations,
        converged,
        prediction: ModelPrediction::new(Symbol::ALL[best], p),
    }
}

pub fn analyze(symbols: &[Symbol], config: &VariationalConfig) -> Result<VariationalPosterior> {
    config.validate()?;
    if symbols.len() < config.min_symbols {
        return Err(AnalysisError::insufficient(
            "VI",
            config.min_symbols,
            symbols.len(),
        ));
    }
    Ok(run_variational_inference(symbols, config))
}
