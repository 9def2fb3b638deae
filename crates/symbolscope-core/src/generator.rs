//! Generator-seed search and chi-square uniformity test.
//!
//! Tests the hypothesis that the sequence came from a linear congruential
//! generator `state' = (a·state + c) mod m`, mapped onto the alphabet as
//! `floor(state'/m · 4) + 1`. Every (parameter triple, seed) pair in the
//! configured grid is simulated for the length of the observation and
//! scored by position-wise agreement. The grid is split across worker
//! threads; partial bests recombine with a max that breaks ties towards
//! the lowest (catalog index, seed), so the result does not depend on the
//! split.
//!
//! The search is bounded by its grid, not exhaustive: a low best score is
//! evidence against these generators only.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{AnalysisError, Result};
use crate::prediction::{ModelPrediction, Predictor};
use crate::symbol::{ALPHABET_SIZE, Symbol, symbol_counts};

/// χ² critical value at α = 0.05 with 3 degrees of freedom.
pub const CHI_SQUARE_CRITICAL_3DF: f64 = 7.815;

/// Grid positions scored between checks of the cancel flag.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

// ---------------------------------------------------------------------------
// LCG primitives
// ---------------------------------------------------------------------------

/// One generator configuration (multiplier, increment, modulus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LcgParams {
    pub multiplier: u64,
    pub increment: u64,
    pub modulus: u64,
}

impl LcgParams {
    pub const fn new(multiplier: u64, increment: u64, modulus: u64) -> Self {
        Self {
            multiplier,
            increment,
            modulus,
        }
    }

    /// The four generators searched by default.
    pub fn default_catalog() -> Vec<LcgParams> {
        vec![
            Self::new(1597, 51749, 244_944),
            Self::new(1_664_525, 1_013_904_223, 1 << 32),
            Self::new(22_695_477, 1, 1 << 32),
            Self::new(69069, 1, 1 << 32),
        ]
    }
}

/// Generator state threaded through [`LcgState::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcgState {
    pub state: u64,
    /// Number of symbols emitted so far.
    pub step: u64,
}

impl LcgState {
    pub fn seeded(seed: u64) -> Self {
        Self {
            state: seed,
            step: 0,
        }
    }

    /// Advance one step and emit the symbol for the new state.
    pub fn next(self, params: &LcgParams) -> (LcgState, Symbol) {
        let m = u128::from(params.modulus.max(1));
        let state = (u128::from(params.multiplier) * u128::from(self.state)
            + u128::from(params.increment))
            % m;
        let index = (state * ALPHABET_SIZE as u128 / m) as usize;
        let next = LcgState {
            state: state as u64,
            step: self.step + 1,
        };
        (next, Symbol::ALL[index.min(ALPHABET_SIZE - 1)])
    }
}

/// Emit `len` symbols from `state`, returning them and the final state.
pub fn simulate(params: &LcgParams, state: LcgState, len: usize) -> (Vec<Symbol>, LcgState) {
    let mut out = Vec::with_capacity(len);
    let mut state = state;
    for _ in 0..len {
        let (next, symbol) = state.next(params);
        out.push(symbol);
        state = next;
    }
    (out, state)
}

/// Fraction of positions that agree, over the shorter of the two lengths.
pub fn sequence_similarity(a: &[Symbol], b: &[Symbol]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let matches = a.iter().zip(b).filter(|(x, y)| x == y).count();
    matches as f64 / len as f64
}

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub catalog: Vec<LcgParams>,
    /// First seed tried (inclusive).
    pub seed_min: u64,
    /// Last seed tried (inclusive).
    pub seed_max: u64,
    /// Symbols predicted past the end of the observation.
    pub lookahead: usize,
    pub min_symbols: usize,
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            catalog: LcgParams::default_catalog(),
            seed_min: 1,
            seed_max: 999,
            lookahead: 5,
            min_symbols: 10,
            workers: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.catalog.is_empty() {
            return Err(AnalysisError::config("generator.catalog must not be empty"));
        }
        if let Some(p) = self.catalog.iter().find(|p| p.modulus == 0) {
            return Err(AnalysisError::config(format!(
                "generator.catalog entry {p:?} has modulus 0"
            )));
        }
        if self.seed_max < self.seed_min {
            return Err(AnalysisError::config(
                "generator.seed_max must not be below generator.seed_min",
            ));
        }
        if self.grid_size().is_none() {
            return Err(AnalysisError::config(format!(
                "generator grid of {} catalog entries × seeds {}..={} does not fit in u64",
                self.catalog.len(),
                self.seed_min,
                self.seed_max
            )));
        }
        if self.workers == Some(0) {
            return Err(AnalysisError::config("generator.workers must be at least 1"));
        }
        Ok(())
    }

    fn seeds_per_params(&self) -> Option<u64> {
        self.seed_max.checked_sub(self.seed_min)?.checked_add(1)
    }

    /// Total (parameter triple, seed) pairs in the grid, `None` when the
    /// seed range is inverted or the count overflows.
    pub fn grid_size(&self) -> Option<u64> {
        self.seeds_per_params()?
            .checked_mul(u64::try_from(self.catalog.len()).ok()?)
    }

    fn worker_count(&self) -> usize {
        let wanted = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });
        let grid = self
            .grid_size()
            .and_then(|g| usize::try_from(g).ok())
            .unwrap_or(usize::MAX);
        wanted.clamp(1, grid.max(1))
    }
}

/// The best-scoring generator hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorCandidate {
    pub params: LcgParams,
    /// Position of `params` in the searched catalog.
    pub catalog_index: usize,
    pub seed: u64,
    /// Similarity to the observation, on [0, 1].
    pub confidence: f64,
    /// `floor(confidence × observed length)`.
    pub matched_length: usize,
    /// The generator's continuation past the observation.
    pub predicted_next: Vec<Symbol>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    /// Linear approximation `1 − χ²/7.815`, clamped to [0, 1]. Not a true
    /// p-value; see `exact_p_value`.
    pub p_value: f64,
    /// Survival function of χ²(3) at `statistic`.
    pub exact_p_value: Option<f64>,
    /// `statistic < 7.815`.
    pub is_random: bool,
    pub observed: [u32; ALPHABET_SIZE],
    pub expected: f64,
}

impl ChiSquareResult {
    pub fn verdict(&self) -> &'static str {
        if self.is_random {
            "appears random"
        } else {
            "potential pattern"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloAnalysis {
    /// `None` when no generator matched a single position.
    pub candidate: Option<GeneratorCandidate>,
    pub chi_square: ChiSquareResult,
    pub total_symbols: usize,
    pub prediction: Option<ModelPrediction>,
}

impl Predictor for MonteCarloAnalysis {
    fn prediction(&self) -> Option<ModelPrediction> {
        self.prediction
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Best hit inside one slice of the grid.
#[derive(Debug, Clone, Copy)]
struct Hit {
    matches: usize,
    /// Flat grid position: catalog_index × seeds + (seed − seed_min).
    position: u64,
    /// Generator state after the observed length.
    end_state: LcgState,
}

impl Hit {
    /// Higher score wins; equal scores keep the earlier grid position.
    fn better(a: Option<Hit>, b: Option<Hit>) -> Option<Hit> {
        match (a, b) {
            (Some(x), Some(y)) => {
                if y.matches > x.matches || (y.matches == x.matches && y.position < x.position) {
                    Some(y)
                } else {
                    Some(x)
                }
            }
            (x, None) => x,
            (None, y) => y,
        }
    }
}

fn score(params: &LcgParams, seed: u64, observed: &[Symbol]) -> (usize, LcgState) {
    let mut state = LcgState::seeded(seed);
    let mut matches = 0;
    for &expected in observed {
        let (next, symbol) = state.next(params);
        if symbol == expected {
            matches += 1;
        }
        state = next;
    }
    (matches, state)
}

/// Best hit in `start..end`, or whatever was found before `cancel` was set.
fn scan_range(
    observed: &[Symbol],
    config: &GeneratorConfig,
    seeds: u64,
    (start, end): (u64, u64),
    cancel: &AtomicBool,
) -> Option<Hit> {
    let mut best: Option<Hit> = None;
    for position in start..end {
        if (position - start) % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            break;
        }
        let params = &config.catalog[(position / seeds) as usize];
        let seed = config.seed_min + position % seeds;
        let (matches, end_state) = score(params, seed, observed);
        // strict improvement only: the earliest of equal scores survives
        if matches > 0 && best.is_none_or(|b| matches > b.matches) {
            best = Some(Hit {
                matches,
                position,
                end_state,
            });
        }
    }
    best
}

/// Search the configured grid for the generator closest to `observed`.
pub fn find_potential_seed(
    observed: &[Symbol],
    config: &GeneratorConfig,
) -> Option<GeneratorCandidate> {
    find_potential_seed_cancellable(observed, config, &AtomicBool::new(false))
}

/// [`find_potential_seed`] that stops every worker soon after `cancel` is
/// set. A cancelled search returns `None`.
pub fn find_potential_seed_cancellable(
    observed: &[Symbol],
    config: &GeneratorConfig,
    cancel: &AtomicBool,
) -> Option<GeneratorCandidate> {
    if observed.is_empty() || config.catalog.is_empty() {
        return None;
    }
    let (Some(seeds), Some(grid)) = (config.seeds_per_params(), config.grid_size()) else {
        return None;
    };
    let started = Instant::now();
    let workers = config.worker_count() as u64;
    let chunk = grid.div_ceil(workers);

    let best = if workers == 1 {
        scan_range(observed, config, seeds, (0, grid), cancel)
    } else {
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    let start = w * chunk;
                    let end = start.saturating_add(chunk).min(grid);
                    s.spawn(move || scan_range(observed, config, seeds, (start, end), cancel))
                })
                .collect();

            handles.into_iter().fold(None, |acc, handle| match handle.join() {
                Ok(hit) => Hit::better(acc, hit),
                Err(_) => {
                    warn!("generator search worker panicked; its slice is skipped");
                    acc
                }
            })
        })
    };

    if cancel.load(Ordering::Relaxed) {
        debug!(
            "generator search cancelled after {:.1} ms",
            started.elapsed().as_secs_f64() * 1000.0
        );
        return None;
    }

    let hit = best?;
    let catalog_index = (hit.position / seeds) as usize;
    let params = config.catalog[catalog_index];
    let seed = config.seed_min + hit.position % seeds;
    let confidence = hit.matches as f64 / observed.len() as f64;
    let (predicted_next, _) = simulate(&params, hit.end_state, config.lookahead);

    debug!(
        "generator search: {grid} candidates on {workers} worker(s) in {:.1} ms, best seed {seed} \
         of {params:?} at {confidence:.3}",
        started.elapsed().as_secs_f64() * 1000.0
    );

    Some(GeneratorCandidate {
        params,
        catalog_index,
        seed,
        confidence,
        matched_length: (confidence * observed.len() as f64).floor() as usize,
        predicted_next,
    })
}

// ---------------------------------------------------------------------------
// Goodness of fit
// ---------------------------------------------------------------------------

/// χ² statistic of the symbol counts against the uniform expectation n/4.
pub fn chi_square_test(symbols: &[Symbol]) -> ChiSquareResult {
    let observed = symbol_counts(symbols);
    let expected = symbols.len() as f64 / ALPHABET_SIZE as f64;
    let statistic = if expected > 0.0 {
        observed
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                diff * diff / expected
            })
            .sum()
    } else {
        0.0
    };

    let exact_p_value = ChiSquared::new((ALPHABET_SIZE - 1) as f64)
        .ok()
        .map(|dist| dist.sf(statistic));

    ChiSquareResult {
        statistic,
        p_value: (1.0 - statistic / CHI_SQUARE_CRITICAL_3DF).clamp(0.0, 1.0),
        exact_p_value,
        is_random: statistic < CHI_SQUARE_CRITICAL_3DF,
        observed,
        expected,
    }
}

/// Seed search plus goodness-of-fit.
pub fn analyze(symbols: &[Symbol], config: &GeneratorConfig) -> Result<MonteCarloAnalysis> {
    analyze_cancellable(symbols, config, &AtomicBool::new(false))
}

/// [`analyze`] whose seed search gives up once `cancel` is set.
pub fn analyze_cancellable(
    symbols: &[Symbol],
    config: &GeneratorConfig,
    cancel: &AtomicBool,
) -> Result<MonteCarloAnalysis> {
    config.validate()?;
    if symbols.len() < config.min_symbols {
        return Err(AnalysisError::insufficient(
            "Monte Carlo",
            config.min_symbols,
            symbols.len(),
        ));
    }

    let candidate = find_potential_seed_cancellable(symbols, config, cancel);
    if cancel.load(Ordering::Relaxed) {
        return Err(AnalysisError::Cancelled {
            model: "Monte Carlo",
        });
    }
    let prediction = candidate.as_ref().and_then(|c| {
        c.predicted_next
            .first()
            .map(|&next| ModelPrediction::new(next, c.confidence))
    });

    Ok(MonteCarloAnalysis {
        candidate,
        chi_square: chi_square_test(symbols),
        total_symbols: symbols.len(),
        prediction,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Sequence;

    fn small_config(workers: usize) -> GeneratorConfig {
        GeneratorConfig {
            catalog: vec![LcgParams::new(69069, 1, 1 << 32), LcgParams::new(1597, 51749, 244_944)],
            seed_min: 1,
            seed_max: 200,
            workers: Some(workers),
            ..GeneratorConfig::default()
        }
    }

    fn generated(params: &LcgParams, seed: u64, len: usize) -> Vec<Symbol> {
        simulate(params, LcgState::seeded(seed), len).0
    }

    #[test]
    fn test_next_matches_formula() {
        let p = LcgParams::new(1597, 51749, 244_944);
        let (s1, sym) = LcgState::seeded(1).next(&p);
        // (1597 * 1 + 51749) % 244944 = 53346; floor(53346 / 244944 * 4) + 1 = 1
        assert_eq!(s1.state, 53346);
        assert_eq!(s1.step, 1);
        assert_eq!(sym, Symbol::HEARTS);
    }

    #[test]
    fn test_large_modulus_does_not_overflow() {
        let p = LcgParams::new(22_695_477, 1, 1 << 32);
        let mut state = LcgState::seeded(u32::MAX as u64);
        for _ in 0..1000 {
            let (next, _) = state.next(&p);
            assert!(next.state < 1 << 32);
            state = next;
        }
        assert_eq!(state.step, 1000);
    }

    #[test]
    fn test_similarity() {
        let a = Sequence::from_values([1, 2, 3, 4]).unwrap();
        let b = Sequence::from_values([1, 2, 4, 4, 1, 1]).unwrap();
        assert!((sequence_similarity(a.as_slice(), b.as_slice()) - 0.75).abs() < 1e-12);
        assert_eq!(sequence_similarity(&[], b.as_slice()), 0.0);
    }

    #[test]
    fn test_recovers_planted_seed() {
        let cfg = small_config(1);
        let params = cfg.catalog[1];
        let full = generated(&params, 137, 45);
        let (observed, future) = full.split_at(40);

        let candidate = find_potential_seed(observed, &cfg).expect("candidate");
        assert_eq!(candidate.seed, 137);
        assert_eq!(candidate.params, params);
        assert_eq!(candidate.catalog_index, 1);
        assert_eq!(candidate.confidence, 1.0);
        assert_eq!(candidate.matched_length, 40);
        assert_eq!(candidate.predicted_next, future.to_vec());
    }

    #[test]
    fn test_parallel_split_matches_single_worker() {
        let observed = generated(&LcgParams::new(1_664_525, 1_013_904_223, 1 << 32), 7, 30);
        let single = find_potential_seed(&observed, &small_config(1));
        for workers in [2, 3, 7, 16] {
            assert_eq!(
                find_potential_seed(&observed, &small_config(workers)),
                single,
                "workers={workers}"
            );
        }
    }

    #[test]
    fn test_ties_keep_earliest_candidate() {
        // Every seed of the first generator scores identically on a
        // one-symbol observation that all of them can produce; earliest wins.
        let cfg = small_config(4);
        let first = generated(&cfg.catalog[0], 1, 1);
        let candidate = find_potential_seed(&first, &cfg).expect("candidate");
        assert_eq!(candidate.catalog_index, 0);
        assert_eq!(candidate.seed, 1);
    }

    #[test]
    fn test_empty_observation_has_no_candidate() {
        assert!(find_potential_seed(&[], &small_config(2)).is_none());
    }

    #[test]
    fn test_chi_square_uniform_is_zero() {
        let values: Vec<i64> = (0..100).map(|i| (i % 4) + 1).collect();
        let s = Sequence::from_values(values).unwrap();
        let result = chi_square_test(s.as_slice());
        assert_eq!(result.statistic, 0.0);
        assert!(result.is_random);
        assert_eq!(result.verdict(), "appears random");
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.observed, [25; 4]);
        assert!((result.exact_p_value.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_chi_square_constant_is_pattern() {
        let s = Sequence::from_values(vec![2; 40]).unwrap();
        let result = chi_square_test(s.as_slice());
        // expected 10 each: (30² + 3·10²) / 10 = 120
        assert!((result.statistic - 120.0).abs() < 1e-9);
        assert!(!result.is_random);
        assert_eq!(result.p_value, 0.0);
        assert!(result.exact_p_value.unwrap() < 1e-6);
    }

    #[test]
    fn test_chi_square_empty() {
        let result = chi_square_test(&[]);
        assert_eq!(result.statistic, 0.0);
        assert!(result.is_random);
    }

    #[test]
    fn test_analyze_requires_ten_symbols() {
        let s = Sequence::from_values([1, 2, 3, 4, 1, 2, 3, 4, 1]).unwrap();
        let err = analyze(s.as_slice(), &small_config(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Need at least 10 symbols for Monte Carlo analysis"
        );
    }

    #[test]
    fn test_analyze_prediction_follows_candidate() {
        let cfg = small_config(2);
        let observed = generated(&cfg.catalog[0], 99, 25);
        let result = analyze(&observed, &cfg).unwrap();
        let candidate = result.candidate.as_ref().unwrap();
        let prediction = result.prediction.unwrap();
        assert_eq!(prediction.next_symbol, candidate.predicted_next[0]);
        assert_eq!(prediction.confidence, candidate.confidence);
        assert_eq!(result.total_symbols, 25);
    }

    #[test]
    fn test_validate_rejects_zero_modulus() {
        let cfg = GeneratorConfig {
            catalog: vec![LcgParams::new(3, 1, 0)],
            ..GeneratorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_grid_size() {
        assert_eq!(small_config(1).grid_size(), Some(400));
        let inverted = GeneratorConfig {
            seed_min: 10,
            seed_max: 9,
            ..GeneratorConfig::default()
        };
        assert_eq!(inverted.grid_size(), None);
    }

    #[test]
    fn test_validate_rejects_overflowing_grid() {
        let full_range = GeneratorConfig {
            seed_min: 0,
            seed_max: u64::MAX,
            ..GeneratorConfig::default()
        };
        assert_eq!(full_range.grid_size(), None);
        let err = full_range.validate().unwrap_err();
        assert!(err.to_string().contains("does not fit in u64"), "{err}");

        // fits for one catalog entry, overflows for two
        let wide = GeneratorConfig {
            seed_min: 0,
            seed_max: 1 << 63,
            ..small_config(1)
        };
        assert_eq!(wide.grid_size(), None);
        assert!(wide.validate().is_err());
        assert!(find_potential_seed(&generated(&wide.catalog[0], 1, 12), &wide).is_none());

        let single = GeneratorConfig {
            catalog: vec![LcgParams::new(69069, 1, 1 << 32)],
            ..wide
        };
        assert_eq!(single.grid_size(), Some((1 << 63) + 1));
        assert!(single.validate().is_ok());
    }

    #[test]
    fn test_cancelled_search_returns_nothing() {
        let cancel = AtomicBool::new(true);
        let observed = generated(&small_config(1).catalog[0], 5, 20);
        for workers in [1, 4] {
            let cfg = small_config(workers);
            assert!(find_potential_seed_cancellable(&observed, &cfg, &cancel).is_none());
            assert!(find_potential_seed(&observed, &cfg).is_some());
        }

        let err = analyze_cancellable(&observed, &small_config(2), &cancel).unwrap_err();
        assert_eq!(err.to_string(), "Monte Carlo analysis was cancelled");
    }

    #[test]
    fn test_cancel_stops_a_large_search_early() {
        let cfg = GeneratorConfig {
            seed_max: u64::MAX / 8,
            workers: Some(2),
            ..GeneratorConfig::default()
        };
        let observed = generated(&cfg.catalog[0], 3, 30);
        let cancel = AtomicBool::new(false);
        let started = Instant::now();
        let result = std::thread::scope(|s| {
            let search = s.spawn(|| find_potential_seed_cancellable(&observed, &cfg, &cancel));
            std::thread::sleep(std::time::Duration::from_millis(20));
            cancel.store(true, Ordering::Relaxed);
            search.join().unwrap()
        });
        assert!(result.is_none());
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
