//! Full analysis: every model in parallel over one snapshot, then the combiner.
//!
//! Each model runs on its own named worker thread with a cheap clone of the
//! [`Sequence`] (shared `Arc`) and reports back over a channel. The caller
//! waits for all of them or until `timeout_ms` elapses, whichever comes
//! first. Models that have not reported by then are recorded as timed out
//! and their late results are dropped when the channel closes. The generator
//! search is also told to stop through a shared cancel flag, so its worker
//! threads wind down instead of scanning the rest of the grid. A worker that
//! panics never reports; it is recorded as incomplete.
//!
//! The report always has every key. Models that failed or were cut off feed
//! a placeholder into the ensemble instead.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::ensemble::{self, EnsembleResult, ModelKey};
use crate::entropy::{self, EntropyReport};
use crate::error::{AnalysisError, Outcome, Result};
use crate::generator::{self, MonteCarloAnalysis};
use crate::hidden_state::{self, HiddenStateAnalysis};
use crate::markov::{self, MarkovAnalysis};
use crate::patterns::{self, PatternReport};
use crate::prediction::{ModelPrediction, Predictor};
use crate::symbol::Sequence;
use crate::variational::{self, VariationalPosterior};

/// Everything one engine run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_symbols: usize,
    pub entropy: Outcome<EntropyReport>,
    pub markov: Outcome<MarkovAnalysis>,
    pub patterns: Outcome<PatternReport>,
    pub monte_carlo: Outcome<MonteCarloAnalysis>,
    pub variational: Outcome<VariationalPosterior>,
    pub hidden_state: Outcome<HiddenStateAnalysis>,
    pub ensemble: EnsembleResult,
}

// ---------------------------------------------------------------------------
// Fan-out branches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Entropy,
    Markov,
    Patterns,
    MonteCarlo,
    Variational,
    HiddenState,
}

impl Stage {
    const ALL: [Stage; 6] = [
        Stage::Entropy,
        Stage::Markov,
        Stage::Patterns,
        Stage::MonteCarlo,
        Stage::Variational,
        Stage::HiddenState,
    ];

    /// Name used in error messages.
    fn model(self) -> &'static str {
        match self {
            Stage::Entropy => "entropy",
            Stage::Markov => "Markov",
            Stage::Patterns => "pattern",
            Stage::MonteCarlo => "Monte Carlo",
            Stage::Variational => "VI",
            Stage::HiddenState => "hidden-state",
        }
    }

    fn thread_name(self) -> String {
        let short = match self {
            Stage::Entropy => "entropy",
            Stage::Markov => "markov",
            Stage::Patterns => "patterns",
            Stage::MonteCarlo => "monte-carlo",
            Stage::Variational => "variational",
            Stage::HiddenState => "hidden-state",
        };
        format!("symbolscope-{short}")
    }

    fn run(self, sequence: &Sequence, config: &AnalysisConfig, cancel: &AtomicBool) -> Finished {
        let symbols = sequence.as_slice();
        match self {
            Stage::Entropy => Finished::Entropy(entropy::analyze(symbols, &config.entropy)),
            Stage::Markov => Finished::Markov(markov::analyze(symbols, &config.markov)),
            Stage::Patterns => Finished::Patterns(patterns::analyze(symbols, &config.patterns)),
            Stage::MonteCarlo => Finished::MonteCarlo(generator::analyze_cancellable(
                symbols,
                &config.generator,
                cancel,
            )),
            Stage::Variational => {
                Finished::Variational(variational::analyze(symbols, &config.variational))
            }
            Stage::HiddenState => {
                Finished::HiddenState(hidden_state::analyze(symbols, &config.hidden_state))
            }
        }
    }
}

enum Finished {
    Entropy(Result<EntropyReport>),
    Markov(Result<MarkovAnalysis>),
    Patterns(Result<PatternReport>),
    MonteCarlo(Result<MonteCarloAnalysis>),
    Variational(Result<VariationalPosterior>),
    HiddenState(Result<HiddenStateAnalysis>),
}

#[derive(Default)]
struct Collected {
    entropy: Option<Result<EntropyReport>>,
    markov: Option<Result<MarkovAnalysis>>,
    patterns: Option<Result<PatternReport>>,
    monte_carlo: Option<Result<MonteCarloAnalysis>>,
    variational: Option<Result<VariationalPosterior>>,
    hidden_state: Option<Result<HiddenStateAnalysis>>,
    received: usize,
}

impl Collected {
    fn store(&mut self, finished: Finished) {
        self.received += 1;
        match finished {
            Finished::Entropy(r) => self.entropy = Some(r),
            Finished::Markov(r) => self.markov = Some(r),
            Finished::Patterns(r) => self.patterns = Some(r),
            Finished::MonteCarlo(r) => self.monte_carlo = Some(r),
            Finished::Variational(r) => self.variational = Some(r),
            Finished::HiddenState(r) => self.hidden_state = Some(r),
        }
    }

    fn is_complete(&self) -> bool {
        self.received == Stage::ALL.len()
    }
}

/// Why a branch has no result.
#[derive(Debug, Clone, Copy)]
enum Missing {
    TimedOut(u64),
    Incomplete,
}

fn settle<T>(slot: Option<Result<T>>, stage: Stage, missing: Missing) -> Outcome<T> {
    let result = slot.unwrap_or_else(|| {
        let err = match missing {
            Missing::TimedOut(timeout_ms) => AnalysisError::TimedOut {
                model: stage.model(),
                timeout_ms,
            },
            Missing::Incomplete => AnalysisError::Incomplete {
                model: stage.model(),
            },
        };
        warn!("{err}");
        Err(err)
    });
    Outcome::from(result)
}

fn offer<T: Predictor>(
    predictions: &mut BTreeMap<ModelKey, ModelPrediction>,
    key: ModelKey,
    outcome: &Outcome<T>,
) {
    if let Some(p) = outcome.data().and_then(|d| d.prediction()) {
        predictions.insert(key, p);
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Runs every model over a sequence and combines their predictions.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: Arc<AnalysisConfig>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Analyzer {
    /// Validates `config` up front so individual runs cannot fail on it.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: Arc::new(AnalysisConfig::default()),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze with the thread-local RNG for ensemble placeholders.
    pub fn analyze(&self, sequence: &Sequence) -> AnalysisReport {
        self.analyze_with_rng(sequence, &mut rand::rng())
    }

    pub fn analyze_with_rng<R: Rng + ?Sized>(
        &self,
        sequence: &Sequence,
        rng: &mut R,
    ) -> AnalysisReport {
        let started = Instant::now();
        let (collected, missing) = self.fan_out(sequence);

        let entropy = settle(collected.entropy, Stage::Entropy, missing);
        let markov = settle(collected.markov, Stage::Markov, missing);
        let patterns = settle(collected.patterns, Stage::Patterns, missing);
        let monte_carlo = settle(collected.monte_carlo, Stage::MonteCarlo, missing);
        let variational = settle(collected.variational, Stage::Variational, missing);
        let hidden_state = settle(collected.hidden_state, Stage::HiddenState, missing);

        let mut predictions = BTreeMap::new();
        offer(&mut predictions, ModelKey::Markov, &markov);
        offer(&mut predictions, ModelKey::MonteCarlo, &monte_carlo);
        offer(&mut predictions, ModelKey::Variational, &variational);
        offer(&mut predictions, ModelKey::HiddenState, &hidden_state);
        let ensemble = ensemble::combine(&predictions, &self.config.ensemble, rng);

        debug!(
            "analysis of {} symbols finished in {:.1} ms ({} placeholder(s))",
            sequence.len(),
            started.elapsed().as_secs_f64() * 1000.0,
            ensemble.synthetic_count()
        );

        AnalysisReport {
            total_symbols: sequence.len(),
            entropy,
            markov,
            patterns,
            monte_carlo,
            variational,
            hidden_state,
            ensemble,
        }
    }

    fn fan_out(&self, sequence: &Sequence) -> (Collected, Missing) {
        let (tx, rx) = mpsc::channel::<Finished>();
        let cancel = Arc::new(AtomicBool::new(false));
        for stage in Stage::ALL {
            let tx = tx.clone();
            let sequence = sequence.clone();
            let config = Arc::clone(&self.config);
            let cancel = Arc::clone(&cancel);
            let spawned = thread::Builder::new()
                .name(stage.thread_name())
                .spawn(move || {
                    let started = Instant::now();
                    let finished = stage.run(&sequence, &config, &cancel);
                    debug!(
                        "{} analysis took {:.1} ms",
                        stage.model(),
                        started.elapsed().as_secs_f64() * 1000.0
                    );
                    // the receiver is gone once the deadline has passed
                    let _ = tx.send(finished);
                });
            if let Err(e) = spawned {
                warn!("could not start {} worker: {e}", stage.model());
            }
        }
        drop(tx);

        let deadline = self
            .config
            .timeout()
            .map(|timeout| (Instant::now() + timeout, timeout.as_millis() as u64));
        let mut collected = Collected::default();
        let mut missing = Missing::Incomplete;

        while !collected.is_complete() {
            let received = match deadline {
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some((at, _)) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
            };
            match received {
                Ok(finished) => collected.store(finished),
                Err(RecvTimeoutError::Timeout) => {
                    if let Some((_, timeout_ms)) = deadline {
                        missing = Missing::TimedOut(timeout_ms);
                    }
                    cancel.store(true, Ordering::Relaxed);
                    break;
                }
                // every remaining worker exited without reporting
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        (collected, missing)
    }
}
