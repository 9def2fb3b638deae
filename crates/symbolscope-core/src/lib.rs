//! # symbolscope-core
//!
//! **How random is a person, really?**
//!
//! `symbolscope-core` scores a sequence of four-way human choices (♥ ♦ ♣ ♠)
//! for randomness with several independent models and packages their
//! next-symbol guesses into one ensemble judgment. It is a pure library: it
//! takes an immutable sequence snapshot and returns result records. Storage,
//! sessions and presentation belong to the caller.
//!
//! ## Quick Start
//!
//! ```
//! use symbolscope_core::{Analyzer, Sequence};
//!
//! let sequence = Sequence::parse("1 2 1 2 3 1 2 4 1 2 1 2").unwrap();
//! let report = Analyzer::with_defaults().analyze(&sequence);
//!
//! let markov = report.markov.data.as_ref().unwrap();
//! println!("next after {}: {}", sequence.recent(1)[0], markov.prediction.next_symbol);
//! assert_eq!(report.ensemble.predictions.len(), 3);
//! ```
//!
//! ## Models
//!
//! - [`entropy`]: windowed Shannon entropy as a percentage of the 2-bit
//!   maximum, with a trend against the previous window
//! - [`markov`]: first-order transition matrix and most likely successor
//! - [`patterns`]: repeated contiguous subsequences
//! - [`generator`]: brute-force search for a linear congruential generator
//!   that reproduces the sequence, plus a χ² goodness-of-fit test
//! - [`variational`]: Dirichlet posterior over symbol probabilities
//! - [`hidden_state`]: random vs. pattern-following two-state model
//!
//! [`Analyzer`] runs them all in parallel and feeds their predictions to the
//! [`ensemble`] combiner. Every component can also be called on its own
//! through its `analyze` function.

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod entropy;
pub mod error;
pub mod generator;
pub mod hidden_state;
pub mod markov;
pub mod patterns;
pub mod prediction;
pub mod special;
pub mod symbol;
pub mod variational;

pub use config::AnalysisConfig;
pub use engine::{AnalysisReport, Analyzer};
pub use ensemble::{Consensus, EnsembleConfig, EnsembleEntry, EnsembleResult, ModelKey, combine};
pub use entropy::{EntropyConfig, EntropyPoint, EntropyReport, Trend, window_entropy};
pub use error::{AnalysisError, Outcome, Result};
pub use generator::{
    ChiSquareResult, GeneratorCandidate, GeneratorConfig, LcgParams, LcgState, MonteCarloAnalysis,
    chi_square_test, find_potential_seed, find_potential_seed_cancellable, sequence_similarity,
};
pub use hidden_state::{HiddenStateAnalysis, HiddenStateConfig};
pub use markov::{MarkovAnalysis, MarkovConfig, TransitionMatrix, transition_matrix};
pub use patterns::{Pattern, PatternConfig, PatternReport};
pub use prediction::{ModelPrediction, Predictor};
pub use symbol::{ALPHABET_SIZE, Sequence, Symbol};
pub use variational::{VariationalConfig, VariationalPosterior, run_variational_inference};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
