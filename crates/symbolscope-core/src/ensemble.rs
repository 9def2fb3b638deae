//! Ensemble combiner: packages each model's best guess with a static weight.
//!
//! Every configured model gets exactly one entry. A model that produced no
//! prediction is represented by a synthetic entry (uniformly random symbol,
//! low fixed confidence) rather than being dropped. Weights are static and
//! do not need to sum to 1 over the models present.
//!
//! By default nothing is fused; with `fuse` enabled a weighted vote over the
//! real (non-synthetic) entries is reported as [`Consensus`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::prediction::{ModelPrediction, argmax};
use crate::symbol::{ALPHABET_SIZE, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKey {
    Markov,
    MonteCarlo,
    Variational,
    HiddenState,
}

impl ModelKey {
    pub const ALL: [ModelKey; 4] = [
        ModelKey::Markov,
        ModelKey::MonteCarlo,
        ModelKey::Variational,
        ModelKey::HiddenState,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKey::Markov => "markov",
            ModelKey::MonteCarlo => "monte_carlo",
            ModelKey::Variational => "variational",
            ModelKey::HiddenState => "hidden_state",
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKey {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ModelKey::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| AnalysisError::config(format!("unknown model '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Static weight per participating model.
    pub weights: BTreeMap<ModelKey, f64>,
    /// Confidence given to synthetic entries.
    pub placeholder_confidence: f64,
    /// Compute a weighted-vote [`Consensus`].
    pub fuse: bool,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (ModelKey::Markov, 0.3),
                (ModelKey::MonteCarlo, 0.3),
                (ModelKey::Variational, 0.4),
            ]),
            placeholder_confidence: 0.25,
            fuse: false,
        }
    }
}

impl EnsembleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.weights.is_empty() {
            return Err(AnalysisError::config(
                "ensemble.weights must name at least one model",
            ));
        }
        if let Some((key, w)) = self
            .weights
            .iter()
            .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
        {
            return Err(AnalysisError::config(format!(
                "ensemble weight for {key} must be a non-negative number, got {w}"
            )));
        }
        if !(0.0..=1.0).contains(&self.placeholder_confidence) {
            return Err(AnalysisError::config(
                "ensemble.placeholder_confidence must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleEntry {
    pub next_symbol: Symbol,
    pub confidence: f64,
    /// True when the model had no prediction and this entry is a placeholder.
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    pub next_symbol: Symbol,
    /// Winning score divided by the total score.
    pub score_share: f64,
    /// Σ weight · confidence per symbol.
    pub scores: [f64; ALPHABET_SIZE],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub weights: BTreeMap<ModelKey, f64>,
    pub predictions: BTreeMap<ModelKey, EnsembleEntry>,
    pub consensus: Option<Consensus>,
}

impl EnsembleResult {
    pub fn synthetic_count(&self) -> usize {
        self.predictions.values().filter(|e| e.synthetic).count()
    }
}

/// Combine per-model predictions into one entry per configured model.
///
/// Predictions for models without a configured weight are ignored.
pub fn combine<R: Rng + ?Sized>(
    predictions: &BTreeMap<ModelKey, ModelPrediction>,
    config: &EnsembleConfig,
    rng: &mut R,
) -> EnsembleResult {
    let mut entries = BTreeMap::new();
    for &key in config.weights.keys() {
        let entry = match predictions.get(&key) {
            Some(p) => EnsembleEntry {
                next_symbol: p.next_symbol,
                confidence: p.confidence,
                synthetic: false,
            },
            None => {
                warn!("no {key} prediction available, using a placeholder");
                EnsembleEntry {
                    next_symbol: Symbol::ALL[rng.random_range(0..ALPHABET_SIZE)],
                    confidence: config.placeholder_confidence,
                    synthetic: true,
                }
            }
        };
        entries.insert(key, entry);
    }

    let consensus = if config.fuse {
        weighted_vote(&entries, &config.weights)
    } else {
        None
    };

    EnsembleResult {
        weights: config.weights.clone(),
        predictions: entries,
        consensus,
    }
}

/// `None` when no real entry carries any weight.
fn weighted_vote(
    entries: &BTreeMap<ModelKey, EnsembleEntry>,
    weights: &BTreeMap<ModelKey, f64>,
) -> Option<Consensus> {
    let mut scores = [0.0; ALPHABET_SIZE];
    for (key, entry) in entries.iter().filter(|(_, e)| !e.synthetic) {
        let w = weights.get(key).copied().unwrap_or(0.0);
        scores[entry.next_symbol.index()] += w * entry.confidence;
    }
    let total: f64 = scores.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let (best, score) = argmax(&scores);
    Some(Consensus {
        next_symbol: Symbol::ALL[best],
        score_share: score / total,
        scores,
    })
}
