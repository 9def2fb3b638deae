//! Two-state "random vs. pattern-following" model over recent symbols.
//!
//! State 0 emits uniformly. State 1 emits proportionally to the recent
//! frequencies, smoothed towards uniform. The prediction is the dominant
//! recent symbol, trusted only when it clearly dominates.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::prediction::{ModelPrediction, Predictor};
use crate::symbol::{ALPHABET_SIZE, Symbol, recent, symbol_counts};

/// Share of emission mass in the pattern state spread uniformly.
const EMISSION_SMOOTHING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiddenStateConfig {
    /// Most recent symbols considered.
    pub recent: usize,
    pub min_symbols: usize,
    /// Dominance above which the prediction is trusted.
    pub dominance_threshold: f64,
    /// Confidence reported when dominance is at or below the threshold.
    pub baseline_confidence: f64,
}

impl Default for HiddenStateConfig {
    fn default() -> Self {
        Self {
            recent: 20,
            min_symbols: 5,
            dominance_threshold: 0.4,
            baseline_confidence: 0.25,
        }
    }
}

impl HiddenStateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.recent == 0 || self.min_symbols == 0 {
            return Err(AnalysisError::config(
                "hidden_state.recent and hidden_state.min_symbols must be at least 1",
            ));
        }
        for (name, v) in [
            ("dominance_threshold", self.dominance_threshold),
            ("baseline_confidence", self.baseline_confidence),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(AnalysisError::config(format!(
                    "hidden_state.{name} must be within [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenStateAnalysis {
    /// State labels: 0 = random, 1 = pattern-following.
    pub states: [u8; 2],
    /// Emission distribution per state; each row sums to 1.
    pub emission_probs: [[f64; ALPHABET_SIZE]; 2],
    pub frequencies: [u32; ALPHABET_SIZE],
    /// Share of the most frequent recent symbol.
    pub dominance: f64,
    pub prediction: ModelPrediction,
    pub symbols_considered: usize,
}

impl Predictor for HiddenStateAnalysis {
    fn prediction(&self) -> Option<ModelPrediction> {
        Some(self.prediction)
    }
}

pub fn analyze(symbols: &[Symbol], config: &HiddenStateConfig) -> Result<HiddenStateAnalysis> {
    config.validate()?;
    let window = recent(symbols, config.recent);
    if window.len() < config.min_symbols {
        return Err(AnalysisError::insufficient(
            "hidden-state",
            config.min_symbols,
            window.len(),
        ));
    }

    let frequencies = symbol_counts(window);
    let total = window.len() as f64;

    let mut pattern_row: [f64; ALPHABET_SIZE] = frequencies
        .map(|f| EMISSION_SMOOTHING + (1.0 - EMISSION_SMOOTHING) * f as f64 / total);
    let row_sum: f64 = pattern_row.iter().sum();
    for p in &mut pattern_row {
        *p /= row_sum;
    }

    // first maximum wins ties
    let (best, &max_freq) = frequencies
        .iter()
        .enumerate()
        .fold((0, &frequencies[0]), |acc, (i, f)| if *f > *acc.1 { (i, f) } else { acc });
    let dominance = max_freq as f64 / total;
    let confidence = if dominance > config.dominance_threshold {
        dominance
    } else {
        config.baseline_confidence
    };

    Ok(HiddenStateAnalysis {
        states: [0, 1],
        emission_probs: [[1.0 / ALPHABET_SIZE as f64; ALPHABET_SIZE], pattern_row],
        frequencies,
        dominance,
        prediction: ModelPrediction::new(Symbol::ALL[best], confidence),
        symbols_considered: window.len(),
    })
}
