//! First-order Markov transition model.
//!
//! Rows of the transition matrix are indexed by the current symbol and
//! columns by the next one. A symbol that never appears as a predecessor
//! keeps an all-zero row: "no information", not "equally likely".

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::prediction::{ModelPrediction, Predictor, argmax};
use crate::symbol::{ALPHABET_SIZE, Symbol};

/// P(next = column | current = row).
pub type TransitionMatrix = [[f64; ALPHABET_SIZE]; ALPHABET_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkovConfig {
    pub min_symbols: usize,
}

impl Default for MarkovConfig {
    fn default() -> Self {
        Self { min_symbols: 2 }
    }
}

impl MarkovConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_symbols < 2 {
            return Err(AnalysisError::config(
                "markov.min_symbols must be at least 2",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkovAnalysis {
    pub transition_matrix: TransitionMatrix,
    /// Outgoing transitions counted per current symbol (the row normalizers).
    pub symbol_counts: [u32; ALPHABET_SIZE],
    pub prediction: ModelPrediction,
    pub total_symbols: usize,
}

impl Predictor for MarkovAnalysis {
    /// `None` when the last symbol has no recorded successors.
    fn prediction(&self) -> Option<ModelPrediction> {
        (self.prediction.confidence > 0.0).then_some(self.prediction)
    }
}

/// Raw transition counts and per-row totals.
pub fn transition_counts(
    symbols: &[Symbol],
) -> ([[u32; ALPHABET_SIZE]; ALPHABET_SIZE], [u32; ALPHABET_SIZE]) {
    let mut counts = [[0u32; ALPHABET_SIZE]; ALPHABET_SIZE];
    let mut row_totals = [0u32; ALPHABET_SIZE];
    for pair in symbols.windows(2) {
        let (current, next) = (pair[0].index(), pair[1].index());
        counts[current][next] += 1;
        row_totals[current] += 1;
    }
    (counts, row_totals)
}

/// Row-normalize counts; empty rows stay zero.
pub fn normalize(
    counts: &[[u32; ALPHABET_SIZE]; ALPHABET_SIZE],
    row_totals: &[u32; ALPHABET_SIZE],
) -> TransitionMatrix {
    let mut matrix = [[0.0; ALPHABET_SIZE]; ALPHABET_SIZE];
    for (row, (cells, &total)) in matrix.iter_mut().zip(counts.iter().zip(row_totals)) {
        if total == 0 {
            continue;
        }
        for (p, &c) in row.iter_mut().zip(cells) {
            *p = c as f64 / total as f64;
        }
    }
    matrix
}

pub fn transition_matrix(symbols: &[Symbol]) -> TransitionMatrix {
    let (counts, totals) = transition_counts(symbols);
    normalize(&counts, &totals)
}

/// Most probable successor of `last`; ties go to the lowest symbol.
///
/// An all-zero row predicts symbol 1 with confidence 0.
pub fn predict_next(matrix: &TransitionMatrix, last: Symbol) -> ModelPrediction {
    let (index, probability) = argmax(&matrix[last.index()]);
    ModelPrediction::new(Symbol::ALL[index], probability)
}

pub fn analyze(symbols: &[Symbol], config: &MarkovConfig) -> Result<MarkovAnalysis> {
    config.validate()?;
    let Some(&last) = symbols.last().filter(|_| symbols.len() >= config.min_symbols) else {
        return Err(AnalysisError::insufficient(
            "Markov",
            config.min_symbols,
            symbols.len(),
        ));
    };

    let (counts, symbol_counts) = transition_counts(symbols);
    let transition_matrix = normalize(&counts, &symbol_counts);
    let prediction = predict_next(&transition_matrix, last);
    debug!(
        "markov: {} symbols, last={last}, predicted {} (p={:.3})",
        symbols.len(),
        prediction.next_symbol,
        prediction.confidence
    );

    Ok(MarkovAnalysis {
        transition_matrix,
        symbol_counts,
        prediction,
        total_symbols: symbols.len(),
    })
}
