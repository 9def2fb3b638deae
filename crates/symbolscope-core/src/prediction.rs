//! The common next-symbol prediction shape shared by every model.

use serde::{Deserialize, Serialize};

use crate::symbol::{ALPHABET_SIZE, Symbol};

/// A model's best guess for the next symbol, with confidence on [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub next_symbol: Symbol,
    pub confidence: f64,
}

impl ModelPrediction {
    /// Confidence is clamped to [0, 1]; NaN becomes 0.
    pub fn new(next_symbol: Symbol, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            next_symbol,
            confidence,
        }
    }
}

/// Implemented by every analysis record that can feed the ensemble.
pub trait Predictor {
    /// `None` when the model has no usable guess.
    fn prediction(&self) -> Option<ModelPrediction>;
}

/// Index and value of the first maximum (lowest index wins ties).
pub(crate) fn argmax(values: &[f64; ALPHABET_SIZE]) -> (usize, f64) {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    (best, values[best])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4, 0.0]), (1, 0.4));
        assert_eq!(argmax(&[0.0; 4]), (0, 0.0));
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(ModelPrediction::new(Symbol::HEARTS, 1.7).confidence, 1.0);
        assert_eq!(ModelPrediction::new(Symbol::HEARTS, -0.1).confidence, 0.0);
        assert_eq!(ModelPrediction::new(Symbol::HEARTS, f64::NAN).confidence, 0.0);
    }
}
