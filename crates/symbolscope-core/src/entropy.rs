//! Normalized Shannon entropy over sliding windows of the sequence.
//!
//! Entropy is reported as a percentage of the alphabet's maximum
//! (log2(4) = 2 bits), rounded to one decimal: 0 means one symbol repeated,
//! 100 means every symbol equally frequent.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::symbol::{Symbol, recent, symbol_counts};

/// log2 of the alphabet size.
pub const MAX_ENTROPY_BITS: f64 = 2.0;

// ---------------------------------------------------------------------------
// Configuration and result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropyConfig {
    /// Symbols per window.
    pub window: usize,
    /// Percentage points the current window must move to count as a trend.
    pub trend_margin: f64,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            window: 5,
            trend_margin: 5.0,
        }
    }
}

impl EntropyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(AnalysisError::config("entropy.window must be at least 1"));
        }
        if !self.trend_margin.is_finite() || self.trend_margin < 0.0 {
            return Err(AnalysisError::config(
                "entropy.trend_margin must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Direction of the current window relative to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn classify(current: f64, previous: f64, margin: f64) -> Self {
        if current > previous + margin {
            Self::Increasing
        } else if current < previous - margin {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

/// Entropy of one full window of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyPoint {
    /// Chronological index of the window's first symbol.
    pub window_start: usize,
    /// Exclusive end index.
    pub window_end: usize,
    pub entropy_value: f64,
    pub window_size: usize,
    pub symbols: Vec<Symbol>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyReport {
    /// Entropy of the most recent window.
    pub entropy_value: f64,
    /// Entropy of the window just before it (equals `entropy_value` if none).
    pub previous_value: f64,
    pub trend: Trend,
    pub window_size: usize,
    /// Every full sliding window, most recent first.
    pub historical: Vec<EntropyPoint>,
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Shannon entropy in bits over the symbols actually present.
pub fn shannon_bits(window: &[Symbol]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = window.len() as f64;
    symbol_counts(window)
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// Normalized entropy of a window as a percentage in [0, 100], one decimal.
pub fn window_entropy(window: &[Symbol]) -> f64 {
    let pct = (shannon_bits(window) / MAX_ENTROPY_BITS * 100.0).clamp(0.0, 100.0);
    (pct * 10.0).round() / 10.0
}

/// Sliding-window entropy series (stride 1), most recent window first.
pub fn entropy_history(symbols: &[Symbol], window: usize) -> Vec<EntropyPoint> {
    if window == 0 || symbols.len() < window {
        return Vec::new();
    }
    let mut points: Vec<EntropyPoint> = symbols
        .windows(window)
        .enumerate()
        .map(|(start, w)| EntropyPoint {
            window_start: start,
            window_end: start + window,
            entropy_value: window_entropy(w),
            window_size: window,
            symbols: w.to_vec(),
        })
        .collect();
    points.reverse();
    points
}

/// Current entropy, trend against the preceding window, and history.
pub fn analyze(symbols: &[Symbol], config: &EntropyConfig) -> Result<EntropyReport> {
    config.validate()?;
    let w = config.window;

    let current_window = recent(symbols, w);
    let entropy_value = window_entropy(current_window);

    let before = &symbols[..symbols.len() - current_window.len()];
    let previous_window = recent(before, w);
    let previous_value = if previous_window.is_empty() {
        entropy_value
    } else {
        window_entropy(previous_window)
    };

    Ok(EntropyReport {
        entropy_value,
        previous_value,
        trend: Trend::classify(entropy_value, previous_value, config.trend_margin),
        window_size: w,
        historical: entropy_history(symbols, w),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
