//! Error taxonomy and the tagged `{ error, data }` outcome shape.
//!
//! Analysis functions return [`Result`]. At the boundary with callers that
//! must never see a failure (the engine, the CLI's JSON output) results are
//! folded into an [`Outcome`], which always carries both keys.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout symbolscope-core.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Everything that can stop a model from producing a result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The sequence is shorter than the model's minimum.
    #[error("Need at least {needed} symbols for {model} analysis")]
    InsufficientData {
        model: &'static str,
        needed: usize,
        got: usize,
    },

    /// An integer outside the 1..=4 alphabet reached the boundary.
    #[error("invalid symbol {0}: expected an integer in 1..=4")]
    InvalidSymbol(i64),

    /// A text token that names no symbol.
    #[error("unrecognized symbol token '{0}'")]
    UnrecognizedToken(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A fan-out branch missed the caller's deadline.
    #[error("{model} analysis timed out after {timeout_ms} ms")]
    TimedOut { model: &'static str, timeout_ms: u64 },

    /// A fan-out branch exited without reporting (panic or spawn failure).
    #[error("{model} analysis did not complete")]
    Incomplete { model: &'static str },

    /// The caller stopped the analysis before it finished.
    #[error("{model} analysis was cancelled")]
    Cancelled { model: &'static str },
}

impl AnalysisError {
    pub(crate) fn insufficient(model: &'static str, needed: usize, got: usize) -> Self {
        Self::InsufficientData { model, needed, got }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for the "not enough symbols yet" condition, which callers
    /// usually display rather than treat as a failure.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Tagged result record: exactly one of `error` / `data` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            error: None,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}
