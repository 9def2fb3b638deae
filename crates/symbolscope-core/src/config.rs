//! Tunables for every analysis component, loadable from JSON.
//!
//! Missing keys fall back to their defaults, so a file only needs the
//! values it changes:
//!
//! ```json
//! { "entropy": { "window": 8 }, "timeout_ms": 2000 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ensemble::EnsembleConfig;
use crate::entropy::EntropyConfig;
use crate::error::{AnalysisError, Result};
use crate::generator::GeneratorConfig;
use crate::hidden_state::HiddenStateConfig;
use crate::markov::MarkovConfig;
use crate::patterns::PatternConfig;
use crate::variational::VariationalConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub entropy: EntropyConfig,
    pub markov: MarkovConfig,
    pub patterns: PatternConfig,
    pub generator: GeneratorConfig,
    pub variational: VariationalConfig,
    pub hidden_state: HiddenStateConfig,
    pub ensemble: EnsembleConfig,
    /// Deadline for a full engine run; `None` waits for every model.
    pub timeout_ms: Option<u64>,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.entropy.validate()?;
        self.markov.validate()?;
        self.patterns.validate()?;
        self.generator.validate()?;
        self.variational.validate()?;
        self.hidden_state.validate()?;
        self.ensemble.validate()?;
        if self.timeout_ms == Some(0) {
            return Err(AnalysisError::config("timeout_ms must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
