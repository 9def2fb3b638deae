//! Repeated contiguous subsequences.
//!
//! Counts every window of each length in `[min_len, max_len]` (overlapping
//! occurrences included) and keeps the ones seen more than once. Counting
//! is a single hash pass per length; the ordering is the same as a naive
//! rescan would give: occurrences descending, then first appearance
//! (shorter lengths first, earlier positions first).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub min_len: usize,
    pub max_len: usize,
    /// Number of patterns reported.
    pub top: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_len: 2,
            max_len: 4,
            top: 5,
        }
    }
}

impl PatternConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_len == 0 {
            return Err(AnalysisError::config("patterns.min_len must be at least 1"));
        }
        if self.max_len < self.min_len {
            return Err(AnalysisError::config(
                "patterns.max_len must not be below patterns.min_len",
            ));
        }
        if self.top == 0 {
            return Err(AnalysisError::config("patterns.top must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern: Vec<Symbol>,
    pub occurrences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternReport {
    pub patterns: Vec<Pattern>,
    pub total_symbols: usize,
}

/// Every pattern of length `min_len..=max_len` occurring at least twice.
pub fn repeated_patterns(symbols: &[Symbol], min_len: usize, max_len: usize) -> Vec<Pattern> {
    let mut found = Vec::new();
    for len in min_len.max(1)..=max_len {
        if len > symbols.len() {
            break;
        }
        // window -> (first position, count)
        let mut seen: HashMap<&[Symbol], (usize, usize)> = HashMap::new();
        for (pos, window) in symbols.windows(len).enumerate() {
            seen.entry(window).or_insert((pos, 0)).1 += 1;
        }
        let mut repeated: Vec<(usize, &[Symbol], usize)> = seen
            .into_iter()
            .filter(|(_, (_, count))| *count > 1)
            .map(|(window, (first, count))| (first, window, count))
            .collect();
        repeated.sort_unstable_by_key(|&(first, _, _)| first);
        found.extend(repeated.into_iter().map(|(_, window, count)| Pattern {
            pattern: window.to_vec(),
            occurrences: count,
        }));
    }
    // stable: equal counts keep first-appearance order
    found.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    found
}

/// The `top` most frequent repeated patterns.
pub fn analyze(symbols: &[Symbol], config: &PatternConfig) -> Result<PatternReport> {
    config.validate()?;
    let mut patterns = repeated_patterns(symbols, config.min_len, config.max_len);
    patterns.truncate(config.top);
    Ok(PatternReport {
        patterns,
        total_symbols: symbols.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Sequence;

    fn seq(values: &[i64]) -> Sequence {
        Sequence::from_values(values.iter().copied()).unwrap()
    }

    fn values(p: &Pattern) -> Vec<u8> {
        p.pattern.iter().map(|s| s.value()).collect()
    }

    #[test]
    fn test_alternating_sequence() {
        let s = seq(&[1, 2, 1, 2, 1, 2]);
        let report = analyze(s.as_slice(), &PatternConfig::default()).unwrap();
        assert_eq!(report.patterns.len(), 5);
        assert_eq!(values(&report.patterns[0]), vec![1, 2]);
        assert_eq!(report.patterns[0].occurrences, 3);

        let listed: Vec<Vec<u8>> = report.patterns.iter().map(values).collect();
        assert_eq!(
            listed,
            vec![
                vec![1, 2],
                vec![2, 1],
                vec![1, 2, 1],
                vec![2, 1, 2],
                vec![1, 2, 1, 2],
            ]
        );
    }

    #[test]
    fn test_never_reports_single_occurrences() {
        let s = seq(&[1, 2, 3, 4, 1, 3, 2, 4, 4, 1, 2, 3]);
        for p in repeated_patterns(s.as_slice(), 2, 4) {
            assert!(p.occurrences > 1, "{:?} occurs once", p.pattern);
        }
    }

    #[test]
    fn test_overlapping_occurrences_count() {
        let s = seq(&[3, 3, 3, 3]);
        let all = repeated_patterns(s.as_slice(), 2, 4);
        assert_eq!(values(&all[0]), vec![3, 3]);
        assert_eq!(all[0].occurrences, 3);
        assert_eq!(all[1].occurrences, 2); // [3,3,3]
        assert_eq!(all.len(), 2); // [3,3,3,3] occurs once
    }

    #[test]
    fn test_no_repeats() {
        let s = seq(&[1, 2, 3, 4]);
        let report = analyze(s.as_slice(), &PatternConfig::default()).unwrap();
        assert!(report.patterns.is_empty());
        assert_eq!(report.total_symbols, 4);
    }

    #[test]
    fn test_short_sequence_has_no_patterns() {
        assert!(repeated_patterns(seq(&[1]).as_slice(), 2, 4).is_empty());
        assert!(repeated_patterns(&[], 2, 4).is_empty());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let cfg = PatternConfig {
            min_len: 4,
            max_len: 2,
            top: 5,
        };
        assert!(analyze(&[], &cfg).is_err());
    }
}
