//! The 4-symbol alphabet and immutable sequence snapshots.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AnalysisError, Result};

/// Number of distinct symbols. Every probability vector has this length.
pub const ALPHABET_SIZE: usize = 4;

/// One observed choice, 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Symbol(u8);

impl Symbol {
    pub const HEARTS: Symbol = Symbol(1);
    pub const DIAMONDS: Symbol = Symbol(2);
    pub const CLUBS: Symbol = Symbol(3);
    pub const SPADES: Symbol = Symbol(4);

    /// All symbols in index order.
    pub const ALL: [Symbol; ALPHABET_SIZE] =
        [Self::HEARTS, Self::DIAMONDS, Self::CLUBS, Self::SPADES];

    pub fn new(value: i64) -> Result<Self> {
        if (1..=ALPHABET_SIZE as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AnalysisError::InvalidSymbol(value))
        }
    }

    /// Symbol at zero-based `index`, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parse a single character: a digit 1-4, a suit glyph, or a suit letter.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1' | '♥' | '♡' | 'H' | 'h' => Some(Self::HEARTS),
            '2' | '♦' | '♢' | 'D' | 'd' => Some(Self::DIAMONDS),
            '3' | '♣' | '♧' | 'C' | 'c' => Some(Self::CLUBS),
            '4' | '♠' | '♤' | 'S' | 's' => Some(Self::SPADES),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Zero-based position in [`Symbol::ALL`].
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            1 => "hearts",
            2 => "diamonds",
            3 => "clubs",
            _ => "spades",
        }
    }

    pub fn glyph(self) -> char {
        match self.0 {
            1 => '♥',
            2 => '♦',
            3 => '♣',
            _ => '♠',
        }
    }
}

impl TryFrom<i64> for Symbol {
    type Error = AnalysisError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Symbol> for u8 {
    fn from(symbol: Symbol) -> u8 {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-symbol occurrence counts.
pub fn symbol_counts(symbols: &[Symbol]) -> [u32; ALPHABET_SIZE] {
    let mut counts = [0u32; ALPHABET_SIZE];
    for s in symbols {
        counts[s.index()] += 1;
    }
    counts
}

/// Immutable, chronologically ordered snapshot of one subject's symbols.
///
/// Cloning is cheap (shared buffer), so the engine hands the same snapshot
/// to every analysis thread without copying.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence {
    symbols: Arc<[Symbol]>,
}

impl Sequence {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols: symbols.into(),
        }
    }

    /// Build from raw integers, rejecting anything outside 1..=4.
    pub fn from_values<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        values
            .into_iter()
            .map(Symbol::new)
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    /// Parse free text such as `"1 2 3,4"`, `"1234"`, `"♥♦♣♠"` or `"HDCS"`.
    ///
    /// Whitespace and commas separate tokens; every other character must
    /// name a symbol on its own.
    pub fn parse(text: &str) -> Result<Self> {
        let mut symbols = Vec::new();
        for token in text
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|t| !t.is_empty())
        {
            for c in token.chars() {
                match Symbol::from_char(c) {
                    Some(s) => symbols.push(s),
                    None => match c.to_digit(10) {
                        Some(d) => return Err(AnalysisError::InvalidSymbol(i64::from(d))),
                        None => return Err(AnalysisError::UnrecognizedToken(token.to_string())),
                    },
                }
            }
        }
        Ok(Self::new(symbols))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied()
    }

    /// The most recent `n` symbols, oldest first.
    pub fn recent(&self, n: usize) -> &[Symbol] {
        recent(&self.symbols, n)
    }

    pub fn counts(&self) -> [u32; ALPHABET_SIZE] {
        symbol_counts(&self.symbols)
    }
}

/// The last `n` elements of `symbols` (all of them if shorter).
pub(crate) fn recent(symbols: &[Symbol], n: usize) -> &[Symbol] {
    &symbols[symbols.len().saturating_sub(n)..]
}

impl From<Vec<Symbol>> for Sequence {
    fn from(symbols: Vec<Symbol>) -> Self {
        Self::new(symbols)
    }
}

impl AsRef<[Symbol]> for Sequence {
    fn as_ref(&self) -> &[Symbol] {
        &self.symbols
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Sequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<Symbol>::deserialize(deserializer).map(Self::new)
    }
}
