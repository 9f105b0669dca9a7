//! Validated cryptocurrency symbol.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A validated cryptocurrency ticker symbol.
///
/// Symbols are uppercase ASCII, start with a letter, may contain digits,
/// and are between 2 and 12 characters long (e.g. `BTC`, `DOGE`, `ETHUSD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Minimum symbol length.
    pub const MIN_LEN: usize = 2;

    /// Maximum symbol length.
    pub const MAX_LEN: usize = 12;

    /// Creates a symbol, validating the ticker format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid ticker symbol.
    pub fn new(s: &str) -> Result<Self, SymbolParseError> {
        if s.len() < Self::MIN_LEN || s.len() > Self::MAX_LEN {
            return Err(SymbolParseError::Length(s.to_string()));
        }
        if !s.starts_with(|c: char| c.is_ascii_uppercase()) {
            return Err(SymbolParseError::Charset(s.to_string()));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(SymbolParseError::Charset(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Error returned when parsing an invalid symbol string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolParseError {
    /// Symbol length is out of range.
    #[error("invalid symbol '{0}': expected {min}-{max} characters", min = Symbol::MIN_LEN, max = Symbol::MAX_LEN)]
    Length(String),

    /// Symbol contains characters outside `[A-Z0-9]` or starts with a digit.
    #[error("invalid symbol '{0}': expected uppercase ticker starting with a letter")]
    Charset(String),
}
