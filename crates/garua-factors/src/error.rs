//! Error types for factor computation.

use chrono::NaiveDate;
use garua_store::StoreError;
use garua_types::Symbol;
use thiserror::Error;

/// Result type alias for factor operations.
pub type Result<T> = std::result::Result<T, FactorError>;

/// Errors that can occur while computing or reconciling factors.
///
/// `DivisionByZero` and `EmptyWindow` are recoverable per symbol: the
/// affected factor is left unset and other symbols proceed. Store errors
/// abort the current date's pass.
#[derive(Error, Debug)]
pub enum FactorError {
    /// A normalized factor could not be computed because the minimum price
    /// over the period was zero.
    #[error("division by zero computing normalized factor for {symbol} on {date}")]
    DivisionByZero {
        /// The affected symbol.
        symbol: Symbol,
        /// The reference date of the computation.
        date: NaiveDate,
    },

    /// A rolling window held no factor rows to aggregate.
    #[error("no factor rows for {symbol} in window {start} to {end}")]
    EmptyWindow {
        /// The affected symbol.
        symbol: Symbol,
        /// The first day of the window (inclusive).
        start: NaiveDate,
        /// The last day of the window (inclusive).
        end: NaiveDate,
    },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
