//! Price tick representation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Symbol;

/// A single timestamped price observation for a symbol.
///
/// Ticks are produced once by ingestion and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Timestamp of the observation (UTC).
    pub timestamp: DateTime<Utc>,
    /// The cryptocurrency symbol.
    pub symbol: Symbol,
    /// Observed price.
    pub price: Decimal,
}

impl PriceTick {
    /// Creates a new price tick.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, symbol: Symbol, price: Decimal) -> Self {
        Self {
            timestamp,
            symbol,
            price,
        }
    }

    /// Returns the UTC calendar day this tick falls on.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tick_date_is_utc_day() {
        let timestamp = Utc.with_ymd_and_hms(2022, 1, 1, 23, 59, 59).unwrap();
        let tick = PriceTick::new(timestamp, Symbol::new("BTC").unwrap(), dec!(46813.21));

        assert_eq!(tick.date(), NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    }

    #[test]
    fn test_tick_serde_roundtrip() {
        let timestamp = Utc.with_ymd_and_hms(2022, 1, 1, 8, 0, 0).unwrap();
        let tick = PriceTick::new(timestamp, Symbol::new("ETH").unwrap(), dec!(3000.00000));

        let json = serde_json::to_string(&tick).unwrap();
        let back: PriceTick = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tick);
    }
}
