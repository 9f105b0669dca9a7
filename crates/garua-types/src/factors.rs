//! Daily factor records and field-group update commands.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FactorPeriod, Symbol};

/// Number of fractional digits kept when storing computed factors.
pub const FACTOR_SCALE: u32 = 5;

/// Unique key of a daily factor record: one row per symbol per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactorKey {
    /// The cryptocurrency symbol.
    pub symbol: Symbol,
    /// The calendar day the record describes (UTC).
    pub date: NaiveDate,
}

impl FactorKey {
    /// Creates a new factor key.
    #[must_use]
    pub const fn new(symbol: Symbol, date: NaiveDate) -> Self {
        Self { symbol, date }
    }
}

impl std::fmt::Display for FactorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.date)
    }
}

/// Per-symbol, per-day derived price factors.
///
/// Fields are populated incrementally by separate processing passes, so any
/// subset may be present at a given time; a record holding only a rolling
/// factor is a valid state, not corruption. The rolling factors describe the
/// trailing window *ending* on this record's date, not the day's own range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFactors {
    /// The cryptocurrency symbol.
    pub symbol: Symbol,
    /// The calendar day the record describes (UTC).
    pub date: NaiveDate,
    /// Lowest price observed during the day.
    pub min_price: Option<Decimal>,
    /// Timestamp of the earliest tick at the lowest price.
    pub min_price_at: Option<DateTime<Utc>>,
    /// Highest price observed during the day.
    pub max_price: Option<Decimal>,
    /// Timestamp of the earliest tick at the highest price.
    pub max_price_at: Option<DateTime<Utc>>,
    /// Price of the earliest tick of the day.
    pub oldest_price: Option<Decimal>,
    /// Timestamp of the earliest tick of the day.
    pub oldest_price_at: Option<DateTime<Utc>>,
    /// Price of the latest tick of the day.
    pub newest_price: Option<Decimal>,
    /// Timestamp of the latest tick of the day.
    pub newest_price_at: Option<DateTime<Utc>>,
    /// Normalized factor `(max - min) / min` for the day.
    pub daily_factor: Option<Decimal>,
    /// Normalized factor over the trailing week ending on this date.
    pub weekly_factor: Option<Decimal>,
    /// Normalized factor over the trailing month ending on this date.
    pub monthly_factor: Option<Decimal>,
}

impl DailyFactors {
    /// Creates an empty record for the given key.
    #[must_use]
    pub const fn empty(symbol: Symbol, date: NaiveDate) -> Self {
        Self {
            symbol,
            date,
            min_price: None,
            min_price_at: None,
            max_price: None,
            max_price_at: None,
            oldest_price: None,
            oldest_price_at: None,
            newest_price: None,
            newest_price_at: None,
            daily_factor: None,
            weekly_factor: None,
            monthly_factor: None,
        }
    }

    /// Returns the record's key.
    #[must_use]
    pub fn key(&self) -> FactorKey {
        FactorKey::new(self.symbol.clone(), self.date)
    }

    /// Applies a field-group update, overwriting only the fields the update
    /// carries and leaving every other field untouched.
    pub fn apply(&mut self, update: &FactorUpdate) {
        match update {
            FactorUpdate::MinMax {
                min_price,
                min_price_at,
                max_price,
                max_price_at,
                daily_factor,
            } => {
                self.min_price = Some(*min_price);
                self.min_price_at = Some(*min_price_at);
                self.max_price = Some(*max_price);
                self.max_price_at = Some(*max_price_at);
                self.daily_factor = *daily_factor;
            }
            FactorUpdate::OldestNewest {
                oldest_price,
                oldest_price_at,
                newest_price,
                newest_price_at,
            } => {
                self.oldest_price = Some(*oldest_price);
                self.oldest_price_at = Some(*oldest_price_at);
                self.newest_price = Some(*newest_price);
                self.newest_price_at = Some(*newest_price_at);
            }
            FactorUpdate::RollingFactor { period, factor } => match period {
                FactorPeriod::Week => self.weekly_factor = Some(*factor),
                FactorPeriod::Month => self.monthly_factor = Some(*factor),
                FactorPeriod::Day => self.daily_factor = Some(*factor),
            },
        }
    }

    /// Returns the normalized factor for the given period, if populated.
    #[must_use]
    pub const fn factor_for(&self, period: FactorPeriod) -> Option<Decimal> {
        match period {
            FactorPeriod::Day => self.daily_factor,
            FactorPeriod::Week => self.weekly_factor,
            FactorPeriod::Month => self.monthly_factor,
        }
    }

    /// Returns true if both daily price extremes are populated.
    #[must_use]
    pub const fn has_price_range(&self) -> bool {
        self.min_price.is_some() && self.max_price.is_some()
    }
}

/// A field-group update command for a daily factor record.
///
/// Each variant carries exactly the fields one computation writes; the
/// reconciler applies them without touching unrelated fields, so passes that
/// populate different groups never race each other's results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorUpdate {
    /// Daily price extremes and the daily normalized factor.
    MinMax {
        /// Lowest price of the day.
        min_price: Decimal,
        /// Timestamp of the earliest tick at the lowest price.
        min_price_at: DateTime<Utc>,
        /// Highest price of the day.
        max_price: Decimal,
        /// Timestamp of the earliest tick at the highest price.
        max_price_at: DateTime<Utc>,
        /// Daily normalized factor; unset when the day's minimum was zero.
        daily_factor: Option<Decimal>,
    },
    /// First and last observed prices of the day.
    OldestNewest {
        /// Price of the earliest tick of the day.
        oldest_price: Decimal,
        /// Timestamp of the earliest tick of the day.
        oldest_price_at: DateTime<Utc>,
        /// Price of the latest tick of the day.
        newest_price: Decimal,
        /// Timestamp of the latest tick of the day.
        newest_price_at: DateTime<Utc>,
    },
    /// One rolling normalized factor.
    RollingFactor {
        /// The trailing window the factor describes.
        period: FactorPeriod,
        /// The computed factor value.
        factor: Decimal,
    },
}

/// Price factors served to query callers, independent of period.
///
/// For the day period this is a projection of the stored record; for week and
/// month periods the price fields are aggregated across the trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFactors {
    /// The cryptocurrency symbol.
    pub symbol: Symbol,
    /// The reference date of the query.
    pub date: NaiveDate,
    /// The period the factors describe.
    pub period: FactorPeriod,
    /// Lowest price over the period.
    pub min_price: Option<Decimal>,
    /// Timestamp of the lowest price.
    pub min_price_at: Option<DateTime<Utc>>,
    /// Highest price over the period.
    pub max_price: Option<Decimal>,
    /// Timestamp of the highest price.
    pub max_price_at: Option<DateTime<Utc>>,
    /// First observed price of the period.
    pub oldest_price: Option<Decimal>,
    /// Timestamp of the first observed price.
    pub oldest_price_at: Option<DateTime<Utc>>,
    /// Last observed price of the period.
    pub newest_price: Option<Decimal>,
    /// Timestamp of the last observed price.
    pub newest_price_at: Option<DateTime<Utc>>,
    /// The period's normalized factor, when computed.
    pub factor: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn key() -> (Symbol, NaiveDate) {
        (
            Symbol::new("BTC").unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 5).unwrap(),
        )
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 5, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_apply_min_max_leaves_other_groups_untouched() {
        let (symbol, date) = key();
        let mut record = DailyFactors::empty(symbol, date);
        record.weekly_factor = Some(dec!(0.12345));
        record.oldest_price = Some(dec!(100));
        record.oldest_price_at = Some(at(1));

        record.apply(&FactorUpdate::MinMax {
            min_price: dec!(90),
            min_price_at: at(3),
            max_price: dec!(110),
            max_price_at: at(7),
            daily_factor: Some(dec!(0.22222)),
        });

        assert_eq!(record.min_price, Some(dec!(90)));
        assert_eq!(record.max_price, Some(dec!(110)));
        assert_eq!(record.daily_factor, Some(dec!(0.22222)));
        // Unrelated field groups survive.
        assert_eq!(record.weekly_factor, Some(dec!(0.12345)));
        assert_eq!(record.oldest_price, Some(dec!(100)));
    }

    #[test]
    fn test_apply_rolling_factor() {
        let (symbol, date) = key();
        let mut record = DailyFactors::empty(symbol, date);

        record.apply(&FactorUpdate::RollingFactor {
            period: FactorPeriod::Week,
            factor: dec!(0.26316),
        });
        record.apply(&FactorUpdate::RollingFactor {
            period: FactorPeriod::Month,
            factor: dec!(0.31000),
        });

        assert_eq!(record.weekly_factor, Some(dec!(0.26316)));
        assert_eq!(record.monthly_factor, Some(dec!(0.31000)));
        assert_eq!(record.daily_factor, None);
    }

    #[test]
    fn test_factor_for_period() {
        let (symbol, date) = key();
        let mut record = DailyFactors::empty(symbol, date);
        record.daily_factor = Some(dec!(0.05));
        record.weekly_factor = Some(dec!(0.10));

        assert_eq!(record.factor_for(FactorPeriod::Day), Some(dec!(0.05)));
        assert_eq!(record.factor_for(FactorPeriod::Week), Some(dec!(0.10)));
        assert_eq!(record.factor_for(FactorPeriod::Month), None);
    }

    #[test]
    fn test_partial_record_roundtrips() {
        let (symbol, date) = key();
        let mut record = DailyFactors::empty(symbol, date);
        record.monthly_factor = Some(dec!(0.00001));

        let json = serde_json::to_string(&record).unwrap();
        let back: DailyFactors = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert!(!back.has_price_range());
    }
}
