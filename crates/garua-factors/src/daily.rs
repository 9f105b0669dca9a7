//! Daily tick aggregation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use garua_types::{DailyFactors, FactorKey, FactorUpdate, PriceTick, Symbol};

use crate::{FactorError, normalized_factor};

/// The result of aggregating one day's ticks.
///
/// Symbols whose minimum price was zero still produce a record (with the
/// daily factor unset); the corresponding failure is reported here so the
/// caller can log it without aborting the other symbols.
#[derive(Debug)]
pub struct DailyComputation {
    /// The day the ticks were aggregated for.
    pub date: NaiveDate,
    /// One record per symbol present in the tick set.
    pub records: BTreeMap<Symbol, DailyFactors>,
    /// Recoverable per-symbol failures (zero minimum price).
    pub failures: Vec<FactorError>,
}

impl DailyComputation {
    /// Returns the reconciler batch for this computation: the min/max and
    /// oldest/newest field groups for every aggregated symbol.
    #[must_use]
    pub fn updates(&self) -> Vec<(FactorKey, Vec<FactorUpdate>)> {
        self.records
            .values()
            .map(|record| {
                let mut updates = Vec::with_capacity(2);
                if let (Some(min_price), Some(min_price_at), Some(max_price), Some(max_price_at)) = (
                    record.min_price,
                    record.min_price_at,
                    record.max_price,
                    record.max_price_at,
                ) {
                    updates.push(FactorUpdate::MinMax {
                        min_price,
                        min_price_at,
                        max_price,
                        max_price_at,
                        daily_factor: record.daily_factor,
                    });
                }
                if let (
                    Some(oldest_price),
                    Some(oldest_price_at),
                    Some(newest_price),
                    Some(newest_price_at),
                ) = (
                    record.oldest_price,
                    record.oldest_price_at,
                    record.newest_price,
                    record.newest_price_at,
                ) {
                    updates.push(FactorUpdate::OldestNewest {
                        oldest_price,
                        oldest_price_at,
                        newest_price,
                        newest_price_at,
                    });
                }
                (record.key(), updates)
            })
            .collect()
    }

    /// Returns true if no symbol produced a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Computes per-symbol daily factors from one day's ticks.
///
/// The tick set is expected to be pre-filtered to the given calendar day;
/// grouping by symbol happens here. For each symbol the day's price extremes
/// are taken with the earliest timestamp achieving each extreme, the oldest
/// and newest prices are the first and last observations of the day, and the
/// daily normalized factor is `(max - min) / min`. Symbols without ticks
/// produce no record.
#[must_use]
pub fn compute_daily_factors(date: NaiveDate, ticks: &[PriceTick]) -> DailyComputation {
    let mut by_symbol: BTreeMap<&Symbol, Vec<&PriceTick>> = BTreeMap::new();
    for tick in ticks {
        by_symbol.entry(&tick.symbol).or_default().push(tick);
    }

    let mut records = BTreeMap::new();
    let mut failures = Vec::new();

    for (symbol, mut symbol_ticks) in by_symbol {
        symbol_ticks.sort_by_key(|t| t.timestamp);

        let mut builder = DailyBuilder::new(symbol_ticks[0]);
        for tick in &symbol_ticks[1..] {
            builder.update(tick);
        }

        let record = builder.finish(symbol.clone(), date);
        if record.daily_factor.is_none() {
            failures.push(FactorError::DivisionByZero {
                symbol: symbol.clone(),
                date,
            });
        }
        records.insert(symbol.clone(), record);
    }

    DailyComputation {
        date,
        records,
        failures,
    }
}

/// Accumulator for one symbol's daily extremes.
///
/// Ticks must arrive in ascending timestamp order; strict comparisons then
/// keep the earliest timestamp at each extreme.
#[derive(Debug)]
struct DailyBuilder {
    min_price: Decimal,
    min_price_at: DateTime<Utc>,
    max_price: Decimal,
    max_price_at: DateTime<Utc>,
    oldest_price: Decimal,
    oldest_price_at: DateTime<Utc>,
    newest_price: Decimal,
    newest_price_at: DateTime<Utc>,
}

impl DailyBuilder {
    /// Creates a builder from the first (earliest) tick.
    const fn new(tick: &PriceTick) -> Self {
        Self {
            min_price: tick.price,
            min_price_at: tick.timestamp,
            max_price: tick.price,
            max_price_at: tick.timestamp,
            oldest_price: tick.price,
            oldest_price_at: tick.timestamp,
            newest_price: tick.price,
            newest_price_at: tick.timestamp,
        }
    }

    /// Folds a later tick into the accumulator.
    fn update(&mut self, tick: &PriceTick) {
        if tick.price < self.min_price {
            self.min_price = tick.price;
            self.min_price_at = tick.timestamp;
        }
        if tick.price > self.max_price {
            self.max_price = tick.price;
            self.max_price_at = tick.timestamp;
        }
        self.newest_price = tick.price;
        self.newest_price_at = tick.timestamp;
    }

    /// Finishes accumulation and produces the day's record.
    fn finish(self, symbol: Symbol, date: NaiveDate) -> DailyFactors {
        let mut record = DailyFactors::empty(symbol, date);
        record.min_price = Some(self.min_price);
        record.min_price_at = Some(self.min_price_at);
        record.max_price = Some(self.max_price);
        record.max_price_at = Some(self.max_price_at);
        record.oldest_price = Some(self.oldest_price);
        record.oldest_price_at = Some(self.oldest_price_at);
        record.newest_price = Some(self.newest_price);
        record.newest_price_at = Some(self.newest_price_at);
        record.daily_factor = normalized_factor(self.min_price, self.max_price);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn symbol(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, hour, 0, 0).unwrap()
    }

    fn tick(hour: u32, s: &str, price: Decimal) -> PriceTick {
        PriceTick::new(at(hour), symbol(s), price)
    }

    #[test]
    fn test_eth_single_day_scenario() {
        let ticks = vec![
            tick(8, "ETH", dec!(3000)),
            tick(10, "ETH", dec!(3100)),
            tick(15, "ETH", dec!(2950)),
            tick(17, "ETH", dec!(3050)),
        ];

        let computation = compute_daily_factors(date(), &ticks);
        assert!(computation.failures.is_empty());

        let record = &computation.records[&symbol("ETH")];
        assert_eq!(record.min_price, Some(dec!(2950)));
        assert_eq!(record.min_price_at, Some(at(15)));
        assert_eq!(record.max_price, Some(dec!(3100)));
        assert_eq!(record.max_price_at, Some(at(10)));
        assert_eq!(record.oldest_price, Some(dec!(3000)));
        assert_eq!(record.oldest_price_at, Some(at(8)));
        assert_eq!(record.newest_price, Some(dec!(3050)));
        assert_eq!(record.newest_price_at, Some(at(17)));
        // (3100 - 2950) / 2950, rounded to five places.
        assert_eq!(record.daily_factor, Some(dec!(0.05085)));
    }

    #[test]
    fn test_extreme_ties_resolve_to_earliest_timestamp() {
        let ticks = vec![
            tick(9, "BTC", dec!(100)),
            tick(11, "BTC", dec!(90)),
            tick(13, "BTC", dec!(90)),
            tick(15, "BTC", dec!(110)),
            tick(17, "BTC", dec!(110)),
        ];

        let computation = compute_daily_factors(date(), &ticks);
        let record = &computation.records[&symbol("BTC")];
        assert_eq!(record.min_price_at, Some(at(11)));
        assert_eq!(record.max_price_at, Some(at(15)));
    }

    #[test]
    fn test_unsorted_ticks_are_ordered_before_aggregation() {
        let ticks = vec![
            tick(17, "BTC", dec!(105)),
            tick(8, "BTC", dec!(100)),
            tick(12, "BTC", dec!(95)),
        ];

        let computation = compute_daily_factors(date(), &ticks);
        let record = &computation.records[&symbol("BTC")];
        assert_eq!(record.oldest_price, Some(dec!(100)));
        assert_eq!(record.newest_price, Some(dec!(105)));
    }

    #[test]
    fn test_zero_min_price_reports_failure_without_aborting_others() {
        let ticks = vec![
            tick(8, "LUNA", dec!(0)),
            tick(12, "LUNA", dec!(1)),
            tick(8, "BTC", dec!(100)),
            tick(12, "BTC", dec!(110)),
        ];

        let computation = compute_daily_factors(date(), &ticks);

        let luna = &computation.records[&symbol("LUNA")];
        assert_eq!(luna.daily_factor, None);
        assert_eq!(luna.min_price, Some(dec!(0)));

        let btc = &computation.records[&symbol("BTC")];
        assert_eq!(btc.daily_factor, Some(dec!(0.1)));

        assert_eq!(computation.failures.len(), 1);
        assert!(matches!(
            computation.failures[0],
            FactorError::DivisionByZero { ref symbol, .. } if symbol.as_str() == "LUNA"
        ));
    }

    #[test]
    fn test_empty_tick_set_produces_no_records() {
        let computation = compute_daily_factors(date(), &[]);
        assert!(computation.is_empty());
        assert!(computation.failures.is_empty());
    }

    #[test]
    fn test_updates_carry_both_field_groups_per_symbol() {
        let ticks = vec![tick(8, "ETH", dec!(3000)), tick(10, "ETH", dec!(3100))];
        let computation = compute_daily_factors(date(), &ticks);

        let updates = computation.updates();
        assert_eq!(updates.len(), 1);
        let (key, groups) = &updates[0];
        assert_eq!(key.symbol.as_str(), "ETH");
        assert_eq!(key.date, date());
        assert_eq!(groups.len(), 2);
        assert!(matches!(groups[0], FactorUpdate::MinMax { .. }));
        assert!(matches!(groups[1], FactorUpdate::OldestNewest { .. }));
    }
}
