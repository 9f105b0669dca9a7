//! Rolling window factor aggregation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use garua_store::FactorStore;
use garua_types::{
    DailyFactors, DateRange, FactorKey, FactorPeriod, FactorUpdate, PriceFactors, Symbol,
};

use crate::{FactorError, Result, normalized_factor};

/// The result of computing one period's rolling factors for a date.
#[derive(Debug)]
pub struct WindowComputation {
    /// The reference date the factors are attached to.
    pub date: NaiveDate,
    /// The period that was computed.
    pub period: FactorPeriod,
    /// Rolling factor updates keyed by `(symbol, date)`.
    pub updates: Vec<(FactorKey, Vec<FactorUpdate>)>,
    /// Recoverable per-symbol failures; no factor is written for these.
    pub skipped: Vec<FactorError>,
}

/// Computes rolling week/month-to-date normalized factors from stored daily
/// records.
///
/// The window factor sums each day's stored extremes across the trailing
/// window and normalizes the sums: `(Σ max - Σ min) / Σ min`. Sum-of-extremes
/// is the contract for stored rolling factors; it is deliberately not a true
/// min/max across the window's raw ticks.
#[derive(Debug)]
pub struct WindowAggregator<S> {
    store: Arc<S>,
}

impl<S> WindowAggregator<S> {
    /// Creates a window aggregator reading from the given store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: FactorStore> WindowAggregator<S> {
    /// Computes the normalized factor for the period's trailing window ending
    /// on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`FactorError::EmptyWindow`] when no daily record in the
    /// window has its price extremes populated, and
    /// [`FactorError::DivisionByZero`] when the window's minimum prices sum
    /// to zero. Callers skip writing a factor in both cases.
    pub async fn window_factor(
        &self,
        symbol: &Symbol,
        date: NaiveDate,
        period: FactorPeriod,
    ) -> Result<Decimal> {
        self.factor_for_window(symbol, date, period.days_back()).await
    }

    /// Computes the normalized factor over the inclusive trailing window
    /// `[date + days_back + 1, date]`.
    ///
    /// # Errors
    ///
    /// As [`window_factor`](Self::window_factor).
    pub async fn factor_for_window(
        &self,
        symbol: &Symbol,
        date: NaiveDate,
        days_back: i64,
    ) -> Result<Decimal> {
        let Some(range) = DateRange::trailing(date, days_back) else {
            return Err(FactorError::EmptyWindow {
                symbol: symbol.clone(),
                start: date,
                end: date,
            });
        };

        let rows = self.store.by_date_range(symbol, &range).await?;
        let ranged: Vec<&DailyFactors> = rows.iter().filter(|r| r.has_price_range()).collect();
        if ranged.is_empty() {
            return Err(FactorError::EmptyWindow {
                symbol: symbol.clone(),
                start: range.start,
                end: range.end,
            });
        }

        let min_sum: Decimal = ranged.iter().filter_map(|r| r.min_price).sum();
        let max_sum: Decimal = ranged.iter().filter_map(|r| r.max_price).sum();

        normalized_factor(min_sum, max_sum).ok_or_else(|| FactorError::DivisionByZero {
            symbol: symbol.clone(),
            date,
        })
    }

    /// Computes the period's rolling factor for every symbol with daily
    /// records in the window ending on `date`.
    ///
    /// Symbols whose window sums to a zero minimum are skipped (reported in
    /// the computation, never written as zero). A day period produces no
    /// updates: there is no trailing window to aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn compute_for_date(
        &self,
        date: NaiveDate,
        period: FactorPeriod,
    ) -> Result<WindowComputation> {
        let mut computation = WindowComputation {
            date,
            period,
            updates: Vec::new(),
            skipped: Vec::new(),
        };
        let Some(range) = period.window(date) else {
            return Ok(computation);
        };

        // One pass over the window's rows, accumulating per-symbol sums.
        let mut sums: BTreeMap<Symbol, (Decimal, Decimal)> = BTreeMap::new();
        for day in range.days() {
            for row in self.store.by_date(day).await? {
                let (Some(min), Some(max)) = (row.min_price, row.max_price) else {
                    continue;
                };
                let entry = sums
                    .entry(row.symbol)
                    .or_insert((Decimal::ZERO, Decimal::ZERO));
                entry.0 += min;
                entry.1 += max;
            }
        }

        for (symbol, (min_sum, max_sum)) in sums {
            match normalized_factor(min_sum, max_sum) {
                Some(factor) => {
                    let key = FactorKey::new(symbol, date);
                    let update = FactorUpdate::RollingFactor { period, factor };
                    computation.updates.push((key, vec![update]));
                }
                None => computation.skipped.push(FactorError::DivisionByZero {
                    symbol,
                    date,
                }),
            }
        }
        Ok(computation)
    }

    /// Aggregates the window's stored records into the price-factor view
    /// served for week/month factor queries.
    ///
    /// Returns `Ok(None)` when the period has no window (day) or no record in
    /// the window has price extremes populated.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn window_snapshot(
        &self,
        symbol: &Symbol,
        date: NaiveDate,
        period: FactorPeriod,
    ) -> Result<Option<PriceFactors>> {
        let Some(range) = period.window(date) else {
            return Ok(None);
        };

        let rows = self.store.by_date_range(symbol, &range).await?;
        let ranged: Vec<&DailyFactors> = rows.iter().filter(|r| r.has_price_range()).collect();
        if ranged.is_empty() {
            return Ok(None);
        }

        let min_price = ranged.iter().filter_map(|r| r.min_price).min();
        let max_price = ranged.iter().filter_map(|r| r.max_price).max();
        // Earliest timestamp among the days that touched the window minimum,
        // latest among the days that touched the maximum.
        let min_price_at = ranged
            .iter()
            .filter(|r| r.min_price == min_price)
            .filter_map(|r| r.min_price_at)
            .min();
        let max_price_at = ranged
            .iter()
            .filter(|r| r.max_price == max_price)
            .filter_map(|r| r.max_price_at)
            .max();

        // Rows arrive in ascending date order; the window's open comes from
        // the earliest day carrying it, the close from the latest.
        let oldest = ranged
            .iter()
            .find(|r| r.oldest_price.is_some() && r.oldest_price_at.is_some());
        let newest = ranged
            .iter()
            .rev()
            .find(|r| r.newest_price.is_some() && r.newest_price_at.is_some());

        let factor = self
            .store
            .get(&FactorKey::new(symbol.clone(), date))
            .await?
            .and_then(|r| r.factor_for(period));

        Ok(Some(PriceFactors {
            symbol: symbol.clone(),
            date,
            period,
            min_price,
            min_price_at,
            max_price,
            max_price_at,
            oldest_price: oldest.and_then(|r| r.oldest_price),
            oldest_price_at: oldest.and_then(|r| r.oldest_price_at),
            newest_price: newest.and_then(|r| r.newest_price),
            newest_price_at: newest.and_then(|r| r.newest_price_at),
            factor,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use garua_store::MemoryFactorStore;
    use rust_decimal_macros::dec;

    fn symbol(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, d, hour, 0, 0).unwrap()
    }

    async fn seed_day(
        store: &MemoryFactorStore,
        s: &str,
        d: u32,
        min: Decimal,
        max: Decimal,
    ) {
        let key = FactorKey::new(symbol(s), day(d));
        let updates = vec![
            FactorUpdate::MinMax {
                min_price: min,
                min_price_at: at(d, 4),
                max_price: max,
                max_price_at: at(d, 14),
                daily_factor: normalized_factor(min, max),
            },
            FactorUpdate::OldestNewest {
                oldest_price: min,
                oldest_price_at: at(d, 0),
                newest_price: max,
                newest_price_at: at(d, 23),
            },
        ];
        store.upsert(&key, &updates).await.unwrap();
    }

    #[tokio::test]
    async fn test_sum_of_extremes_formula() {
        let store = Arc::new(MemoryFactorStore::new());
        seed_day(&store, "BTC", 4, dec!(100), dec!(110)).await;
        seed_day(&store, "BTC", 5, dec!(90), dec!(130)).await;

        let aggregator = WindowAggregator::new(Arc::clone(&store));
        // A window covering both days: sum(min)=190, sum(max)=240.
        let factor = aggregator
            .factor_for_window(&symbol("BTC"), day(5), -2)
            .await
            .unwrap();
        assert_eq!(factor, dec!(0.26316));
    }

    #[tokio::test]
    async fn test_one_day_back_covers_reference_day_only() {
        let store = Arc::new(MemoryFactorStore::new());
        seed_day(&store, "BTC", 4, dec!(100), dec!(110)).await;
        seed_day(&store, "BTC", 5, dec!(90), dec!(130)).await;

        let aggregator = WindowAggregator::new(Arc::clone(&store));
        let factor = aggregator
            .factor_for_window(&symbol("BTC"), day(5), -1)
            .await
            .unwrap();
        // Only day 5 contributes: (130 - 90) / 90.
        assert_eq!(factor, dec!(0.44444));
    }

    #[tokio::test]
    async fn test_week_window_excludes_day_outside() {
        let store = Arc::new(MemoryFactorStore::new());
        // Day 3 is outside the window [4, 10].
        seed_day(&store, "BTC", 3, dec!(1000), dec!(2000)).await;
        seed_day(&store, "BTC", 4, dec!(100), dec!(110)).await;
        seed_day(&store, "BTC", 10, dec!(90), dec!(130)).await;

        let aggregator = WindowAggregator::new(Arc::clone(&store));
        let factor = aggregator
            .window_factor(&symbol("BTC"), day(10), FactorPeriod::Week)
            .await
            .unwrap();
        assert_eq!(factor, dec!(0.26316));
    }

    #[tokio::test]
    async fn test_empty_window() {
        let store = Arc::new(MemoryFactorStore::new());
        let aggregator = WindowAggregator::new(Arc::clone(&store));

        let result = aggregator
            .window_factor(&symbol("BTC"), day(10), FactorPeriod::Week)
            .await;
        assert!(matches!(result, Err(FactorError::EmptyWindow { .. })));
    }

    #[tokio::test]
    async fn test_rows_without_price_range_do_not_count() {
        let store = Arc::new(MemoryFactorStore::new());
        // A record holding only a rolling factor must not satisfy the window.
        let key = FactorKey::new(symbol("BTC"), day(8));
        store
            .upsert(
                &key,
                &[FactorUpdate::RollingFactor {
                    period: FactorPeriod::Week,
                    factor: dec!(0.5),
                }],
            )
            .await
            .unwrap();

        let aggregator = WindowAggregator::new(Arc::clone(&store));
        let result = aggregator
            .window_factor(&symbol("BTC"), day(10), FactorPeriod::Week)
            .await;
        assert!(matches!(result, Err(FactorError::EmptyWindow { .. })));
    }

    #[tokio::test]
    async fn test_zero_minimum_sum_is_division_by_zero() {
        let store = Arc::new(MemoryFactorStore::new());
        seed_day(&store, "LUNA", 5, dec!(0), dec!(10)).await;

        let aggregator = WindowAggregator::new(Arc::clone(&store));
        let result = aggregator
            .window_factor(&symbol("LUNA"), day(5), FactorPeriod::Week)
            .await;
        assert!(matches!(result, Err(FactorError::DivisionByZero { .. })));
    }

    #[tokio::test]
    async fn test_compute_for_date_covers_all_symbols() {
        let store = Arc::new(MemoryFactorStore::new());
        seed_day(&store, "BTC", 4, dec!(100), dec!(110)).await;
        seed_day(&store, "BTC", 5, dec!(90), dec!(130)).await;
        seed_day(&store, "ETH", 5, dec!(2950), dec!(3100)).await;
        seed_day(&store, "LUNA", 5, dec!(0), dec!(10)).await;

        let aggregator = WindowAggregator::new(Arc::clone(&store));
        let computation = aggregator
            .compute_for_date(day(5), FactorPeriod::Week)
            .await
            .unwrap();

        assert_eq!(computation.updates.len(), 2);
        let (btc_key, btc_updates) = &computation.updates[0];
        assert_eq!(btc_key.symbol.as_str(), "BTC");
        assert_eq!(btc_key.date, day(5));
        assert_eq!(
            btc_updates[0],
            FactorUpdate::RollingFactor {
                period: FactorPeriod::Week,
                factor: dec!(0.26316),
            }
        );

        assert_eq!(computation.skipped.len(), 1);
        assert!(matches!(
            computation.skipped[0],
            FactorError::DivisionByZero { ref symbol, .. } if symbol.as_str() == "LUNA"
        ));
    }

    #[tokio::test]
    async fn test_compute_for_day_period_is_empty() {
        let store = Arc::new(MemoryFactorStore::new());
        seed_day(&store, "BTC", 5, dec!(90), dec!(130)).await;

        let aggregator = WindowAggregator::new(Arc::clone(&store));
        let computation = aggregator
            .compute_for_date(day(5), FactorPeriod::Day)
            .await
            .unwrap();
        assert!(computation.updates.is_empty());
    }

    #[tokio::test]
    async fn test_window_snapshot_aggregates_price_fields() {
        let store = Arc::new(MemoryFactorStore::new());
        seed_day(&store, "BTC", 4, dec!(100), dec!(110)).await;
        seed_day(&store, "BTC", 5, dec!(90), dec!(130)).await;
        store
            .upsert(
                &FactorKey::new(symbol("BTC"), day(5)),
                &[FactorUpdate::RollingFactor {
                    period: FactorPeriod::Week,
                    factor: dec!(0.26316),
                }],
            )
            .await
            .unwrap();

        let aggregator = WindowAggregator::new(Arc::clone(&store));
        let snapshot = aggregator
            .window_snapshot(&symbol("BTC"), day(5), FactorPeriod::Week)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.min_price, Some(dec!(90)));
        assert_eq!(snapshot.min_price_at, Some(at(5, 4)));
        assert_eq!(snapshot.max_price, Some(dec!(130)));
        assert_eq!(snapshot.max_price_at, Some(at(5, 14)));
        // Oldest from the earliest day, newest from the latest.
        assert_eq!(snapshot.oldest_price, Some(dec!(100)));
        assert_eq!(snapshot.oldest_price_at, Some(at(4, 0)));
        assert_eq!(snapshot.newest_price, Some(dec!(130)));
        assert_eq!(snapshot.newest_price_at, Some(at(5, 23)));
        assert_eq!(snapshot.factor, Some(dec!(0.26316)));
    }

    #[tokio::test]
    async fn test_window_snapshot_empty_window_is_none() {
        let store = Arc::new(MemoryFactorStore::new());
        let aggregator = WindowAggregator::new(Arc::clone(&store));

        let snapshot = aggregator
            .window_snapshot(&symbol("BTC"), day(10), FactorPeriod::Week)
            .await
            .unwrap();
        assert!(snapshot.is_none());
    }
}
