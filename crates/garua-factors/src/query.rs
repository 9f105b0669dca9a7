//! Factor lookups served to callers.

use chrono::NaiveDate;
use std::sync::Arc;

use garua_store::FactorStore;
use garua_types::{FactorKey, FactorPeriod, PriceFactors, Symbol};

use crate::{Result, WindowAggregator};

/// Serves price-factor lookups for a symbol, date, and period.
///
/// Day queries project the stored record; week and month queries aggregate
/// the trailing window. Absence of data is `Ok(None)`, never an error.
#[derive(Debug)]
pub struct FactorQuery<S> {
    store: Arc<S>,
    window: WindowAggregator<S>,
}

impl<S> FactorQuery<S> {
    /// Creates a query service reading from the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        let window = WindowAggregator::new(Arc::clone(&store));
        Self { store, window }
    }
}

impl<S: FactorStore> FactorQuery<S> {
    /// Returns the price factors for the symbol on `date` over the period,
    /// or `None` when no data exists for the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_factors(
        &self,
        symbol: &Symbol,
        date: NaiveDate,
        period: FactorPeriod,
    ) -> Result<Option<PriceFactors>> {
        match period {
            FactorPeriod::Day => {
                let key = FactorKey::new(symbol.clone(), date);
                let Some(record) = self.store.get(&key).await? else {
                    return Ok(None);
                };
                Ok(Some(PriceFactors {
                    symbol: record.symbol,
                    date,
                    period,
                    min_price: record.min_price,
                    min_price_at: record.min_price_at,
                    max_price: record.max_price,
                    max_price_at: record.max_price_at,
                    oldest_price: record.oldest_price,
                    oldest_price_at: record.oldest_price_at,
                    newest_price: record.newest_price,
                    newest_price_at: record.newest_price_at,
                    factor: record.daily_factor,
                }))
            }
            FactorPeriod::Week | FactorPeriod::Month => {
                self.window.window_snapshot(symbol, date, period).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use garua_store::MemoryFactorStore;
    use garua_types::FactorUpdate;
    use rust_decimal_macros::dec;

    fn symbol(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_day_query_projects_stored_record() {
        let store = Arc::new(MemoryFactorStore::new());
        let at = Utc.with_ymd_and_hms(2022, 1, 5, 12, 0, 0).unwrap();
        store
            .upsert(
                &FactorKey::new(symbol("BTC"), day(5)),
                &[FactorUpdate::MinMax {
                    min_price: dec!(90),
                    min_price_at: at,
                    max_price: dec!(130),
                    max_price_at: at,
                    daily_factor: Some(dec!(0.44444)),
                }],
            )
            .await
            .unwrap();

        let query = FactorQuery::new(Arc::clone(&store));
        let factors = query
            .get_factors(&symbol("BTC"), day(5), FactorPeriod::Day)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(factors.min_price, Some(dec!(90)));
        assert_eq!(factors.factor, Some(dec!(0.44444)));
        assert_eq!(factors.period, FactorPeriod::Day);
    }

    #[tokio::test]
    async fn test_missing_day_record_is_none() {
        let store = Arc::new(MemoryFactorStore::new());
        let query = FactorQuery::new(Arc::clone(&store));

        let factors = query
            .get_factors(&symbol("BTC"), day(5), FactorPeriod::Day)
            .await
            .unwrap();
        assert!(factors.is_none());
    }

    #[tokio::test]
    async fn test_week_query_with_no_window_rows_is_none_not_zero() {
        let store = Arc::new(MemoryFactorStore::new());
        let query = FactorQuery::new(Arc::clone(&store));

        let factors = query
            .get_factors(&symbol("BTC"), day(5), FactorPeriod::Week)
            .await
            .unwrap();
        assert!(factors.is_none());
    }
}
