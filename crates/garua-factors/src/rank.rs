//! Symbol ranking by normalized factor.

use chrono::NaiveDate;
use std::sync::Arc;

use garua_store::FactorStore;
use garua_types::{FactorPeriod, Symbol};

use crate::Result;

/// Orders symbols by a period's normalized factor.
#[derive(Debug)]
pub struct RankingEngine<S> {
    store: Arc<S>,
}

impl<S> RankingEngine<S> {
    /// Creates a ranking engine reading from the given store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: FactorStore> RankingEngine<S> {
    /// Returns the symbols with a populated factor for the period on `date`,
    /// descending by factor value, ties broken by symbol ascending, truncated
    /// to `limit` when given.
    ///
    /// An empty result means no symbol has the requested factor populated;
    /// callers map that to a not-found outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn rank(
        &self,
        date: NaiveDate,
        period: FactorPeriod,
        limit: Option<usize>,
    ) -> Result<Vec<Symbol>> {
        let mut scored: Vec<(rust_decimal::Decimal, Symbol)> = self
            .store
            .by_date(date)
            .await?
            .into_iter()
            .filter_map(|record| {
                record
                    .factor_for(period)
                    .map(|factor| (factor, record.symbol))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut symbols: Vec<Symbol> = scored.into_iter().map(|(_, symbol)| symbol).collect();
        if let Some(limit) = limit {
            symbols.truncate(limit);
        }
        Ok(symbols)
    }

    /// Returns the symbol with the highest factor for the period on `date`,
    /// or `None` when no symbol has that factor populated.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn best(&self, date: NaiveDate, period: FactorPeriod) -> Result<Option<Symbol>> {
        Ok(self.rank(date, period, Some(1)).await?.into_iter().next())
    }
}
