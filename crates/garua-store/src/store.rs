//! Storage trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use garua_types::{DailyFactors, DateRange, FactorKey, FactorUpdate, PriceTick, Symbol};

use crate::Result;

/// Store of raw price ticks, keyed by `(timestamp, symbol)` within a day.
#[async_trait]
pub trait TickStore: Send + Sync {
    /// Inserts ticks into the store. Ticks are immutable; re-inserting a
    /// `(timestamp, symbol)` pair that already exists replaces it with an
    /// identical observation and is harmless.
    async fn insert_ticks(&self, ticks: &[PriceTick]) -> Result<()>;

    /// Returns all ticks whose timestamp falls on the given UTC day.
    async fn ticks_for_date(&self, date: NaiveDate) -> Result<Vec<PriceTick>>;

    /// Returns all dates that have at least one tick, ascending.
    async fn dates(&self) -> Result<Vec<NaiveDate>>;
}

/// Store of daily factor records, keyed by `(symbol, date)`.
#[async_trait]
pub trait FactorStore: Send + Sync {
    /// Returns the record for the given key, if any.
    async fn get(&self, key: &FactorKey) -> Result<Option<DailyFactors>>;

    /// Returns the existing records for the given keys in one batched read.
    /// Keys with no record are absent from the result.
    async fn get_many(&self, keys: &[FactorKey]) -> Result<HashMap<FactorKey, DailyFactors>>;

    /// Applies the field-group updates to the record for `key`, creating the
    /// record first when it does not exist. All updates apply in one write.
    ///
    /// Returns `true` when a new record was created.
    async fn upsert(&self, key: &FactorKey, updates: &[FactorUpdate]) -> Result<bool>;

    /// Returns all records for the given date, in ascending symbol order.
    async fn by_date(&self, date: NaiveDate) -> Result<Vec<DailyFactors>>;

    /// Returns the symbol's records whose date falls within the range,
    /// in ascending date order.
    async fn by_date_range(
        &self,
        symbol: &Symbol,
        range: &DateRange,
    ) -> Result<Vec<DailyFactors>>;
}
