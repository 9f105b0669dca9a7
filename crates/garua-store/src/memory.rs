//! In-memory storage adapters.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use garua_types::{DailyFactors, DateRange, FactorKey, FactorUpdate, PriceTick, Symbol};

use crate::{FactorStore, Result, TickStore};

/// In-memory tick store backed by a `BTreeMap` keyed by day.
///
/// Intended for tests and for embedding the engine without a data directory.
#[derive(Debug, Default)]
pub struct MemoryTickStore {
    days: RwLock<BTreeMap<NaiveDate, BTreeMap<(DateTime<Utc>, Symbol), PriceTick>>>,
}

impl MemoryTickStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TickStore for MemoryTickStore {
    async fn insert_ticks(&self, ticks: &[PriceTick]) -> Result<()> {
        let mut days = self.days.write().await;
        for tick in ticks {
            days.entry(tick.date())
                .or_default()
                .insert((tick.timestamp, tick.symbol.clone()), tick.clone());
        }
        Ok(())
    }

    async fn ticks_for_date(&self, date: NaiveDate) -> Result<Vec<PriceTick>> {
        let days = self.days.read().await;
        Ok(days
            .get(&date)
            .map(|ticks| ticks.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn dates(&self) -> Result<Vec<NaiveDate>> {
        let days = self.days.read().await;
        Ok(days.keys().copied().collect())
    }
}

/// In-memory factor store backed by a `BTreeMap` keyed by `(date, symbol)`.
#[derive(Debug, Default)]
pub struct MemoryFactorStore {
    records: RwLock<BTreeMap<(NaiveDate, Symbol), DailyFactors>>,
}

impl MemoryFactorStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FactorStore for MemoryFactorStore {
    async fn get(&self, key: &FactorKey) -> Result<Option<DailyFactors>> {
        let records = self.records.read().await;
        Ok(records.get(&(key.date, key.symbol.clone())).cloned())
    }

    async fn get_many(&self, keys: &[FactorKey]) -> Result<HashMap<FactorKey, DailyFactors>> {
        let records = self.records.read().await;
        let mut found = HashMap::new();
        for key in keys {
            if let Some(record) = records.get(&(key.date, key.symbol.clone())) {
                found.insert(key.clone(), record.clone());
            }
        }
        Ok(found)
    }

    async fn upsert(&self, key: &FactorKey, updates: &[FactorUpdate]) -> Result<bool> {
        let mut records = self.records.write().await;
        let map_key = (key.date, key.symbol.clone());
        let created = !records.contains_key(&map_key);
        let record = records
            .entry(map_key)
            .or_insert_with(|| DailyFactors::empty(key.symbol.clone(), key.date));
        for update in updates {
            record.apply(update);
        }
        Ok(created)
    }

    async fn by_date(&self, date: NaiveDate) -> Result<Vec<DailyFactors>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|((d, _), _)| *d == date)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn by_date_range(
        &self,
        symbol: &Symbol,
        range: &DateRange,
    ) -> Result<Vec<DailyFactors>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|((date, s), _)| s == symbol && range.contains(*date))
            .map(|(_, record)| record.clone())
            .collect())
    }
}
