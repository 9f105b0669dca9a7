//! File-backed storage adapters.
//!
//! Both adapters persist one JSON document per calendar day: the tick store
//! writes `ticks/<date>.json` holding the day's ticks, the factor store
//! writes `factors/<date>.json` holding a symbol-keyed map of records.
//! Documents are written to a temporary file and renamed into place, so a
//! reader never observes a partially written day.

use async_trait::async_trait;
use chrono::NaiveDate;
use directories::ProjectDirs;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;

use garua_types::{DailyFactors, DateRange, FactorKey, FactorUpdate, PriceTick, Symbol};

use crate::{FactorStore, Result, StoreError, TickStore};

/// Returns the default base path for garua data storage.
///
/// Uses the platform data directory (`~/.local/share/garua` on Linux),
/// falling back to `~/.garua` when it cannot be determined.
#[must_use]
pub fn default_data_path() -> PathBuf {
    ProjectDirs::from("", "", "garua").map_or_else(dirs_fallback, |proj_dirs| {
        proj_dirs.data_dir().to_path_buf()
    })
}

/// Fallback for determining the home directory.
fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".garua")
}

async fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .map_err(|e| StoreError::CreateDir {
                path: path.to_path_buf(),
                source: e,
            })?;
    }
    Ok(())
}

fn date_file(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{date}.json"))
}

async fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
    let document = serde_json::from_str(&content).map_err(|e| StoreError::ParseJson {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(document))
}

async fn write_document<T: serde::Serialize>(path: &Path, document: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).await.map_err(|e| StoreError::WriteFile {
        path: tmp.clone(),
        source: e,
    })?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Lists the dates of all `<date>.json` documents in a directory, ascending.
async fn list_dates(dir: &Path) -> Result<Vec<NaiveDate>> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| StoreError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut dates = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })? {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match stem.parse::<NaiveDate>() {
            Ok(date) => dates.push(date),
            Err(_) => {
                tracing::warn!(path = %path.display(), "skipping non-date document");
            }
        }
    }

    dates.sort_unstable();
    Ok(dates)
}

/// File-backed tick store.
#[derive(Debug, Clone)]
pub struct JsonTickStore {
    ticks_path: PathBuf,
}

impl JsonTickStore {
    /// Creates a tick store under the given base path, creating the
    /// `ticks/` directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn new(base_path: &Path) -> Result<Self> {
        let ticks_path = base_path.join("ticks");
        ensure_dir(&ticks_path).await?;
        Ok(Self { ticks_path })
    }

    /// Creates a tick store at the platform default data path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn with_default_path() -> Result<Self> {
        Self::new(&default_data_path()).await
    }
}

#[async_trait]
impl TickStore for JsonTickStore {
    async fn insert_ticks(&self, ticks: &[PriceTick]) -> Result<()> {
        // Group incoming ticks by day so each document is rewritten once.
        let mut by_date: BTreeMap<NaiveDate, Vec<&PriceTick>> = BTreeMap::new();
        for tick in ticks {
            by_date.entry(tick.date()).or_default().push(tick);
        }

        for (date, day_ticks) in by_date {
            let path = date_file(&self.ticks_path, date);
            let mut existing: Vec<PriceTick> =
                read_document(&path).await?.unwrap_or_default();
            existing.retain(|t| {
                !day_ticks
                    .iter()
                    .any(|n| n.timestamp == t.timestamp && n.symbol == t.symbol)
            });
            existing.extend(day_ticks.into_iter().cloned());
            existing.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.symbol.cmp(&b.symbol))
            });
            write_document(&path, &existing).await?;
        }
        Ok(())
    }

    async fn ticks_for_date(&self, date: NaiveDate) -> Result<Vec<PriceTick>> {
        let path = date_file(&self.ticks_path, date);
        Ok(read_document(&path).await?.unwrap_or_default())
    }

    async fn dates(&self) -> Result<Vec<NaiveDate>> {
        list_dates(&self.ticks_path).await
    }
}

/// File-backed factor store.
#[derive(Debug, Clone)]
pub struct JsonFactorStore {
    factors_path: PathBuf,
}

/// The shape of one day's factor document: symbol -> record.
type FactorDocument = BTreeMap<Symbol, DailyFactors>;

impl JsonFactorStore {
    /// Creates a factor store under the given base path, creating the
    /// `factors/` directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn new(base_path: &Path) -> Result<Self> {
        let factors_path = base_path.join("factors");
        ensure_dir(&factors_path).await?;
        Ok(Self { factors_path })
    }

    /// Creates a factor store at the platform default data path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn with_default_path() -> Result<Self> {
        Self::new(&default_data_path()).await
    }

    async fn load_day(&self, date: NaiveDate) -> Result<FactorDocument> {
        let path = date_file(&self.factors_path, date);
        Ok(read_document(&path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl FactorStore for JsonFactorStore {
    async fn get(&self, key: &FactorKey) -> Result<Option<DailyFactors>> {
        let day = self.load_day(key.date).await?;
        Ok(day.get(&key.symbol).cloned())
    }

    async fn get_many(&self, keys: &[FactorKey]) -> Result<HashMap<FactorKey, DailyFactors>> {
        // One document read per distinct date, not per key.
        let mut by_date: BTreeMap<NaiveDate, Vec<&FactorKey>> = BTreeMap::new();
        for key in keys {
            by_date.entry(key.date).or_default().push(key);
        }

        let mut found = HashMap::new();
        for (date, date_keys) in by_date {
            let day = self.load_day(date).await?;
            for key in date_keys {
                if let Some(record) = day.get(&key.symbol) {
                    found.insert(key.clone(), record.clone());
                }
            }
        }
        Ok(found)
    }

    async fn upsert(&self, key: &FactorKey, updates: &[FactorUpdate]) -> Result<bool> {
        let mut day = self.load_day(key.date).await?;
        let created = !day.contains_key(&key.symbol);
        let record = day
            .entry(key.symbol.clone())
            .or_insert_with(|| DailyFactors::empty(key.symbol.clone(), key.date));
        for update in updates {
            record.apply(update);
        }
        let path = date_file(&self.factors_path, key.date);
        write_document(&path, &day).await?;
        Ok(created)
    }

    async fn by_date(&self, date: NaiveDate) -> Result<Vec<DailyFactors>> {
        let day = self.load_day(date).await?;
        Ok(day.into_values().collect())
    }

    async fn by_date_range(
        &self,
        symbol: &Symbol,
        range: &DateRange,
    ) -> Result<Vec<DailyFactors>> {
        let mut records = Vec::new();
        for date in range.days() {
            let path = date_file(&self.factors_path, date);
            if let Some(day) = read_document::<FactorDocument>(&path).await? {
                if let Some(record) = day.get(symbol) {
                    records.push(record.clone());
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn symbol(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_tick_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonTickStore::new(temp_dir.path()).await.unwrap();

        let ticks = vec![
            PriceTick::new(
                Utc.with_ymd_and_hms(2022, 1, 1, 8, 0, 0).unwrap(),
                symbol("ETH"),
                dec!(3000),
            ),
            PriceTick::new(
                Utc.with_ymd_and_hms(2022, 1, 2, 2, 0, 0).unwrap(),
                symbol("ETH"),
                dec!(3050),
            ),
        ];
        store.insert_ticks(&ticks).await.unwrap();

        let loaded = store.ticks_for_date(day(1)).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].price, dec!(3000));
        assert_eq!(store.dates().await.unwrap(), vec![day(1), day(2)]);
    }

    #[tokio::test]
    async fn test_tick_store_reinsert_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonTickStore::new(temp_dir.path()).await.unwrap();

        let timestamp = Utc.with_ymd_and_hms(2022, 1, 1, 8, 0, 0).unwrap();
        let tick = PriceTick::new(timestamp, symbol("ETH"), dec!(3000));
        store.insert_ticks(std::slice::from_ref(&tick)).await.unwrap();
        store.insert_ticks(std::slice::from_ref(&tick)).await.unwrap();

        assert_eq!(store.ticks_for_date(day(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_factor_store_partial_upserts_accumulate() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFactorStore::new(temp_dir.path()).await.unwrap();
        let key = FactorKey::new(symbol("BTC"), day(5));

        let at = Utc.with_ymd_and_hms(2022, 1, 5, 12, 0, 0).unwrap();
        let created = store
            .upsert(
                &key,
                &[FactorUpdate::OldestNewest {
                    oldest_price: dec!(100),
                    oldest_price_at: at,
                    newest_price: dec!(105),
                    newest_price_at: at,
                }],
            )
            .await
            .unwrap();
        assert!(created);

        let created = store
            .upsert(
                &key,
                &[FactorUpdate::RollingFactor {
                    period: garua_types::FactorPeriod::Week,
                    factor: dec!(0.26316),
                }],
            )
            .await
            .unwrap();
        assert!(!created);

        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.oldest_price, Some(dec!(100)));
        assert_eq!(record.weekly_factor, Some(dec!(0.26316)));
        assert_eq!(record.min_price, None);
    }

    #[tokio::test]
    async fn test_factor_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let key = FactorKey::new(symbol("BTC"), day(5));

        {
            let store = JsonFactorStore::new(temp_dir.path()).await.unwrap();
            store
                .upsert(
                    &key,
                    &[FactorUpdate::RollingFactor {
                        period: garua_types::FactorPeriod::Month,
                        factor: dec!(0.5),
                    }],
                )
                .await
                .unwrap();
        }

        let store = JsonFactorStore::new(temp_dir.path()).await.unwrap();
        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.monthly_factor, Some(dec!(0.5)));
    }

    #[tokio::test]
    async fn test_factor_store_by_date_range() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFactorStore::new(temp_dir.path()).await.unwrap();

        for d in [1u32, 2, 3, 8] {
            store
                .upsert(
                    &FactorKey::new(symbol("BTC"), day(d)),
                    &[FactorUpdate::RollingFactor {
                        period: garua_types::FactorPeriod::Week,
                        factor: dec!(0.1),
                    }],
                )
                .await
                .unwrap();
        }

        let range = DateRange::new(day(2), day(7)).unwrap();
        let records = store
            .by_date_range(&symbol("BTC"), &range)
            .await
            .unwrap();
        let dates: Vec<_> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(2), day(3)]);
    }

    #[tokio::test]
    async fn test_get_many_batches_by_date() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFactorStore::new(temp_dir.path()).await.unwrap();

        for s in ["BTC", "ETH"] {
            store
                .upsert(
                    &FactorKey::new(symbol(s), day(5)),
                    &[FactorUpdate::RollingFactor {
                        period: garua_types::FactorPeriod::Week,
                        factor: dec!(0.1),
                    }],
                )
                .await
                .unwrap();
        }

        let keys = vec![
            FactorKey::new(symbol("BTC"), day(5)),
            FactorKey::new(symbol("ETH"), day(5)),
            FactorKey::new(symbol("DOGE"), day(5)),
        ];
        let found = store.get_many(&keys).await.unwrap();
        assert_eq!(found.len(), 2);
    }
}
