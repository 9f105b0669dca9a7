//! CSV tick reader.

use chrono::{DateTime, NaiveDate, Utc};
use csv_async::{AsyncReaderBuilder, StringRecord};
use futures::StreamExt;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::io::AsyncRead;

use garua_types::{PriceTick, Symbol, SymbolParseError};

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while reading a tick file.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The CSV reader failed (I/O or malformed CSV structure).
    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),

    /// A row has fewer columns than expected.
    #[error("line {line}: missing '{column}' column")]
    MissingColumn {
        /// The 1-based line number of the offending row.
        line: u64,
        /// The column that was absent.
        column: &'static str,
    },

    /// A timestamp column did not hold epoch milliseconds.
    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp {
        /// The 1-based line number of the offending row.
        line: u64,
        /// The raw column value.
        value: String,
    },

    /// A symbol column did not hold a valid ticker.
    #[error("line {line}: {source}")]
    InvalidSymbol {
        /// The 1-based line number of the offending row.
        line: u64,
        /// The underlying validation error.
        source: SymbolParseError,
    },

    /// A price column did not hold a decimal number.
    #[error("line {line}: invalid price '{value}'")]
    InvalidPrice {
        /// The 1-based line number of the offending row.
        line: u64,
        /// The raw column value.
        value: String,
    },
}

/// Summary of one ingested tick file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Number of ticks read.
    pub ticks: usize,
    /// Distinct symbols observed, in ascending order.
    pub symbols: BTreeSet<Symbol>,
    /// Distinct UTC dates touched, in ascending order.
    pub dates: BTreeSet<NaiveDate>,
}

/// Reads `timestamp,symbol,price` CSV rows into price ticks.
#[derive(Debug, Clone)]
pub struct CsvTickReader {
    has_headers: bool,
}

impl Default for CsvTickReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvTickReader {
    /// Creates a reader expecting a header row.
    #[must_use]
    pub const fn new() -> Self {
        Self { has_headers: true }
    }

    /// Sets whether the input starts with a header row.
    #[must_use]
    pub const fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Reads all ticks from the input.
    ///
    /// Rows are strict: a malformed timestamp, symbol, or price fails the
    /// whole read with the offending line number rather than silently
    /// skipping data.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or the first malformed row.
    pub async fn read_ticks<R>(&self, reader: R) -> Result<(Vec<PriceTick>, IngestSummary)>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut csv_reader = AsyncReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .create_reader(reader);

        let mut ticks = Vec::new();
        let mut summary = IngestSummary::default();

        let mut records = csv_reader.records();
        while let Some(record) = records.next().await {
            let record = record?;
            let tick = parse_row(&record)?;
            summary.ticks += 1;
            summary.symbols.insert(tick.symbol.clone());
            summary.dates.insert(tick.date());
            ticks.push(tick);
        }

        Ok((ticks, summary))
    }
}

/// Parses one CSV row into a tick.
fn parse_row(record: &StringRecord) -> Result<PriceTick> {
    let line = record.position().map_or(0, |position| position.line());

    let timestamp_raw = field(record, 0, line, "timestamp")?;
    let symbol_raw = field(record, 1, line, "symbol")?;
    let price_raw = field(record, 2, line, "price")?;

    let millis: i64 = timestamp_raw
        .parse()
        .map_err(|_| IngestError::InvalidTimestamp {
            line,
            value: timestamp_raw.to_string(),
        })?;
    let timestamp: DateTime<Utc> =
        DateTime::from_timestamp_millis(millis).ok_or_else(|| IngestError::InvalidTimestamp {
            line,
            value: timestamp_raw.to_string(),
        })?;

    let symbol = Symbol::new(symbol_raw).map_err(|source| IngestError::InvalidSymbol {
        line,
        source,
    })?;

    let price: Decimal = price_raw.parse().map_err(|_| IngestError::InvalidPrice {
        line,
        value: price_raw.to_string(),
    })?;

    Ok(PriceTick::new(timestamp, symbol, price))
}

fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    line: u64,
    column: &'static str,
) -> Result<&'r str> {
    record
        .get(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(IngestError::MissingColumn { line, column })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "\
timestamp,symbol,price
1641024000000,ETH,3000
1641031200000,ETH,3100
1641049200000,ETH,2950
1641056400000,ETH,3050
1641088800000,ETH,3030
";

    #[tokio::test]
    async fn test_reads_sample_file() {
        let reader = CsvTickReader::new();
        let (ticks, summary) = reader.read_ticks(SAMPLE.as_bytes()).await.unwrap();

        assert_eq!(ticks.len(), 5);
        assert_eq!(
            ticks[0].timestamp,
            Utc.with_ymd_and_hms(2022, 1, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(ticks[0].price, dec!(3000));
        assert_eq!(ticks[0].symbol.as_str(), "ETH");

        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.symbols.len(), 1);
        // The last tick falls on January 2nd.
        assert_eq!(
            summary.dates.iter().copied().collect::<Vec<_>>(),
            vec![
                NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2022, 1, 2).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_timestamp_reports_line() {
        let input = "timestamp,symbol,price\n1641024000000,BTC,100\nnot-a-number,BTC,100\n";
        let result = CsvTickReader::new().read_ticks(input.as_bytes()).await;

        match result {
            Err(IngestError::InvalidTimestamp { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected InvalidTimestamp, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_rejected() {
        let input = "timestamp,symbol,price\n1641024000000,btc,100\n";
        let result = CsvTickReader::new().read_ticks(input.as_bytes()).await;
        assert!(matches!(result, Err(IngestError::InvalidSymbol { .. })));
    }

    #[tokio::test]
    async fn test_invalid_price_is_rejected() {
        let input = "timestamp,symbol,price\n1641024000000,BTC,lots\n";
        let result = CsvTickReader::new().read_ticks(input.as_bytes()).await;
        assert!(matches!(
            result,
            Err(IngestError::InvalidPrice { line: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_short_row_is_missing_column() {
        let input = "timestamp,symbol,price\n1641024000000,BTC\n";
        let result = CsvTickReader::new().read_ticks(input.as_bytes()).await;
        assert!(matches!(
            result,
            Err(IngestError::MissingColumn {
                column: "price",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_headerless_input() {
        let input = "1641024000000,BTC,46813.21\n";
        let (ticks, summary) = CsvTickReader::new()
            .with_headers(false)
            .read_ticks(input.as_bytes())
            .await
            .unwrap();
        assert_eq!(ticks.len(), 1);
        assert_eq!(summary.ticks, 1);
        assert_eq!(ticks[0].price, dec!(46813.21));
    }
}
