//! Display utilities and output formatting for the garua CLI.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use garua_lib::{PassOutcome, PriceFactors};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Resolves the data directory: an explicit override or the platform default.
pub(crate) fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(garua_lib::default_data_path)
}

/// Returns the reference date for a query: the given date or today (UTC).
pub(crate) fn reference_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Utc::now().date_naive())
}

/// Prints a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats an optional price for table output.
pub(crate) fn fmt_price(price: Option<Decimal>) -> String {
    price.map_or_else(|| "-".to_string(), |p| p.to_string())
}

/// Formats an optional timestamp for table output.
pub(crate) fn fmt_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Prints a price-factor record as an aligned table.
pub(crate) fn print_factors(factors: &PriceFactors) {
    println!("Symbol:  {}", factors.symbol);
    println!("Date:    {}", factors.date);
    println!("Period:  {}", factors.period);
    println!(
        "Min:     {} @ {}",
        fmt_price(factors.min_price),
        fmt_time(factors.min_price_at)
    );
    println!(
        "Max:     {} @ {}",
        fmt_price(factors.max_price),
        fmt_time(factors.max_price_at)
    );
    println!(
        "Oldest:  {} @ {}",
        fmt_price(factors.oldest_price),
        fmt_time(factors.oldest_price_at)
    );
    println!(
        "Newest:  {} @ {}",
        fmt_price(factors.newest_price),
        fmt_time(factors.newest_price_at)
    );
    println!("Factor:  {}", fmt_price(factors.factor));
}

/// Prints a pass outcome as a one-line summary.
pub(crate) fn print_outcome(outcome: &PassOutcome) {
    let stage = |result: Option<garua_lib::ReconcileOutcome>| {
        result.map_or_else(
            || "already done".to_string(),
            |r| format!("{} inserted, {} updated", r.inserted, r.updated),
        )
    };
    println!("Processed {}", outcome.date);
    println!("  daily:   {}", stage(outcome.daily));
    println!("  weekly:  {}", stage(outcome.weekly));
    println!("  monthly: {}", stage(outcome.monthly));
    if outcome.skipped > 0 {
        println!("  skipped: {} symbol factor(s)", outcome.skipped);
    }
}

/// Serializes a pass outcome for `--json` output.
pub(crate) fn outcome_json(outcome: &PassOutcome) -> serde_json::Value {
    let stage = |result: Option<garua_lib::ReconcileOutcome>| {
        result.map(|r| {
            serde_json::json!({
                "inserted": r.inserted,
                "updated": r.updated,
            })
        })
    };
    serde_json::json!({
        "date": outcome.date,
        "daily": stage(outcome.daily),
        "weekly": stage(outcome.weekly),
        "monthly": stage(outcome.monthly),
        "skipped": outcome.skipped,
    })
}
