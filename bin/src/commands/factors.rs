//! Price-factor lookup command.

use anyhow::Result;
use chrono::NaiveDate;
use garua_lib::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::display::{print_factors, print_json, reference_date, resolve_data_dir};

/// Execute the factors command.
pub(crate) async fn factors(
    symbol: &Symbol,
    date: Option<NaiveDate>,
    period: FactorPeriod,
    data_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let base = resolve_data_dir(data_dir);
    let date = reference_date(date);

    let store = Arc::new(JsonFactorStore::new(&base).await?);
    let query = FactorQuery::new(store);
    let factors = query.get_factors(symbol, date, period).await?;

    if json {
        return print_json(&factors);
    }

    match factors {
        Some(factors) => print_factors(&factors),
        None => println!("No {period} factors for {symbol} on {date}."),
    }
    Ok(())
}
