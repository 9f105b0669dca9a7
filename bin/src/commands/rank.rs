//! Ranking and best-symbol commands.

use anyhow::Result;
use chrono::NaiveDate;
use garua_lib::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::display::{print_json, reference_date, resolve_data_dir};

/// Execute the rank command.
pub(crate) async fn rank(
    date: Option<NaiveDate>,
    period: FactorPeriod,
    limit: Option<usize>,
    data_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let base = resolve_data_dir(data_dir);
    let date = reference_date(date);

    let factors = Arc::new(JsonFactorStore::new(&base).await?);
    let engine = RankingEngine::new(factors);
    let ranking = engine.rank(date, period, limit).await?;

    if json {
        return print_json(&serde_json::json!({
            "date": date,
            "period": period,
            "ranking": ranking,
        }));
    }

    if ranking.is_empty() {
        println!("No {period} factors for {date}.");
        return Ok(());
    }
    for (position, symbol) in ranking.iter().enumerate() {
        println!("{:>3}. {symbol}", position + 1);
    }
    Ok(())
}

/// Execute the best command.
pub(crate) async fn best(
    date: Option<NaiveDate>,
    period: FactorPeriod,
    data_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let base = resolve_data_dir(data_dir);
    let date = reference_date(date);

    let factors = Arc::new(JsonFactorStore::new(&base).await?);
    let engine = RankingEngine::new(factors);
    let best = engine.best(date, period).await?;

    if json {
        return print_json(&serde_json::json!({
            "date": date,
            "period": period,
            "best": best,
        }));
    }

    match best {
        Some(symbol) => println!("{symbol}"),
        None => println!("No {period} factors for {date}."),
    }
    Ok(())
}
