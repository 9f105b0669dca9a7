//! Processing pass command.

use anyhow::Result;
use chrono::NaiveDate;
use garua_lib::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::display::{outcome_json, print_json, print_outcome, reference_date, resolve_data_dir};

/// Execute the process command.
pub(crate) async fn process(
    date: Option<NaiveDate>,
    all: bool,
    today_if_empty: bool,
    data_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let base = resolve_data_dir(data_dir);

    let ticks = Arc::new(JsonTickStore::new(&base).await?);
    let factors = Arc::new(JsonFactorStore::new(&base).await?);
    let queue = ProcessingQueue::new(&base)?;

    let recovered = queue.recover_stale_claims()?;
    for recovered_date in &recovered {
        warn!(date = %recovered_date, "recovered stale queue claim");
    }

    let processor = DateProcessor::new(ticks, factors, queue);

    if let Some(date) = date {
        let outcome = processor.process_date(date).await?;
        return report(&outcome, json);
    }

    if all {
        return drain(&processor, json).await;
    }

    let fallback = today_if_empty.then(|| reference_date(None));
    match processor.run_next_pass(fallback).await? {
        Some(outcome) => report(&outcome, json),
        None => {
            if json {
                print_json(&serde_json::json!({ "processed": [] }))
            } else {
                println!("Queue is empty; nothing to process.");
                Ok(())
            }
        }
    }
}

/// Processes every pending date, earliest first.
async fn drain(
    processor: &DateProcessor<JsonTickStore, JsonFactorStore>,
    json: bool,
) -> Result<()> {
    let pending = processor.queue().pending()?.len();
    if pending == 0 {
        if json {
            return print_json(&serde_json::json!({ "processed": [] }));
        }
        println!("Queue is empty; nothing to process.");
        return Ok(());
    }

    let bar = if json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(pending as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("valid progress template"),
        );
        bar
    };

    let mut outcomes = Vec::new();
    while let Some(outcome) = processor.run_next_pass(None).await? {
        bar.set_message(outcome.date.to_string());
        bar.inc(1);
        outcomes.push(outcome);
    }
    bar.finish_and_clear();

    if json {
        let entries: Vec<_> = outcomes.iter().map(outcome_json).collect();
        return print_json(&serde_json::json!({ "processed": entries }));
    }
    for outcome in &outcomes {
        print_outcome(outcome);
    }
    Ok(())
}

fn report(outcome: &PassOutcome, json: bool) -> Result<()> {
    if json {
        print_json(&outcome_json(outcome))
    } else {
        print_outcome(outcome);
        Ok(())
    }
}
