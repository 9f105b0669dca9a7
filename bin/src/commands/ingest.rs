//! CSV ingestion command.

use anyhow::{Context, Result};
use garua_lib::prelude::*;
use std::path::{Path, PathBuf};

use crate::display::{print_json, resolve_data_dir};

/// Execute the ingest command.
pub(crate) async fn ingest(
    file: &Path,
    no_enqueue: bool,
    data_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let base = resolve_data_dir(data_dir);

    let input = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("Failed to open tick file '{}'", file.display()))?;
    let (ticks, summary) = CsvTickReader::new()
        .read_ticks(input)
        .await
        .context("Failed to parse tick file")?;

    let store = JsonTickStore::new(&base).await?;
    store.insert_ticks(&ticks).await?;

    let mut enqueued = 0;
    if !no_enqueue {
        let queue = ProcessingQueue::new(&base)?;
        for date in &summary.dates {
            if queue.enqueue(*date)? {
                enqueued += 1;
            }
        }
    }

    if json {
        return print_json(&serde_json::json!({
            "ticks": summary.ticks,
            "symbols": summary.symbols,
            "dates": summary.dates,
            "enqueued": enqueued,
        }));
    }

    println!(
        "Ingested {} tick(s) across {} symbol(s) and {} date(s)",
        summary.ticks,
        summary.symbols.len(),
        summary.dates.len()
    );
    if !no_enqueue {
        println!("Enqueued {enqueued} date(s) for processing");
    }
    Ok(())
}
