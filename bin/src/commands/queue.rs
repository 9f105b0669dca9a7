//! Processing queue command.

use anyhow::Result;
use garua_lib::prelude::*;
use inquire::Confirm;
use std::path::PathBuf;

use crate::display::{print_json, resolve_data_dir};

/// Execute the queue command.
pub(crate) fn queue(clear: bool, yes: bool, data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let base = resolve_data_dir(data_dir);
    let queue = ProcessingQueue::new(&base)?;

    if clear {
        return clear_queue(&queue, yes);
    }

    let entries = queue.entries()?;

    if json {
        let entries: Vec<_> = entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "date": entry.date,
                    "state": entry.state,
                    "claimed": entry.is_claimed(),
                    "attempts": entry.attempts,
                    "last_error": entry.last_error,
                })
            })
            .collect();
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("Queue is empty.");
        return Ok(());
    }

    println!("{:<12} {:<18} {:>8}  {}", "DATE", "STATE", "ATTEMPTS", "LAST ERROR");
    for entry in entries {
        let state = if entry.is_claimed() {
            format!("{} (claimed)", entry.state)
        } else {
            entry.state.to_string()
        };
        println!(
            "{:<12} {:<18} {:>8}  {}",
            entry.date.to_string(),
            state,
            entry.attempts,
            entry.last_error.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn clear_queue(queue: &ProcessingQueue, yes: bool) -> Result<()> {
    let pending = queue.pending()?.len();
    if !yes {
        let prompt = format!(
            "Remove all queue entries ({pending} still pending)?"
        );
        let confirmed = Confirm::new(&prompt).with_default(false).prompt()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }
    let removed = queue.clear()?;
    println!("Removed {removed} queue entries.");
    Ok(())
}
