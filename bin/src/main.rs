//! garua CLI - crypto price-factor aggregation and ranking.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use garua_lib::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "garua")]
#[command(about = "Crypto price-factor aggregation and ranking", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a CSV tick file and enqueue its dates for processing
    Ingest {
        /// Path to a timestamp,symbol,price CSV file
        file: PathBuf,

        /// Store the ticks without enqueueing their dates
        #[arg(long)]
        no_enqueue: bool,
    },

    /// Run processing passes over pending dates
    Process {
        /// Process a specific date (YYYY-MM-DD) instead of the queue head
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Drain the whole queue
        #[arg(long)]
        all: bool,

        /// Process today when the queue is empty
        #[arg(long)]
        today_if_empty: bool,
    },

    /// Rank symbols by normalized factor, best first
    Rank {
        /// Reference date (YYYY-MM-DD). Defaults to today.
        date: Option<NaiveDate>,

        /// Factor period (day, week, month)
        #[arg(short, long, default_value = "day")]
        period: FactorPeriod,

        /// Truncate the ranking to the top N symbols
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the symbol with the highest normalized factor
    Best {
        /// Reference date (YYYY-MM-DD). Defaults to today.
        date: Option<NaiveDate>,

        /// Factor period (day, week, month)
        #[arg(short, long, default_value = "day")]
        period: FactorPeriod,
    },

    /// Show price factors for a symbol
    Factors {
        /// Cryptocurrency symbol (e.g. BTC)
        symbol: Symbol,

        /// Reference date (YYYY-MM-DD). Defaults to today.
        date: Option<NaiveDate>,

        /// Factor period (day, week, month)
        #[arg(short, long, default_value = "day")]
        period: FactorPeriod,
    },

    /// Show the processing queue
    Queue {
        /// Remove all queue entries
        #[arg(long)]
        clear: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let data_dir = cli.data_dir;
    let json = cli.json;

    match command {
        Commands::Ingest { file, no_enqueue } => {
            commands::ingest::ingest(&file, no_enqueue, data_dir, json).await
        }
        Commands::Process {
            date,
            all,
            today_if_empty,
        } => commands::process::process(date, all, today_if_empty, data_dir, json).await,
        Commands::Rank {
            date,
            period,
            limit,
        } => commands::rank::rank(date, period, limit, data_dir, json).await,
        Commands::Best { date, period } => commands::rank::best(date, period, data_dir, json).await,
        Commands::Factors {
            symbol,
            date,
            period,
        } => commands::factors::factors(&symbol, date, period, data_dir, json).await,
        Commands::Queue { clear, yes } => commands::queue::queue(clear, yes, data_dir, json),
    }
}
