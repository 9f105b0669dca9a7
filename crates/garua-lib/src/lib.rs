//! Crypto price-factor aggregation and ranking library.
//!
//! This is a facade crate that re-exports functionality from the garua
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use garua_lib::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let base = garua_store::default_data_path();
//!     let ticks = Arc::new(JsonTickStore::new(&base).await?);
//!     let factors = Arc::new(JsonFactorStore::new(&base).await?);
//!     let queue = ProcessingQueue::new(&base)?;
//!
//!     let processor = DateProcessor::new(ticks, Arc::clone(&factors), queue);
//!     while let Some(outcome) = processor.run_next_pass(None).await? {
//!         println!("processed {}", outcome.date);
//!     }
//!
//!     let ranking = RankingEngine::new(factors);
//!     let date = chrono::Utc::now().date_naive();
//!     println!("{:?}", ranking.rank(date, FactorPeriod::Day, Some(3)).await?);
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/garua/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use garua_types::*;

// Re-export storage
#[cfg(feature = "store")]
pub use garua_store::{
    FactorStore, JsonFactorStore, JsonTickStore, MemoryFactorStore, MemoryTickStore, StoreError,
    TickStore, default_data_path,
};

// Re-export the factor engine
#[cfg(feature = "factors")]
pub use garua_factors::{
    DailyComputation, FactorError, FactorQuery, RankingEngine, ReconcileOutcome, Reconciler,
    WindowAggregator, WindowComputation, compute_daily_factors,
};

// Re-export the pipeline
#[cfg(feature = "pipeline")]
pub use garua_pipeline::{
    DateProcessor, PassOutcome, PassState, PipelineError, ProcessingQueue, QueueEntry, QueueError,
};

// Re-export ingestion
#[cfg(feature = "ingest")]
pub use garua_ingest::{CsvTickReader, IngestError, IngestSummary};

/// Prelude module for convenient imports.
///
/// ```
/// use garua_lib::prelude::*;
/// ```
pub mod prelude {
    pub use garua_types::{
        DailyFactors, DateRange, FactorKey, FactorPeriod, FactorUpdate, PriceFactors, PriceTick,
        Symbol,
    };

    #[cfg(feature = "store")]
    pub use garua_store::{
        FactorStore, JsonFactorStore, JsonTickStore, MemoryFactorStore, MemoryTickStore, TickStore,
    };

    #[cfg(feature = "factors")]
    pub use garua_factors::{
        FactorQuery, RankingEngine, Reconciler, WindowAggregator, compute_daily_factors,
    };

    #[cfg(feature = "pipeline")]
    pub use garua_pipeline::{DateProcessor, PassOutcome, PassState, ProcessingQueue};

    #[cfg(feature = "ingest")]
    pub use garua_ingest::CsvTickReader;
}
