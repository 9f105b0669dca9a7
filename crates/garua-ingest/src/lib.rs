//! CSV tick ingestion for the garua crypto factor service.
//!
//! Input files carry one tick per row with a `timestamp,symbol,price`
//! header, timestamps as epoch milliseconds:
//!
//! ```text
//! timestamp,symbol,price
//! 1641009600000,BTC,46813.21
//! 1641020400000,BTC,46979.61
//! ```
//!
//! [`CsvTickReader`] parses rows into validated [`PriceTick`]s, failing with
//! the offending line number on malformed input, and reports the distinct
//! symbols and dates touched so callers can enqueue the dates for
//! processing.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/garua/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod csv;

pub use csv::{CsvTickReader, IngestError, IngestSummary, Result};
