//! Storage traits and adapters for the garua crypto factor service.
//!
//! This crate provides the persistence seam between the factor engine and
//! whatever holds the data:
//!
//! - [`TickStore`] / [`FactorStore`] - async storage traits
//! - [`MemoryTickStore`] / [`MemoryFactorStore`] - in-memory adapters
//! - [`JsonTickStore`] / [`JsonFactorStore`] - file-backed adapters storing
//!   one JSON document per calendar day
//! - [`StoreError`] - storage failure type
//!
//! Factor upserts apply all of a key's field-group updates in a single
//! write, so readers never observe a half-applied group.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/garua/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod json;
mod memory;
mod store;

pub use error::{Result, StoreError};
pub use json::{JsonFactorStore, JsonTickStore, default_data_path};
pub use memory::{MemoryFactorStore, MemoryTickStore};
pub use store::{FactorStore, TickStore};
