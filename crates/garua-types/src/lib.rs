//! Core types for the garua crypto factor service.
//!
//! This crate provides the fundamental data structures used throughout garua:
//!
//! - [`PriceTick`] - A single timestamped price observation for a symbol
//! - [`Symbol`] - Validated cryptocurrency ticker symbol
//! - [`DailyFactors`] - Per-symbol, per-day factor record
//! - [`FactorUpdate`] - Field-group update command for a factor record
//! - [`FactorPeriod`] - Day/week/month factor period
//! - [`DateRange`] - Inclusive date range with trailing-window construction

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/garua/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod date_range;
mod error;
mod factors;
mod period;
mod symbol;
mod tick;

pub use date_range::{DateRange, DayIterator};
pub use error::DateRangeError;
pub use factors::{DailyFactors, FACTOR_SCALE, FactorKey, FactorUpdate, PriceFactors};
pub use period::{FactorPeriod, PeriodParseError};
pub use symbol::{Symbol, SymbolParseError};
pub use tick::PriceTick;
