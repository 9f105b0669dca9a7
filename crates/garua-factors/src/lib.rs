//! Price-factor aggregation and reconciliation engine for garua.
//!
//! This crate turns raw ticks into per-symbol daily factor records and rolls
//! those records into week/month windows:
//!
//! - [`compute_daily_factors`] - per-symbol daily price extremes and the
//!   daily normalized factor
//! - [`Reconciler`] - merges computed values into the factor store without
//!   clobbering fields written by other passes
//! - [`WindowAggregator`] - rolling week/month-to-date normalized factors
//! - [`RankingEngine`] - orders symbols by a period's normalized factor
//! - [`FactorQuery`] - factor lookups served to callers

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/garua/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod daily;
mod error;
mod query;
mod rank;
mod reconcile;
mod window;

pub use daily::{DailyComputation, compute_daily_factors};
pub use error::{FactorError, Result};
pub use query::FactorQuery;
pub use rank::RankingEngine;
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use window::{WindowAggregator, WindowComputation};

use garua_types::FACTOR_SCALE;
use rust_decimal::Decimal;

/// Computes the normalized factor `(max - min) / min`, rounded to the stored
/// factor scale. Returns `None` when `min` is zero.
pub(crate) fn normalized_factor(min: Decimal, max: Decimal) -> Option<Decimal> {
    if min.is_zero() {
        return None;
    }
    Some(((max - min) / min).round_dp(FACTOR_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalized_factor() {
        assert_eq!(
            normalized_factor(dec!(2950), dec!(3100)),
            Some(dec!(0.05085))
        );
        assert_eq!(normalized_factor(dec!(190), dec!(240)), Some(dec!(0.26316)));
        assert_eq!(normalized_factor(dec!(0), dec!(100)), None);
    }
}
