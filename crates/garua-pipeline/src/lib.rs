//! Processing queue and batch orchestration for garua.
//!
//! This crate drives the per-date factor pipeline:
//!
//! - [`ProcessingQueue`] - persisted queue of pending dates with atomic
//!   claim-and-mark-in-progress semantics
//! - [`PassState`] - per-date progress through the pipeline stages
//! - [`DateProcessor`] - runs one date's daily, weekly, and monthly passes,
//!   resuming from the last successful stage
//!
//! One pass is in flight at a time, enforced by the queue claim; a failed
//! stage leaves the date at its last successful state for retry.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/garua/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod processor;
mod queue;

pub use processor::{DateProcessor, PassOutcome, PipelineError, Result};
pub use queue::{ClaimToken, PassState, ProcessingQueue, QueueEntry, QueueError};
