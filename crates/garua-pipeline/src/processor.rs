//! Per-date processing pass.

use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use garua_factors::{
    FactorError, ReconcileOutcome, Reconciler, WindowAggregator, compute_daily_factors,
};
use garua_store::{FactorStore, StoreError, TickStore};
use garua_types::FactorPeriod;

use crate::{ClaimToken, PassState, ProcessingQueue, QueueError};

/// Errors that can occur while driving a processing pass.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A factor computation or reconciliation failed.
    #[error(transparent)]
    Factor(#[from] FactorError),

    /// The tick or factor store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The processing queue failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Summary of one date's processing pass.
///
/// Stages skipped because a previous pass had already completed them carry
/// no reconcile outcome.
#[derive(Debug, Clone, Copy)]
pub struct PassOutcome {
    /// The processed date.
    pub date: NaiveDate,
    /// Rows touched by the daily stage, when it ran.
    pub daily: Option<ReconcileOutcome>,
    /// Rows touched by the weekly stage, when it ran.
    pub weekly: Option<ReconcileOutcome>,
    /// Rows touched by the monthly stage, when it ran.
    pub monthly: Option<ReconcileOutcome>,
    /// Symbols skipped by recoverable failures (zero minimum price).
    pub skipped: usize,
}

impl PassOutcome {
    const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            daily: None,
            weekly: None,
            monthly: None,
            skipped: 0,
        }
    }

    /// Returns the total number of rows touched across all stages that ran.
    #[must_use]
    pub fn rows_touched(&self) -> usize {
        [self.daily, self.weekly, self.monthly]
            .iter()
            .flatten()
            .map(ReconcileOutcome::total)
            .sum()
    }
}

/// Drives one date through the daily, weekly, and monthly factor stages.
///
/// Each stage reconciles its results before the queue entry advances, so a
/// failure leaves the date at its last successful state and the next pass
/// resumes from there.
#[derive(Debug)]
pub struct DateProcessor<T, F> {
    tick_store: Arc<T>,
    reconciler: Reconciler<F>,
    windows: WindowAggregator<F>,
    queue: ProcessingQueue,
}

impl<T, F> DateProcessor<T, F> {
    /// Creates a processor over the given stores and queue.
    #[must_use]
    pub fn new(tick_store: Arc<T>, factor_store: Arc<F>, queue: ProcessingQueue) -> Self {
        Self {
            tick_store,
            reconciler: Reconciler::new(Arc::clone(&factor_store)),
            windows: WindowAggregator::new(factor_store),
            queue,
        }
    }

    /// Returns the processing queue.
    #[must_use]
    pub const fn queue(&self) -> &ProcessingQueue {
        &self.queue
    }
}

impl<T: TickStore, F: FactorStore> DateProcessor<T, F> {
    /// Claims and processes the earliest pending date.
    ///
    /// When the queue is empty the `fallback` date (if given) is enqueued and
    /// processed instead; with no fallback, `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a stage fails; the date stays at its last
    /// successful state for retry.
    pub async fn run_next_pass(&self, fallback: Option<NaiveDate>) -> Result<Option<PassOutcome>> {
        let claimed = match self.queue.claim_next()? {
            Some(claimed) => claimed,
            None => match fallback {
                Some(date) => self.queue.claim(date)?,
                None => return Ok(None),
            },
        };
        self.drive(claimed.0.date, claimed.0.state, claimed.1)
            .await
            .map(Some)
    }

    /// Processes a specific date, enqueueing it first if absent.
    ///
    /// A date that already reached [`PassState::Processed`] runs no stages;
    /// the returned outcome then carries no reconcile results.
    ///
    /// # Errors
    ///
    /// Returns an error if the date is already claimed by another pass or a
    /// stage fails.
    pub async fn process_date(&self, date: NaiveDate) -> Result<PassOutcome> {
        let (entry, token) = self.queue.claim(date)?;
        self.drive(entry.date, entry.state, token).await
    }

    async fn drive(
        &self,
        date: NaiveDate,
        from: PassState,
        token: ClaimToken,
    ) -> Result<PassOutcome> {
        let mut outcome = PassOutcome::new(date);
        match self.run_stages(date, from, token, &mut outcome).await {
            Ok(()) => {
                self.queue.complete(date, token)?;
                info!(%date, rows = outcome.rows_touched(), "processing pass finished");
                Ok(outcome)
            }
            Err(e) => {
                warn!(%date, error = %e, "processing pass failed");
                if let Err(release_err) = self.queue.release(date, token, Some(e.to_string())) {
                    warn!(%date, error = %release_err, "failed to release queue claim");
                }
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        date: NaiveDate,
        from: PassState,
        token: ClaimToken,
        outcome: &mut PassOutcome,
    ) -> Result<()> {
        if from < PassState::DailyComputed {
            info!(%date, "daily factor stage started");
            let ticks = self.tick_store.ticks_for_date(date).await?;
            let computation = compute_daily_factors(date, &ticks);
            for failure in &computation.failures {
                warn!(%date, error = %failure, "daily factor skipped");
            }
            outcome.skipped += computation.failures.len();
            outcome.daily = Some(self.reconciler.reconcile(&computation.updates()).await?);
            self.queue.advance(date, token, PassState::DailyComputed)?;
        }

        if from < PassState::WeeklyComputed {
            let (reconciled, skipped) = self.rolling_stage(date, token, FactorPeriod::Week).await?;
            outcome.weekly = Some(reconciled);
            outcome.skipped += skipped;
        }

        if from < PassState::MonthlyComputed {
            let (reconciled, skipped) =
                self.rolling_stage(date, token, FactorPeriod::Month).await?;
            outcome.monthly = Some(reconciled);
            outcome.skipped += skipped;
        }

        Ok(())
    }

    async fn rolling_stage(
        &self,
        date: NaiveDate,
        token: ClaimToken,
        period: FactorPeriod,
    ) -> Result<(ReconcileOutcome, usize)> {
        info!(%date, %period, "rolling factor stage started");
        let computation = self.windows.compute_for_date(date, period).await?;
        for failure in &computation.skipped {
            warn!(%date, %period, error = %failure, "rolling factor skipped");
        }
        let reconciled = self.reconciler.reconcile(&computation.updates).await?;
        let next = match period {
            FactorPeriod::Week => PassState::WeeklyComputed,
            FactorPeriod::Month => PassState::MonthlyComputed,
            FactorPeriod::Day => PassState::DailyComputed,
        };
        self.queue.advance(date, token, next)?;
        Ok((reconciled, computation.skipped.len()))
    }
}
