//! Insert-vs-partial-update reconciliation into the factor store.

use std::collections::HashMap;
use std::sync::Arc;

use garua_store::FactorStore;
use garua_types::{DailyFactors, FactorKey, FactorUpdate};

use crate::Result;

/// Counts of rows touched by one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Keys that had no existing record and were inserted.
    pub inserted: usize,
    /// Keys whose existing record received a field-scoped update.
    pub updated: usize,
}

impl ReconcileOutcome {
    /// Returns the total number of rows touched.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Merges computed factor values into the store.
///
/// For keys without an existing record the full computed row is created; for
/// existing records only the fields carried by the batch's update commands
/// are overwritten, so values written by other passes survive. Reconciling
/// the same batch twice leaves the store in the same state as reconciling it
/// once.
#[derive(Debug)]
pub struct Reconciler<S> {
    store: Arc<S>,
}

impl<S> Reconciler<S> {
    /// Creates a reconciler writing to the given store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: FactorStore> Reconciler<S> {
    /// Reconciles a computed batch into the store.
    ///
    /// Existing rows for the batch's keys are looked up in one batched read
    /// to classify inserts against updates; each key's update commands are
    /// then applied in a single store write.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; the batch may then be partially
    /// applied and can be reconciled again safely.
    pub async fn reconcile(
        &self,
        batch: &[(FactorKey, Vec<FactorUpdate>)],
    ) -> Result<ReconcileOutcome> {
        let keys: Vec<FactorKey> = batch.iter().map(|(key, _)| key.clone()).collect();
        let existing: HashMap<FactorKey, DailyFactors> = self.store.get_many(&keys).await?;

        let mut outcome = ReconcileOutcome::default();
        for (key, updates) in batch {
            if updates.is_empty() {
                continue;
            }
            self.store.upsert(key, updates).await?;
            if existing.contains_key(key) {
                outcome.updated += 1;
            } else {
                outcome.inserted += 1;
            }
        }
        Ok(outcome)
    }
}
