//! The projection contract and per-projection statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;

use quartermaster_core::error::DomainError;
use quartermaster_core::event::DomainEvent;
use quartermaster_core::store::StoredEvent;
use quartermaster_inventory::domain::events::InventoryItemEvent;

/// What a projection did with one delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionOutcome {
    /// The event changed (or was accepted by) the read model.
    Applied,
    /// The event had already been applied and was ignored.
    DuplicateSkipped,
}

/// Counters kept by every projection.
#[derive(Debug, Default)]
pub struct ProjectionStats {
    applied: AtomicU64,
    duplicates_skipped: AtomicU64,
    failures: AtomicU64,
    missing_entries: AtomicU64,
}

/// Point-in-time copy of [`ProjectionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionStatsSnapshot {
    /// Events applied.
    pub applied: u64,
    /// Redelivered events ignored.
    pub duplicates_skipped: u64,
    /// Events rejected for any reason other than a missing row.
    pub failures: u64,
    /// Events addressed to an aggregate with no row in the read model.
    pub missing_entries: u64,
}

impl ProjectionStats {
    /// Reads all counters.
    #[must_use]
    pub fn snapshot(&self) -> ProjectionStatsSnapshot {
        ProjectionStatsSnapshot {
            applied: self.applied.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            missing_entries: self.missing_entries.load(Ordering::Relaxed),
        }
    }

    fn record(&self, result: &Result<ProjectionOutcome, DomainError>) {
        let counter = match result {
            Ok(ProjectionOutcome::Applied) => &self.applied,
            Ok(ProjectionOutcome::DuplicateSkipped) => &self.duplicates_skipped,
            Err(DomainError::MissingReadModelEntry { .. }) => &self.missing_entries,
            Err(_) => &self.failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A read-model projection over inventory item events.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// This projection's counters.
    fn stats(&self) -> &ProjectionStats;

    /// Applies one decoded event. Must be idempotent per event version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingReadModelEntry` if the event targets a row
    /// the projection does not have.
    async fn process(&self, event: &InventoryItemEvent) -> Result<ProjectionOutcome, DomainError>;

    /// Decodes a committed event, applies it and records the outcome.
    ///
    /// Failures are logged here and returned; they never reach the writer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnexpectedEventType` if the event cannot be
    /// decoded as an inventory item event, or the error from `process`.
    async fn handle(&self, stored: &StoredEvent) -> Result<ProjectionOutcome, DomainError> {
        let result = match InventoryItemEvent::from_stored(stored) {
            Ok(event) => self.process(&event).await,
            Err(err) => Err(err),
        };
        self.stats().record(&result);

        match &result {
            Ok(outcome) => tracing::debug!(
                projection = self.name(),
                aggregate_id = %stored.aggregate_id,
                version = stored.sequence_number,
                ?outcome,
                "projected event"
            ),
            Err(err) => tracing::error!(
                projection = self.name(),
                aggregate_id = %stored.aggregate_id,
                version = stored.sequence_number,
                event_type = %stored.event_type,
                error = %err,
                "projection failed to apply event"
            ),
        }
        result
    }
}

