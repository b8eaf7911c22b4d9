//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate stream or read-model entry was not found.
    #[error("not found: {0}")]
    NotFound(Uuid),

    /// Optimistic concurrency conflict. `expected` is `-1` when the caller
    /// required the stream not to exist.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A business rule rejected the operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// An argument was outside its allowed range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An event was routed to a handler that does not understand it.
    #[error("unexpected event type: expected {expected}, got {actual}")]
    UnexpectedEventType {
        /// What the handler accepts.
        expected: &'static str,
        /// What it was given.
        actual: String,
    },

    /// A projection received an event for an aggregate it has no row for.
    #[error("projection {projection} has no entry for aggregate {aggregate_id}")]
    MissingReadModelEntry {
        /// The projection that saw the event.
        projection: &'static str,
        /// The aggregate the event belongs to.
        aggregate_id: Uuid,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
