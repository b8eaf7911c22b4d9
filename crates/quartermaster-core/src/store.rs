//! Event store abstraction.
//!
//! The store is an append-only log per aggregate id and the single place where
//! optimistic concurrency is enforced.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Sequence number within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Version precondition for an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// The stream must not exist yet. Encoded as `-1` on the wire.
    NoStream,
    /// The stream's committed version must equal this value.
    Exact(i64),
}

impl ExpectedVersion {
    /// Wire value of [`ExpectedVersion::NoStream`].
    pub const NO_STREAM: i64 = -1;

    /// Decodes the wire representation where `-1` means "must not exist".
    #[must_use]
    pub fn from_raw(version: i64) -> Self {
        if version == Self::NO_STREAM {
            Self::NoStream
        } else {
            Self::Exact(version)
        }
    }

    /// Encodes this precondition for errors and logs.
    #[must_use]
    pub fn as_raw(self) -> i64 {
        match self {
            Self::NoStream => Self::NO_STREAM,
            Self::Exact(version) => version,
        }
    }

    /// Checks the precondition against the stream's committed version
    /// (`0` for a stream that does not exist).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if an exact positive version is expected
    /// but the stream is empty, and `DomainError::ConcurrencyConflict` on any
    /// other mismatch.
    pub fn check(self, aggregate_id: Uuid, current: i64) -> Result<(), DomainError> {
        match self {
            Self::NoStream if current == 0 => Ok(()),
            Self::Exact(expected) if expected == current => Ok(()),
            Self::Exact(expected) if expected > 0 && current == 0 => {
                Err(DomainError::NotFound(aggregate_id))
            }
            _ => Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: self.as_raw(),
                actual: current,
            }),
        }
    }
}

/// Validates a batch before it is appended on top of `current`.
///
/// Every event must belong to `aggregate_id` and the sequence numbers must
/// continue the stream without gaps. A batch built against a different base
/// version is reported as a concurrency conflict.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` for events of a foreign stream and
/// `DomainError::ConcurrencyConflict` for out-of-line sequence numbers.
pub fn check_batch(
    aggregate_id: Uuid,
    current: i64,
    events: &[StoredEvent],
) -> Result<(), DomainError> {
    let mut next = current + 1;
    for (index, event) in events.iter().enumerate() {
        if event.aggregate_id != aggregate_id {
            return Err(DomainError::Infrastructure(format!(
                "batch for {aggregate_id} contains event of {} at index {index}",
                event.aggregate_id
            )));
        }
        if event.sequence_number != next {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: event.sequence_number - 1 - i64::try_from(index).unwrap_or(i64::MAX),
                actual: current,
            });
        }
        next += 1;
    }
    Ok(())
}

/// Append-only event store keyed by aggregate id.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load all events for a given aggregate, ordered by sequence number.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the stream is empty.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    ///
    /// The version check and the append are one atomic step: either the whole
    /// batch lands or nothing does.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if `expected_version` does
    /// not match the committed version, or `DomainError::NotFound` if an
    /// existing stream was expected but none exists.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: &[StoredEvent],
    ) -> Result<(), DomainError>;
}
