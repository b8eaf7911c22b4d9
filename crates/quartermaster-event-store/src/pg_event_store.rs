//! `PostgreSQL` implementation of the `EventStore` trait.
//!
//! An append runs in one transaction: take a transaction-scoped advisory lock
//! on the stream, read its committed version, check the precondition, insert
//! the batch. The `(aggregate_id, sequence_number)` unique constraint backs
//! the check up against writers that bypass the lock.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use quartermaster_core::error::DomainError;
use quartermaster_core::store::{EventStore, ExpectedVersion, StoredEvent, check_batch};

use crate::schema;

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("{operation} failed: {err}"))
}

fn stored_event_from_row(row: &PgRow) -> Result<StoredEvent, sqlx::Error> {
    Ok(StoredEvent {
        event_id: row.try_get("event_id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        event_type: row.try_get("event_type")?,
        payload: row.try_get("payload")?,
        sequence_number: row.try_get("sequence_number")?,
        correlation_id: row.try_get("correlation_id")?,
        causation_id: row.try_get("causation_id")?,
        occurred_at: row.try_get("occurred_at")?,
    })
}

#[async_trait]
impl EventStore for PgEventStore {
    #[tracing::instrument(skip(self), err)]
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(schema::SELECT_STREAM)
            .bind(aggregate_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_events", e))?;

        if rows.is_empty() {
            return Err(DomainError::NotFound(aggregate_id));
        }

        rows.iter()
            .map(stored_event_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_event_row", e))
    }

    #[tracing::instrument(skip(self, events), fields(event_count = events.len()), err)]
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(schema::LOCK_STREAM)
            .bind(aggregate_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_stream", e))?;

        let current: i64 = sqlx::query_scalar(schema::SELECT_STREAM_VERSION)
            .bind(aggregate_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("select_stream_version", e))?;

        // Dropping `tx` on the error paths rolls the transaction back.
        expected_version.check(aggregate_id, current)?;
        check_batch(aggregate_id, current, events)?;

        for event in events {
            sqlx::query(schema::INSERT_EVENT)
                .bind(event.event_id)
                .bind(event.aggregate_id)
                .bind(&event.event_type)
                .bind(&event.payload)
                .bind(event.sequence_number)
                .bind(event.correlation_id)
                .bind(event.causation_id)
                .bind(event.occurred_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| match e {
                    sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                        DomainError::ConcurrencyConflict {
                            aggregate_id,
                            expected: expected_version.as_raw(),
                            actual: event.sequence_number,
                        }
                    }
                    other => map_sqlx_error("insert_event", other),
                })?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::debug!(
            version = current + i64::try_from(events.len()).unwrap_or(i64::MAX),
            "stream advanced"
        );
        Ok(())
    }
}
