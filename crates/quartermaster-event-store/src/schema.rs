//! SQL used by the PostgreSQL event store.
//!
//! The table itself is created by `migrations/`.

/// Serializes writers of one stream for the rest of the transaction.
pub const LOCK_STREAM: &str = "SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))";

/// Highest committed version of a stream (`0` when absent).
pub const SELECT_STREAM_VERSION: &str =
    "SELECT COALESCE(MAX(sequence_number), 0) FROM domain_events WHERE aggregate_id = $1";

/// Full stream in version order.
pub const SELECT_STREAM: &str = r"
SELECT event_id, aggregate_id, event_type, payload, sequence_number,
       correlation_id, causation_id, occurred_at
FROM domain_events
WHERE aggregate_id = $1
ORDER BY sequence_number ASC
";

/// Appends one event.
pub const INSERT_EVENT: &str = r"
INSERT INTO domain_events (
    event_id, aggregate_id, event_type, payload, sequence_number,
    correlation_id, causation_id, occurred_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
";
