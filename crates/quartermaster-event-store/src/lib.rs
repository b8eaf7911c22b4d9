//! Quartermaster event stores.
//!
//! Two interchangeable implementations of
//! [`quartermaster_core::store::EventStore`]: a process-local store for tests
//! and single-node deployments, and a PostgreSQL-backed store.

pub mod in_memory;
pub mod pg_event_store;
pub mod schema;

pub use in_memory::InMemoryEventStore;
pub use pg_event_store::PgEventStore;
