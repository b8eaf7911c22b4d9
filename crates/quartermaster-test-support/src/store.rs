//! Test event stores — mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use quartermaster_core::error::DomainError;
use quartermaster_core::store::{EventStore, ExpectedVersion, StoredEvent};
use uuid::Uuid;

/// An appended batch as seen by [`RecordingEventStore`].
pub type AppendCall = (Uuid, ExpectedVersion, Vec<StoredEvent>);

/// An event store that replays a fixed history from every `load_events` call
/// and records every `append_events` call without enforcing versions.
#[derive(Debug)]
pub struct RecordingEventStore {
    history: Vec<StoredEvent>,
    appended: Mutex<Vec<AppendCall>>,
}

impl RecordingEventStore {
    /// Create a store whose `load_events` returns `history`. An empty history
    /// reports the stream as not found.
    #[must_use]
    pub fn new(history: Vec<StoredEvent>) -> Self {
        Self {
            history,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all append calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<AppendCall> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        if self.history.is_empty() {
            return Err(DomainError::NotFound(aggregate_id));
        }
        Ok(self.history.clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: ExpectedVersion,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// An event store with no streams that silently accepts appends. Useful for
/// testing "aggregate not found" scenarios and creation commands.
#[derive(Debug)]
pub struct EmptyEventStore;

#[async_trait]
impl EventStore for EmptyEventStore {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::NotFound(aggregate_id))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: ExpectedVersion,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: ExpectedVersion,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
