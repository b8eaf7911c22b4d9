//! Process-local event store.
//!
//! Each stream sits behind its own async mutex, so the version check and the
//! append form one critical section per aggregate id while different ids never
//! wait on each other. The outer map lock is held only to find or insert a
//! stream handle.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use quartermaster_core::error::DomainError;
use quartermaster_core::store::{EventStore, ExpectedVersion, StoredEvent, check_batch};

type Stream = Arc<Mutex<Vec<StoredEvent>>>;

/// In-memory append-only event store.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<Uuid, Stream>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn existing_stream(&self, aggregate_id: Uuid) -> Result<Option<Stream>, DomainError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| DomainError::Infrastructure("event store lock poisoned".into()))?;
        Ok(streams.get(&aggregate_id).cloned())
    }

    fn stream_or_insert(&self, aggregate_id: Uuid) -> Result<Stream, DomainError> {
        if let Some(stream) = self.existing_stream(aggregate_id)? {
            return Ok(stream);
        }
        let mut streams = self
            .streams
            .write()
            .map_err(|_| DomainError::Infrastructure("event store lock poisoned".into()))?;
        Ok(Arc::clone(streams.entry(aggregate_id).or_default()))
    }

    /// Highest committed version of a stream, `0` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store lock is poisoned.
    pub async fn committed_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        match self.existing_stream(aggregate_id)? {
            Some(stream) => Ok(stream
                .lock()
                .await
                .last()
                .map_or(0, |event| event.sequence_number)),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[tracing::instrument(skip(self), err)]
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let Some(stream) = self.existing_stream(aggregate_id)? else {
            return Err(DomainError::NotFound(aggregate_id));
        };
        let events = stream.lock().await.clone();
        if events.is_empty() {
            return Err(DomainError::NotFound(aggregate_id));
        }
        tracing::trace!(event_count = events.len(), "loaded stream");
        Ok(events)
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

        // Reject appends to unknown streams before allocating one.
        if self.existing_stream(aggregate_id)?.is_none() {
            expected_version.check(aggregate_id, 0)?;
        }

        let stream = self.stream_or_insert(aggregate_id)?;
        let mut stream = stream.lock().await;
        let current = stream.last().map_or(0, |event| event.sequence_number);

        expected_version.check(aggregate_id, current)?;
        check_batch(aggregate_id, current, events)?;

        stream.extend_from_slice(events);
        tracing::debug!(
            version = current + i64::try_from(events.len()).unwrap_or(i64::MAX),
            "stream advanced"
        );
        Ok(())
    }
}
