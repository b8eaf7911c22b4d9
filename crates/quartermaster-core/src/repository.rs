//! Aggregate repository.
//!
//! Bridges aggregates and the event store: `load` replays a stream into a fresh
//! aggregate, `save` appends the aggregate's uncommitted events under a version
//! precondition and then publishes them.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::publisher::EventPublisher;
use crate::store::{EventStore, ExpectedVersion, StoredEvent};

/// Per-stream gates serializing commit + publish for one aggregate id.
#[derive(Debug, Default)]
struct StreamGates {
    gates: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl StreamGates {
    fn acquire(&self, aggregate_id: Uuid) -> Result<Arc<tokio::sync::Mutex<()>>, DomainError> {
        let mut gates = self
            .gates
            .lock()
            .map_err(|_| DomainError::Infrastructure("stream gate lock poisoned".into()))?;
        Ok(Arc::clone(gates.entry(aggregate_id).or_default()))
    }

    /// Forgets the gate once no other save holds or waits on it.
    fn release(&self, aggregate_id: Uuid, gate: Arc<tokio::sync::Mutex<()>>) {
        if let Ok(mut gates) = self.gates.lock() {
            // One reference in the map, one in `gate`.
            if Arc::strong_count(&gate) == 2 {
                gates.remove(&aggregate_id);
            }
        }
    }
}

/// Event-sourced repository for aggregates of type `A`.
pub struct Repository<A> {
    store: Arc<dyn EventStore>,
    publisher: Arc<dyn EventPublisher>,
    gates: StreamGates,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> fmt::Debug for Repository<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("gates", &self.gates)
            .finish_non_exhaustive()
    }
}

impl<A> Repository<A>
where
    A: AggregateRoot,
{
    /// Creates a repository over `store` that publishes to `publisher`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            publisher,
            gates: StreamGates::default(),
            _aggregate: PhantomData,
        }
    }

    /// Loads an aggregate by replaying its full stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the stream is empty, or the decode
    /// error of the first stored event that cannot be read back.
    #[tracing::instrument(skip(self), err)]
    pub async fn load(&self, aggregate_id: Uuid) -> Result<A, DomainError> {
        let stored = self.store.load_events(aggregate_id).await?;
        if stored.is_empty() {
            return Err(DomainError::NotFound(aggregate_id));
        }

        let mut aggregate = A::empty(aggregate_id);
        for record in &stored {
            let event = A::Event::from_stored(record)?;
            aggregate.apply(&event);
        }

        tracing::debug!(version = aggregate.version(), "aggregate reconstituted");
        Ok(aggregate)
    }

    /// Appends the aggregate's uncommitted events and publishes them.
    ///
    /// Nothing is written unless `expected_version` matches the committed
    /// version at the moment of the append. On success the uncommitted events
    /// are cleared and the committed batch is returned. A publication failure
    /// is logged and does not fail the save.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` on a version mismatch, plus
    /// any error raised by the store. The aggregate is left untouched.
    #[tracing::instrument(
        skip(self, aggregate),
        fields(aggregate_id = %aggregate.aggregate_id(), expected = expected_version.as_raw()),
        err
    )]
    pub async fn save(
        &self,
        aggregate: &mut A,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let aggregate_id = aggregate.aggregate_id();
        if aggregate.uncommitted_events().is_empty() {
            return Ok(Vec::new());
        }

        let batch: Vec<StoredEvent> = aggregate
            .uncommitted_events()
            .iter()
            .map(DomainEvent::to_stored)
            .collect();

        let gate = self.gates.acquire(aggregate_id)?;
        let guard = gate.lock().await;

        // Step 1: commit.
        if let Err(err) = self
            .store
            .append_events(aggregate_id, expected_version, &batch)
            .await
        {
            drop(guard);
            self.gates.release(aggregate_id, gate);
            return Err(err);
        }
        aggregate.clear_uncommitted_events();
        tracing::info!(
            version = aggregate.version(),
            event_count = batch.len(),
            "events committed"
        );

        // Step 2: publish, still inside the gate so batches leave in commit order.
        if let Err(err) = self.publisher.publish(&batch) {
            tracing::warn!(error = %err, "failed to publish committed events");
        }

        drop(guard);
        self.gates.release(aggregate_id, gate);
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::event::EventMetadata;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Incremented {
        by: i64,
    }

    #[derive(Debug, Clone)]
    struct CounterEvent {
        metadata: EventMetadata,
        payload: Incremented,
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            "counter.incremented"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::to_value(&self.payload).unwrap()
        }

        fn metadata(&self) -> &EventMetadata {
            &self.metadata
        }

        fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
            if stored.event_type != "counter.incremented" {
                return Err(DomainError::UnexpectedEventType {
                    expected: "counter.incremented",
                    actual: stored.event_type.clone(),
                });
            }
            let payload = serde_json::from_value(stored.payload.clone())
                .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
            Ok(Self {
                metadata: EventMetadata::from_stored(stored),
                payload,
            })
        }
    }

    #[derive(Debug)]
    struct Counter {
        id: Uuid,
        total: i64,
        version: i64,
        uncommitted: Vec<CounterEvent>,
    }

    impl Counter {
        fn increment(&mut self, by: i64) {
            let event = CounterEvent {
                metadata: EventMetadata {
                    event_id: Uuid::new_v4(),
                    event_type: "counter.incremented".to_owned(),
                    aggregate_id: self.id,
                    sequence_number: self.version + 1,
                    correlation_id: Uuid::nil(),
                    causation_id: Uuid::nil(),
                    occurred_at: Utc::now(),
                },
                payload: Incremented { by },
            };
            self.apply(&event);
            self.uncommitted.push(event);
        }
    }

    impl AggregateRoot for Counter {
        type Event = CounterEvent;

        fn empty(id: Uuid) -> Self {
            Self {
                id,
                total: 0,
                version: 0,
                uncommitted: Vec::new(),
            }
        }

        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn apply(&mut self, event: &Self::Event) {
            self.total += event.payload.by;
            self.version += 1;
        }

        fn uncommitted_events(&self) -> &[Self::Event] {
            &self.uncommitted
        }

        fn clear_uncommitted_events(&mut self) {
            self.uncommitted.clear();
        }
    }

    #[derive(Debug, Default)]
    struct VecStore {
        events: StdMutex<Vec<StoredEvent>>,
    }

    #[async_trait]
    impl EventStore for VecStore {
        async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
            let events = self.events.lock().unwrap().clone();
            if events.is_empty() {
                return Err(DomainError::NotFound(aggregate_id));
            }
            Ok(events)
        }

        async fn append_events(
            &self,
            aggregate_id: Uuid,
            expected_version: ExpectedVersion,
            events: &[StoredEvent],
        ) -> Result<(), DomainError> {
            let mut stream = self.events.lock().unwrap();
            #[allow(clippy::cast_possible_wrap)]
            let current = stream.len() as i64;
            expected_version.check(aggregate_id, current)?;
            crate::store::check_batch(aggregate_id, current, events)?;
            stream.extend_from_slice(events);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct CapturingPublisher {
        batches: StdMutex<Vec<Vec<StoredEvent>>>,
    }

    impl EventPublisher for CapturingPublisher {
        fn publish(&self, batch: &[StoredEvent]) -> Result<(), DomainError> {
            self.batches.lock().unwrap().push(batch.to_vec());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct BrokenPublisher;

    impl EventPublisher for BrokenPublisher {
        fn publish(&self, _batch: &[StoredEvent]) -> Result<(), DomainError> {
            Err(DomainError::Infrastructure("bus down".into()))
        }
    }

    fn repository(
        store: Arc<VecStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Repository<Counter> {
        Repository::new(store, publisher)
    }

    #[tokio::test]
    async fn test_save_appends_clears_and_publishes_in_order() {
        // Arrange
        let store = Arc::new(VecStore::default());
        let publisher = Arc::new(CapturingPublisher::default());
        let repo = repository(Arc::clone(&store), publisher.clone());
        let mut counter = Counter::empty(Uuid::new_v4());
        counter.increment(2);
        counter.increment(3);

        // Act
        let committed = repo
            .save(&mut counter, ExpectedVersion::NoStream)
            .await
            .unwrap();

        // Assert
        assert_eq!(committed.len(), 2);
        assert!(counter.uncommitted_events().is_empty());
        assert_eq!(counter.version(), 2);
        let batches = publisher.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        let versions: Vec<i64> = batches[0].iter().map(|e| e.sequence_number).collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_load_replays_stream_to_latest_version() {
        let store = Arc::new(VecStore::default());
        let repo = repository(Arc::clone(&store), Arc::new(CapturingPublisher::default()));
        let id = Uuid::new_v4();
        let mut counter = Counter::empty(id);
        counter.increment(4);
        counter.increment(6);
        repo.save(&mut counter, ExpectedVersion::NoStream)
            .await
            .unwrap();

        let loaded = repo.load(id).await.unwrap();

        assert_eq!(loaded.version(), 2);
        assert_eq!(loaded.committed_version(), 2);
        assert_eq!(loaded.total, 10);
    }

    #[tokio::test]
    async fn test_load_missing_stream_is_not_found() {
        let repo = repository(
            Arc::new(VecStore::default()),
            Arc::new(CapturingPublisher::default()),
        );
        let id = Uuid::new_v4();

        let result = repo.load(id).await;

        assert!(matches!(result, Err(DomainError::NotFound(found)) if found == id));
    }

    #[tokio::test]
    async fn test_stale_save_keeps_uncommitted_events_and_publishes_nothing() {
        // Arrange
        let store = Arc::new(VecStore::default());
        let publisher = Arc::new(CapturingPublisher::default());
        let repo = repository(Arc::clone(&store), publisher.clone());
        let id = Uuid::new_v4();
        let mut counter = Counter::empty(id);
        counter.increment(1);
        repo.save(&mut counter, ExpectedVersion::NoStream)
            .await
            .unwrap();
        let mut stale = repo.load(id).await.unwrap();
        counter.increment(1);
        repo.save(&mut counter, ExpectedVersion::Exact(1))
            .await
            .unwrap();

        // Act
        stale.increment(5);
        let result = repo.save(&mut stale, ExpectedVersion::Exact(1)).await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        assert_eq!(stale.uncommitted_events().len(), 1);
        assert_eq!(store.events.lock().unwrap().len(), 2);
        assert_eq!(publisher.batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_without_changes_is_noop() {
        let store = Arc::new(VecStore::default());
        let publisher = Arc::new(CapturingPublisher::default());
        let repo = repository(Arc::clone(&store), publisher.clone());
        let mut counter = Counter::empty(Uuid::new_v4());

        let committed = repo
            .save(&mut counter, ExpectedVersion::NoStream)
            .await
            .unwrap();

        assert!(committed.is_empty());
        assert!(publisher.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_committed_save() {
        let store = Arc::new(VecStore::default());
        let repo = repository(Arc::clone(&store), Arc::new(BrokenPublisher));
        let mut counter = Counter::empty(Uuid::new_v4());
        counter.increment(1);

        let result = repo.save(&mut counter, ExpectedVersion::NoStream).await;

        assert!(result.is_ok());
        assert_eq!(store.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gates_are_released_after_save() {
        let repo = repository(
            Arc::new(VecStore::default()),
            Arc::new(CapturingPublisher::default()),
        );
        let mut counter = Counter::empty(Uuid::new_v4());
        counter.increment(1);

        repo.save(&mut counter, ExpectedVersion::NoStream)
            .await
            .unwrap();

        assert!(repo.gates.gates.lock().unwrap().is_empty());
    }
}
