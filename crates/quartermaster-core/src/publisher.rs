//! Publication of committed event batches to subscribers.
//!
//! Publishing happens strictly after a successful append. Delivery is
//! at-least-once: subscribers must tolerate seeing a batch twice.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::DomainError;
use crate::store::StoredEvent;

/// A batch of events committed by a single save, in commit order.
pub type EventBatch = Arc<[StoredEvent]>;

/// Fan-out of committed batches. Must not block the writer.
pub trait EventPublisher: Send + Sync {
    /// Hands a committed batch to every subscriber.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the batch could not be handed
    /// off. The events are already committed when this is called.
    fn publish(&self, batch: &[StoredEvent]) -> Result<(), DomainError>;
}

impl<P> EventPublisher for Arc<P>
where
    P: EventPublisher + ?Sized,
{
    fn publish(&self, batch: &[StoredEvent]) -> Result<(), DomainError> {
        (**self).publish(batch)
    }
}

/// In-process pub/sub bus with one unbounded channel per subscriber.
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<EventBatch>>>,
}

impl InMemoryEventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber. It receives every batch published afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the subscriber list lock is
    /// poisoned.
    pub fn subscribe(&self, name: &'static str) -> Result<EventSubscription, DomainError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .map_err(|_| DomainError::Infrastructure("event bus lock poisoned".into()))?
            .push(tx);
        tracing::debug!(subscriber = name, "subscribed to event bus");
        Ok(EventSubscription { name, receiver: rx })
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map_or(0, |subs| subs.len())
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, batch: &[StoredEvent]) -> Result<(), DomainError> {
        if batch.is_empty() {
            return Ok(());
        }
        let batch: EventBatch = Arc::from(batch);
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| DomainError::Infrastructure("event bus lock poisoned".into()))?;

        // Drop subscribers whose receiving side has gone away.
        subs.retain(|tx| tx.send(Arc::clone(&batch)).is_ok());
        Ok(())
    }
}

/// Receiving side of a bus subscription.
#[derive(Debug)]
pub struct EventSubscription {
    name: &'static str,
    receiver: mpsc::UnboundedReceiver<EventBatch>,
}

impl EventSubscription {
    /// The subscriber name given at registration.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Waits for the next batch. Returns `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<EventBatch> {
        self.receiver.recv().await
    }

    /// Returns the next batch if one is already queued.
    pub fn try_recv(&mut self) -> Option<EventBatch> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn stored(sequence_number: i64) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: Uuid::nil(),
            event_type: "test.event".to_owned(),
            payload: serde_json::json!({}),
            sequence_number,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_batch_in_order() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let mut first = bus.subscribe("first").unwrap();
        let mut second = bus.subscribe("second").unwrap();

        // Act
        bus.publish(&[stored(1), stored(2)]).unwrap();

        // Assert
        for sub in [&mut first, &mut second] {
            let batch = sub.recv().await.unwrap();
            let versions: Vec<i64> = batch.iter().map(|e| e.sequence_number).collect();
            assert_eq!(versions, vec![1, 2]);
        }
    }

    #[test]
    fn test_dropped_subscriber_is_pruned_on_publish() {
        let bus = InMemoryEventBus::new();
        let kept = bus.subscribe("kept").unwrap();
        drop(bus.subscribe("dropped").unwrap());

        bus.publish(&[stored(1)]).unwrap();

        assert_eq!(bus.subscriber_count(), 1);
        drop(kept);
    }

    #[test]
    fn test_empty_batch_is_not_delivered() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe("sub").unwrap();

        bus.publish(&[]).unwrap();

        assert!(sub.try_recv().is_none());
    }
}
