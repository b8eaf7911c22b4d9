//! Test publisher — captures every published batch.

use std::sync::Mutex;

use quartermaster_core::error::DomainError;
use quartermaster_core::publisher::EventPublisher;
use quartermaster_core::store::StoredEvent;

/// An event publisher that records every batch handed to it and always
/// succeeds.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    batches: Mutex<Vec<Vec<StoredEvent>>>,
}

impl RecordingPublisher {
    /// Creates a publisher with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every published batch, in publication order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn batches(&self) -> Vec<Vec<StoredEvent>> {
        self.batches.lock().unwrap().clone()
    }

    /// Returns every published event flattened across batches.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<StoredEvent> {
        self.batches.lock().unwrap().concat()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, batch: &[StoredEvent]) -> Result<(), DomainError> {
        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(())
    }
}
