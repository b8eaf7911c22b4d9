//! Background tasks feeding projections from the event bus.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::Instrument;

use quartermaster_core::error::DomainError;
use quartermaster_core::publisher::{EventSubscription, InMemoryEventBus};

use crate::details_view::InventoryItemDetailView;
use crate::facade::ReadModelFacade;
use crate::list_view::InventoryItemListView;
use crate::projection::Projection;
use crate::store::{InventoryDetailsStore, InventoryListStore};

/// Drives one projection from one subscription.
#[derive(Debug)]
pub struct ProjectionWorker;

impl ProjectionWorker {
    /// Spawns a task applying every delivered batch to `projection`, in order.
    ///
    /// A failing event is logged and counted by the projection and the worker
    /// moves on to the next one. The task ends when the bus is dropped.
    pub fn spawn<P>(projection: Arc<P>, mut subscription: EventSubscription) -> JoinHandle<()>
    where
        P: Projection + ?Sized + 'static,
    {
        let span = tracing::info_span!("projection_worker", projection = projection.name());
        tokio::spawn(
            async move {
                tracing::info!(subscriber = subscription.name(), "projection worker started");
                while let Some(batch) = subscription.recv().await {
                    for stored in batch.iter() {
                        // Already logged and counted by `handle`.
                        let _ = projection.handle(stored).await;
                    }
                }
                tracing::info!("event bus closed, projection worker stopping");
            }
            .instrument(span),
        )
    }
}

/// The two inventory projections wired to a bus.
#[derive(Debug)]
pub struct InventoryProjections {
    /// The list projection.
    pub list: Arc<InventoryItemListView>,
    /// The details projection.
    pub details: Arc<InventoryItemDetailView>,
    /// Worker tasks, one per projection.
    pub workers: Vec<JoinHandle<()>>,
}

impl InventoryProjections {
    /// Subscribes fresh list and details projections to `bus` and starts a
    /// worker for each. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the bus refuses a subscriber.
    pub fn spawn(bus: &InMemoryEventBus) -> Result<Self, DomainError> {
        let list = Arc::new(InventoryItemListView::new(Arc::new(
            InventoryListStore::new(),
        )));
        let details = Arc::new(InventoryItemDetailView::new(Arc::new(
            InventoryDetailsStore::new(),
        )));

        let workers = vec![
            ProjectionWorker::spawn(Arc::clone(&list), bus.subscribe(list.name())?),
            ProjectionWorker::spawn(Arc::clone(&details), bus.subscribe(details.name())?),
        ];

        Ok(Self {
            list,
            details,
            workers,
        })
    }

    /// A query facade over both projections' stores.
    #[must_use]
    pub fn facade(&self) -> ReadModelFacade {
        ReadModelFacade::new(
            Arc::clone(self.list.store()),
            Arc::clone(self.details.store()),
        )
    }
}
