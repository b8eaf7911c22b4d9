//! List projection: one `{id, name}` row per active inventory item.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use quartermaster_core::error::DomainError;
use quartermaster_core::event::DomainEvent;
use quartermaster_inventory::domain::events::{
    InventoryItemCreated, InventoryItemEvent, InventoryItemEventKind, InventoryItemRenamed,
};

use crate::dto::InventoryItemListDto;
use crate::projection::{Projection, ProjectionOutcome, ProjectionStats};
use crate::store::InventoryListStore;

/// Name of the list projection.
pub const LIST_PROJECTION: &str = "inventory_item_list";

/// Maintains [`InventoryListStore`].
#[derive(Debug)]
pub struct InventoryItemListView {
    store: Arc<InventoryListStore>,
    stats: ProjectionStats,
}

impl InventoryItemListView {
    /// Creates a view writing into `store`.
    #[must_use]
    pub fn new(store: Arc<InventoryListStore>) -> Self {
        Self {
            store,
            stats: ProjectionStats::default(),
        }
    }

    /// The store this view writes into.
    #[must_use]
    pub fn store(&self) -> &Arc<InventoryListStore> {
        &self.store
    }
}

fn missing(aggregate_id: Uuid) -> DomainError {
    DomainError::MissingReadModelEntry {
        projection: LIST_PROJECTION,
        aggregate_id,
    }
}

fn on_created(rows: &mut Vec<InventoryItemListDto>, payload: &InventoryItemCreated) {
    let id = payload.inventory_item_id;
    match rows.iter_mut().find(|row| row.id == id) {
        Some(row) => row.name.clone_from(&payload.name),
        None => rows.push(InventoryItemListDto {
            id,
            name: payload.name.clone(),
        }),
    }
}

fn on_renamed(
    rows: &mut [InventoryItemListDto],
    aggregate_id: Uuid,
    payload: &InventoryItemRenamed,
) -> Result<(), DomainError> {
    let row = rows
        .iter_mut()
        .find(|row| row.id == aggregate_id)
        .ok_or_else(|| missing(aggregate_id))?;
    row.name.clone_from(&payload.new_name);
    Ok(())
}

fn on_deactivated(
    rows: &mut Vec<InventoryItemListDto>,
    aggregate_id: Uuid,
) -> Result<(), DomainError> {
    let index = rows
        .iter()
        .position(|row| row.id == aggregate_id)
        .ok_or_else(|| missing(aggregate_id))?;
    rows.remove(index);
    Ok(())
}

#[async_trait]
impl Projection for InventoryItemListView {
    fn name(&self) -> &'static str {
        LIST_PROJECTION
    }

    fn stats(&self) -> &ProjectionStats {
        &self.stats
    }

    async fn process(&self, event: &InventoryItemEvent) -> Result<ProjectionOutcome, DomainError> {
        let aggregate_id = event.aggregate_id();
        self.store
            .apply_once(aggregate_id, event.version(), |rows| match &event.kind {
                InventoryItemEventKind::InventoryItemCreated(payload) => {
                    on_created(rows, payload);
                    Ok(())
                }
                InventoryItemEventKind::InventoryItemRenamed(payload) => {
                    on_renamed(rows, aggregate_id, payload)
                }
                InventoryItemEventKind::InventoryItemDeactivated(_) => {
                    on_deactivated(rows, aggregate_id)
                }
                // Stock levels are not part of the list.
                InventoryItemEventKind::ItemsCheckedInToInventory(_)
                | InventoryItemEventKind::ItemsRemovedFromInventory(_) => Ok(()),
            })
            .await
    }
}
