//! Details projection: name, stock level and version per active item.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use quartermaster_core::error::DomainError;
use quartermaster_core::event::DomainEvent;
use quartermaster_inventory::domain::events::{InventoryItemEvent, InventoryItemEventKind};

use crate::dto::InventoryItemDetailsDto;
use crate::projection::{Projection, ProjectionOutcome, ProjectionStats};
use crate::store::InventoryDetailsStore;

/// Name of the details projection.
pub const DETAILS_PROJECTION: &str = "inventory_item_details";

/// Maintains [`InventoryDetailsStore`].
#[derive(Debug)]
pub struct InventoryItemDetailView {
    store: Arc<InventoryDetailsStore>,
    stats: ProjectionStats,
}

impl InventoryItemDetailView {
    /// Creates a view writing into `store`.
    #[must_use]
    pub fn new(store: Arc<InventoryDetailsStore>) -> Self {
        Self {
            store,
            stats: ProjectionStats::default(),
        }
    }

    /// The store this view writes into.
    #[must_use]
    pub fn store(&self) -> &Arc<InventoryDetailsStore> {
        &self.store
    }
}

fn row_mut(
    rows: &mut HashMap<Uuid, InventoryItemDetailsDto>,
    aggregate_id: Uuid,
) -> Result<&mut InventoryItemDetailsDto, DomainError> {
    rows.get_mut(&aggregate_id)
        .ok_or(DomainError::MissingReadModelEntry {
            projection: DETAILS_PROJECTION,
            aggregate_id,
        })
}

/// Accepts a recomputed stock level only if it stayed in `0..=i64::MAX`.
fn stock_level(row: &InventoryItemDetailsDto, next: Option<i64>) -> Result<i64, DomainError> {
    next.filter(|count| *count >= 0).ok_or_else(|| {
        DomainError::Infrastructure(format!(
            "{DETAILS_PROJECTION}: stock of {} out of range after change from {}",
            row.id, row.current_count
        ))
    })
}

#[async_trait]
impl Projection for InventoryItemDetailView {
    fn name(&self) -> &'static str {
        DETAILS_PROJECTION
    }

    fn stats(&self) -> &ProjectionStats {
        &self.stats
    }

    async fn process(&self, event: &InventoryItemEvent) -> Result<ProjectionOutcome, DomainError> {
        let aggregate_id = event.aggregate_id();
        let version = event.version();
        self.store
            .apply_once(aggregate_id, version, |rows| {
                match &event.kind {
                    InventoryItemEventKind::InventoryItemCreated(payload) => {
                        rows.insert(
                            aggregate_id,
                            InventoryItemDetailsDto {
                                id: aggregate_id,
                                name: payload.name.clone(),
                                current_count: 0,
                                version: 0,
                            },
                        );
                    }
                    InventoryItemEventKind::InventoryItemRenamed(payload) => {
                        let row = row_mut(rows, aggregate_id)?;
                        row.name.clone_from(&payload.new_name);
                        row.version = version;
                    }
                    InventoryItemEventKind::ItemsCheckedInToInventory(payload) => {
                        let row = row_mut(rows, aggregate_id)?;
                        row.current_count =
                            stock_level(row, row.current_count.checked_add(payload.count))?;
                        row.version = version;
                    }
                    InventoryItemEventKind::ItemsRemovedFromInventory(payload) => {
                        let row = row_mut(rows, aggregate_id)?;
                        row.current_count =
                            stock_level(row, row.current_count.checked_sub(payload.count))?;
                        row.version = version;
                    }
                    InventoryItemEventKind::InventoryItemDeactivated(_) => {
                        rows.remove(&aggregate_id).ok_or(
                            DomainError::MissingReadModelEntry {
                                projection: DETAILS_PROJECTION,
                                aggregate_id,
                            },
                        )?;
                    }
                }
                Ok(())
            })
            .await
    }
}
