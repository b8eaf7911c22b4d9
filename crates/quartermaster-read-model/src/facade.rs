//! Query surface over the inventory projections.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use quartermaster_core::error::DomainError;

use crate::dto::{InventoryItemDetailsDto, InventoryItemListDto};
use crate::store::{InventoryDetailsStore, InventoryListStore};

/// Read-only access to the inventory read model. Results are copies.
#[async_trait]
pub trait ReadModel: Send + Sync {
    /// All active inventory items, in creation order.
    async fn get_inventory_items(&self) -> Vec<InventoryItemListDto>;

    /// Details of one inventory item.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the projection has no row for `id`,
    /// either because the item was deactivated or because its creation has
    /// not been projected yet.
    async fn get_inventory_item_details(
        &self,
        id: Uuid,
    ) -> Result<InventoryItemDetailsDto, DomainError>;
}

/// [`ReadModel`] backed by the in-process projection stores.
#[derive(Debug, Clone)]
pub struct ReadModelFacade {
    list: Arc<InventoryListStore>,
    details: Arc<InventoryDetailsStore>,
}

impl ReadModelFacade {
    /// Creates a facade reading from the given stores.
    #[must_use]
    pub fn new(list: Arc<InventoryListStore>, details: Arc<InventoryDetailsStore>) -> Self {
        Self { list, details }
    }
}

#[async_trait]
impl ReadModel for ReadModelFacade {
    async fn get_inventory_items(&self) -> Vec<InventoryItemListDto> {
        self.list.read(Vec::clone).await
    }

    async fn get_inventory_item_details(
        &self,
        id: Uuid,
    ) -> Result<InventoryItemDetailsDto, DomainError> {
        self.details
            .read(|rows| rows.get(&id).cloned())
            .await
            .ok_or(DomainError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionOutcome;

    fn facade() -> (ReadModelFacade, Arc<InventoryListStore>, Arc<InventoryDetailsStore>) {
        let list = Arc::new(InventoryListStore::new());
        let details = Arc::new(InventoryDetailsStore::new());
        (
            ReadModelFacade::new(list.clone(), details.clone()),
            list,
            details,
        )
    }

    #[tokio::test]
    async fn test_get_inventory_items_returns_a_copy() {
        // Arrange
        let (facade, list, _) = facade();
        let id = Uuid::new_v4();
        list.apply_once(id, 1, |rows| {
            rows.push(InventoryItemListDto {
                id,
                name: "Widget".to_owned(),
            });
            Ok(())
        })
        .await
        .unwrap();

        // Act
        let mut items = facade.get_inventory_items().await;
        items[0].name = "Mutated".to_owned();
        items.clear();

        // Assert
        let fresh = facade.get_inventory_items().await;
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].name, "Widget");
    }

    #[tokio::test]
    async fn test_get_inventory_item_details_for_unknown_id_is_not_found() {
        let (facade, _, _) = facade();
        let id = Uuid::new_v4();

        let result = facade.get_inventory_item_details(id).await;

        assert!(matches!(result, Err(DomainError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_get_inventory_item_details_returns_row() {
        let (facade, _, details) = facade();
        let id = Uuid::new_v4();
        let row = InventoryItemDetailsDto {
            id,
            name: "Widget".to_owned(),
            current_count: 7,
            version: 3,
        };
        let inserted = row.clone();
        let outcome = details
            .apply_once(id, 3, move |rows| {
                rows.insert(id, inserted);
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(outcome, ProjectionOutcome::Applied);

        let fetched = facade.get_inventory_item_details(id).await.unwrap();

        assert_eq!(fetched, row);
    }
}
