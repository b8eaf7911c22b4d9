//! Domain events for the Inventory Item context.

use quartermaster_core::error::DomainError;
use quartermaster_core::event::{DomainEvent, EventMetadata};
use quartermaster_core::store::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type name for `InventoryItemCreated`.
pub const INVENTORY_ITEM_CREATED_EVENT_TYPE: &str = "inventory_item.created";
/// Event type name for `InventoryItemDeactivated`.
pub const INVENTORY_ITEM_DEACTIVATED_EVENT_TYPE: &str = "inventory_item.deactivated";
/// Event type name for `ItemsCheckedInToInventory`.
pub const ITEMS_CHECKED_IN_EVENT_TYPE: &str = "inventory_item.checked_in";
/// Event type name for `ItemsRemovedFromInventory`.
pub const ITEMS_REMOVED_EVENT_TYPE: &str = "inventory_item.removed";
/// Event type name for `InventoryItemRenamed`.
pub const INVENTORY_ITEM_RENAMED_EVENT_TYPE: &str = "inventory_item.renamed";

/// Emitted when an inventory item is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemCreated {
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
    /// Initial display name.
    pub name: String,
}

/// Emitted when an inventory item is deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemDeactivated {
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
}

/// Emitted when stock is checked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsCheckedInToInventory {
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
    /// Number of units added. Always positive.
    pub count: i64,
}

/// Emitted when stock is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsRemovedFromInventory {
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
    /// Number of units removed. Always positive.
    pub count: i64,
}

/// Emitted when an inventory item is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemRenamed {
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
    /// The new display name.
    pub new_name: String,
}

/// Event payload variants for the Inventory Item context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryItemEventKind {
    /// The item has been created.
    InventoryItemCreated(InventoryItemCreated),
    /// The item has been deactivated.
    InventoryItemDeactivated(InventoryItemDeactivated),
    /// Units have been checked in.
    ItemsCheckedInToInventory(ItemsCheckedInToInventory),
    /// Units have been removed.
    ItemsRemovedFromInventory(ItemsRemovedFromInventory),
    /// The item has been renamed.
    InventoryItemRenamed(InventoryItemRenamed),
}

impl InventoryItemEventKind {
    /// The stored type name of this variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::InventoryItemCreated(_) => INVENTORY_ITEM_CREATED_EVENT_TYPE,
            Self::InventoryItemDeactivated(_) => INVENTORY_ITEM_DEACTIVATED_EVENT_TYPE,
            Self::ItemsCheckedInToInventory(_) => ITEMS_CHECKED_IN_EVENT_TYPE,
            Self::ItemsRemovedFromInventory(_) => ITEMS_REMOVED_EVENT_TYPE,
            Self::InventoryItemRenamed(_) => INVENTORY_ITEM_RENAMED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Inventory Item context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItemEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: InventoryItemEventKind,
}

impl DomainEvent for InventoryItemEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind)
            .expect("InventoryItemEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        let kind: InventoryItemEventKind = serde_json::from_value(stored.payload.clone())
            .map_err(|_| DomainError::UnexpectedEventType {
                expected: "inventory_item.*",
                actual: stored.event_type.clone(),
            })?;

        if kind.event_type() != stored.event_type {
            return Err(DomainError::UnexpectedEventType {
                expected: kind.event_type(),
                actual: stored.event_type.clone(),
            });
        }

        Ok(Self {
            metadata: EventMetadata::from_stored(stored),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn stored(event_type: &str, payload: serde_json::Value) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: Uuid::new_v4(),
            event_type: event_type.to_owned(),
            payload,
            sequence_number: 1,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_from_stored_decodes_matching_type_and_payload() {
        // Arrange
        let kind = InventoryItemEventKind::ItemsCheckedInToInventory(ItemsCheckedInToInventory {
            inventory_item_id: Uuid::new_v4(),
            count: 10,
        });
        let record = stored(
            ITEMS_CHECKED_IN_EVENT_TYPE,
            serde_json::to_value(&kind).unwrap(),
        );

        // Act
        let event = InventoryItemEvent::from_stored(&record).unwrap();

        // Assert
        assert_eq!(event.kind, kind);
        assert_eq!(event.metadata, EventMetadata::from_stored(&record));
        assert_eq!(event.to_stored(), record);
    }

    #[test]
    fn test_from_stored_rejects_type_that_disagrees_with_payload() {
        let kind = InventoryItemEventKind::InventoryItemRenamed(InventoryItemRenamed {
            inventory_item_id: Uuid::new_v4(),
            new_name: "Gadget".to_owned(),
        });
        let record = stored(
            INVENTORY_ITEM_CREATED_EVENT_TYPE,
            serde_json::to_value(&kind).unwrap(),
        );

        let result = InventoryItemEvent::from_stored(&record);

        match result {
            Err(DomainError::UnexpectedEventType { expected, actual }) => {
                assert_eq!(expected, INVENTORY_ITEM_RENAMED_EVENT_TYPE);
                assert_eq!(actual, INVENTORY_ITEM_CREATED_EVENT_TYPE);
            }
            other => panic!("expected UnexpectedEventType, got {other:?}"),
        }
    }

    #[test]
    fn test_from_stored_rejects_foreign_event() {
        let record = stored(
            "character.created",
            serde_json::json!({ "CharacterCreated": { "name": "Aria" } }),
        );

        let result = InventoryItemEvent::from_stored(&record);

        assert!(matches!(
            result,
            Err(DomainError::UnexpectedEventType { actual, .. }) if actual == "character.created"
        ));
    }
}
