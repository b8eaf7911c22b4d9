//! Commands for the Inventory Item context.

use quartermaster_core::command::Command;
use uuid::Uuid;

/// Command to create an inventory item.
#[derive(Debug, Clone)]
pub struct CreateInventoryItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The identifier the new item will have.
    pub inventory_item_id: Uuid,
    /// Initial display name.
    pub name: String,
}

/// Command to deactivate an inventory item.
#[derive(Debug, Clone)]
pub struct DeactivateInventoryItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
    /// Version the caller last observed.
    pub original_version: i64,
}

/// Command to check units into an inventory item.
#[derive(Debug, Clone)]
pub struct CheckInItemsToInventory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
    /// Units to add.
    pub count: i64,
    /// Version the caller last observed.
    pub original_version: i64,
}

/// Command to remove units from an inventory item.
#[derive(Debug, Clone)]
pub struct RemoveItemsFromInventory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
    /// Units to remove.
    pub count: i64,
    /// Version the caller last observed.
    pub original_version: i64,
}

/// Command to rename an inventory item.
#[derive(Debug, Clone)]
pub struct RenameInventoryItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory item identifier.
    pub inventory_item_id: Uuid,
    /// The new display name.
    pub new_name: String,
    /// Version the caller last observed.
    pub original_version: i64,
}

/// The closed set of commands accepted by the Inventory Item context.
#[derive(Debug, Clone)]
pub enum InventoryCommand {
    /// See [`CreateInventoryItem`].
    Create(CreateInventoryItem),
    /// See [`DeactivateInventoryItem`].
    Deactivate(DeactivateInventoryItem),
    /// See [`CheckInItemsToInventory`].
    CheckIn(CheckInItemsToInventory),
    /// See [`RemoveItemsFromInventory`].
    Remove(RemoveItemsFromInventory),
    /// See [`RenameInventoryItem`].
    Rename(RenameInventoryItem),
}

impl Command for InventoryCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::Create(_) => "inventory.create_inventory_item",
            Self::Deactivate(_) => "inventory.deactivate_inventory_item",
            Self::CheckIn(_) => "inventory.check_in_items_to_inventory",
            Self::Remove(_) => "inventory.remove_items_from_inventory",
            Self::Rename(_) => "inventory.rename_inventory_item",
        }
    }

    fn correlation_id(&self) -> Uuid {
        match self {
            Self::Create(c) => c.correlation_id,
            Self::Deactivate(c) => c.correlation_id,
            Self::CheckIn(c) => c.correlation_id,
            Self::Remove(c) => c.correlation_id,
            Self::Rename(c) => c.correlation_id,
        }
    }

    fn aggregate_id(&self) -> Uuid {
        match self {
            Self::Create(c) => c.inventory_item_id,
            Self::Deactivate(c) => c.inventory_item_id,
            Self::CheckIn(c) => c.inventory_item_id,
            Self::Remove(c) => c.inventory_item_id,
            Self::Rename(c) => c.inventory_item_id,
        }
    }
}
