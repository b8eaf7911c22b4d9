//! Read-model rows.

use serde::Serialize;
use uuid::Uuid;

/// One row of the inventory list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItemListDto {
    /// The inventory item identifier.
    pub id: Uuid,
    /// Current display name.
    pub name: String,
}

/// Detailed view of one inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItemDetailsDto {
    /// The inventory item identifier.
    pub id: Uuid,
    /// Current display name.
    pub name: String,
    /// Units on hand.
    pub current_count: i64,
    /// Version of the last event that changed this row. `0` right after
    /// creation.
    pub version: i64,
}
