//! Command handlers for the Inventory Item context.
//!
//! Each handler runs one load → behave → save cycle against the repository.
//! Conflicts are returned to the caller as-is; retrying means reloading and
//! re-running the command, which only the caller can decide to do.

use quartermaster_core::clock::Clock;
use quartermaster_core::error::DomainError;
use quartermaster_core::repository::Repository;
use quartermaster_core::store::{ExpectedVersion, StoredEvent};
use uuid::Uuid;

use crate::domain::aggregates::InventoryItem;
use crate::domain::commands::{
    CheckInItemsToInventory, CreateInventoryItem, DeactivateInventoryItem, InventoryCommand,
    RemoveItemsFromInventory, RenameInventoryItem,
};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct InventoryCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

impl InventoryCommandResult {
    /// Version of the aggregate after the command, if it produced events.
    #[must_use]
    pub fn new_version(&self) -> Option<i64> {
        self.stored_events.last().map(|e| e.sequence_number)
    }
}

/// Handles `CreateInventoryItem`: raises the creation event on a fresh
/// aggregate and saves it with `ExpectedVersion::NoStream`.
///
/// # Errors
///
/// Returns `DomainError::InvalidOperation` if the name is blank or a stream
/// with this id already exists, plus any store error.
#[tracing::instrument(skip(clock, repo), fields(inventory_item_id = %command.inventory_item_id))]
pub async fn handle_create_inventory_item(
    command: &CreateInventoryItem,
    clock: &dyn Clock,
    repo: &Repository<InventoryItem>,
) -> Result<InventoryCommandResult, DomainError> {
    let mut item = InventoryItem::new(command.inventory_item_id);
    item.create(&command.name, command.correlation_id, clock)?;

    let stored_events = repo
        .save(&mut item, ExpectedVersion::NoStream)
        .await
        .map_err(|err| match err {
            DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: ExpectedVersion::NO_STREAM,
                ..
            } => DomainError::InvalidOperation(format!(
                "inventory item {aggregate_id} already exists"
            )),
            other => other,
        })?;

    Ok(InventoryCommandResult {
        aggregate_id: command.inventory_item_id,
        stored_events,
    })
}

/// Handles `DeactivateInventoryItem`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the item has no history,
/// `DomainError::InvalidOperation` if it is already inactive, and
/// `DomainError::ConcurrencyConflict` if `original_version` is stale.
#[tracing::instrument(skip(clock, repo), fields(inventory_item_id = %command.inventory_item_id))]
pub async fn handle_deactivate_inventory_item(
    command: &DeactivateInventoryItem,
    clock: &dyn Clock,
    repo: &Repository<InventoryItem>,
) -> Result<InventoryCommandResult, DomainError> {
    let mut item = repo.load(command.inventory_item_id).await?;
    item.deactivate(command.correlation_id, clock)?;
    save(repo, &mut item, command.original_version).await
}

/// Handles `CheckInItemsToInventory`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the item has no history,
/// `DomainError::InvalidArgument` for a non-positive count,
/// `DomainError::InvalidOperation` if the item is inactive, and
/// `DomainError::ConcurrencyConflict` if `original_version` is stale.
#[tracing::instrument(skip(clock, repo), fields(inventory_item_id = %command.inventory_item_id))]
pub async fn handle_check_in_items(
    command: &CheckInItemsToInventory,
    clock: &dyn Clock,
    repo: &Repository<InventoryItem>,
) -> Result<InventoryCommandResult, DomainError> {
    let mut item = repo.load(command.inventory_item_id).await?;
    item.check_in(command.count, command.correlation_id, clock)?;
    save(repo, &mut item, command.original_version).await
}

/// Handles `RemoveItemsFromInventory`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the item has no history,
/// `DomainError::InvalidArgument` for a non-positive count,
/// `DomainError::InvalidOperation` if the item is inactive or would go
/// negative, and `DomainError::ConcurrencyConflict` if `original_version` is
/// stale.
#[tracing::instrument(skip(clock, repo), fields(inventory_item_id = %command.inventory_item_id))]
pub async fn handle_remove_items(
    command: &RemoveItemsFromInventory,
    clock: &dyn Clock,
    repo: &Repository<InventoryItem>,
) -> Result<InventoryCommandResult, DomainError> {
    let mut item = repo.load(command.inventory_item_id).await?;
    item.remove(command.count, command.correlation_id, clock)?;
    save(repo, &mut item, command.original_version).await
}

/// Handles `RenameInventoryItem`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the item has no history,
/// `DomainError::InvalidOperation` for a blank name or an inactive item, and
/// `DomainError::ConcurrencyConflict` if `original_version` is stale.
#[tracing::instrument(skip(clock, repo), fields(inventory_item_id = %command.inventory_item_id))]
pub async fn handle_rename_inventory_item(
    command: &RenameInventoryItem,
    clock: &dyn Clock,
    repo: &Repository<InventoryItem>,
) -> Result<InventoryCommandResult, DomainError> {
    let mut item = repo.load(command.inventory_item_id).await?;
    item.rename(&command.new_name, command.correlation_id, clock)?;
    save(repo, &mut item, command.original_version).await
}

/// Routes a command to its handler.
///
/// # Errors
///
/// Returns whatever the selected handler returns.
pub async fn handle_command(
    command: &InventoryCommand,
    clock: &dyn Clock,
    repo: &Repository<InventoryItem>,
) -> Result<InventoryCommandResult, DomainError> {
    match command {
        InventoryCommand::Create(c) => handle_create_inventory_item(c, clock, repo).await,
        InventoryCommand::Deactivate(c) => handle_deactivate_inventory_item(c, clock, repo).await,
        InventoryCommand::CheckIn(c) => handle_check_in_items(c, clock, repo).await,
        InventoryCommand::Remove(c) => handle_remove_items(c, clock, repo).await,
        InventoryCommand::Rename(c) => handle_rename_inventory_item(c, clock, repo).await,
    }
}

async fn save(
    repo: &Repository<InventoryItem>,
    item: &mut InventoryItem,
    original_version: i64,
) -> Result<InventoryCommandResult, DomainError> {
    let stored_events = repo
        .save(item, ExpectedVersion::Exact(original_version))
        .await?;
    Ok(InventoryCommandResult {
        aggregate_id: item.id,
        stored_events,
    })
}
