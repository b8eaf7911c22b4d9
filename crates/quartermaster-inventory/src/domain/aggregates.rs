//! Aggregate roots for the Inventory Item context.

use quartermaster_core::aggregate::AggregateRoot;
use quartermaster_core::clock::Clock;
use quartermaster_core::error::DomainError;
use quartermaster_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    InventoryItemCreated, InventoryItemDeactivated, InventoryItemEvent, InventoryItemEventKind,
    InventoryItemRenamed, ItemsCheckedInToInventory, ItemsRemovedFromInventory,
};

/// The aggregate root for a stocked inventory item.
#[derive(Debug, Clone)]
pub struct InventoryItem {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current display name. Empty until created.
    name: String,
    /// False once deactivated; never true again.
    active: bool,
    /// Units on hand. Never negative.
    current_count: i64,
    /// Current version (event count, uncommitted included).
    version: i64,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<InventoryItemEvent>,
}

impl InventoryItem {
    /// Creates a fresh, never-created inventory item.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            active: false,
            current_count: 0,
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    /// Current display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the item is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Units currently on hand.
    #[must_use]
    pub fn current_count(&self) -> i64 {
        self.current_count
    }

    fn ensure_created(&self) -> Result<(), DomainError> {
        if self.version == 0 {
            return Err(DomainError::InvalidOperation(format!(
                "inventory item {} has not been created",
                self.id
            )));
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        self.ensure_created()?;
        if !self.active {
            return Err(DomainError::InvalidOperation(format!(
                "inventory item {} is deactivated",
                self.id
            )));
        }
        Ok(())
    }

    /// Applies `kind` immediately, queues it for persistence and bumps the
    /// version.
    fn raise(&mut self, kind: InventoryItemEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        // TODO: event_id uses Uuid::new_v4() so replayed commands mint new ids;
        // thread an id generator through alongside the clock to fix this.
        let event = InventoryItemEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.version + 1,
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };

        self.apply(&event);
        self.uncommitted_events.push(event);
    }

    /// Creates the item, producing an `InventoryItemCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidOperation` if the item already has history
    /// or `name` is blank.
    pub fn create(
        &mut self,
        name: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.version != 0 {
            return Err(DomainError::InvalidOperation(format!(
                "inventory item {} already exists",
                self.id
            )));
        }
        if name.trim().is_empty() {
            return Err(DomainError::InvalidOperation(
                "inventory item name must not be empty".into(),
            ));
        }

        self.raise(
            InventoryItemEventKind::InventoryItemCreated(InventoryItemCreated {
                inventory_item_id: self.id,
                name: name.to_owned(),
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Deactivates the item, producing an `InventoryItemDeactivated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidOperation` if the item does not exist or
    /// is already inactive.
    pub fn deactivate(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_created()?;
        if !self.active {
            return Err(DomainError::InvalidOperation(format!(
                "inventory item {} is already deactivated",
                self.id
            )));
        }

        self.raise(
            InventoryItemEventKind::InventoryItemDeactivated(InventoryItemDeactivated {
                inventory_item_id: self.id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Checks `count` units in, producing an `ItemsCheckedInToInventory` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` if `count <= 0` or the new
    /// stock level would not fit in an `i64`, and
    /// `DomainError::InvalidOperation` if the item does not exist or is
    /// inactive.
    pub fn check_in(
        &mut self,
        count: i64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if count <= 0 {
            return Err(DomainError::InvalidArgument(format!(
                "check-in count must be positive, got {count}"
            )));
        }
        self.ensure_active()?;
        if self.current_count.checked_add(count).is_none() {
            return Err(DomainError::InvalidArgument(format!(
                "cannot check in {count} to inventory item {}: {} already on hand",
                self.id, self.current_count
            )));
        }

        self.raise(
            InventoryItemEventKind::ItemsCheckedInToInventory(ItemsCheckedInToInventory {
                inventory_item_id: self.id,
                count,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Removes `count` units, producing an `ItemsRemovedFromInventory` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` if `count <= 0`, and
    /// `DomainError::InvalidOperation` if the item does not exist, is
    /// inactive, or holds fewer than `count` units.
    pub fn remove(
        &mut self,
        count: i64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if count <= 0 {
            return Err(DomainError::InvalidArgument(format!(
                "remove count must be positive, got {count}"
            )));
        }
        self.ensure_active()?;
        if self.current_count < count {
            return Err(DomainError::InvalidOperation(format!(
                "cannot remove {count} from inventory item {}: only {} on hand",
                self.id, self.current_count
            )));
        }

        self.raise(
            InventoryItemEventKind::ItemsRemovedFromInventory(ItemsRemovedFromInventory {
                inventory_item_id: self.id,
                count,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Renames the item, producing an `InventoryItemRenamed` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidOperation` if `new_name` is blank or the
    /// item does not exist or is inactive.
    pub fn rename(
        &mut self,
        new_name: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if new_name.trim().is_empty() {
            return Err(DomainError::InvalidOperation(
                "inventory item name must not be empty".into(),
            ));
        }
        self.ensure_active()?;

        self.raise(
            InventoryItemEventKind::InventoryItemRenamed(InventoryItemRenamed {
                inventory_item_id: self.id,
                new_name: new_name.to_owned(),
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }
}

impl AggregateRoot for InventoryItem {
    type Event = InventoryItemEvent;

    fn empty(id: Uuid) -> Self {
        Self::new(id)
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            InventoryItemEventKind::InventoryItemCreated(payload) => {
                self.name.clone_from(&payload.name);
                self.active = true;
            }
            InventoryItemEventKind::InventoryItemDeactivated(_) => {
                self.active = false;
            }
            InventoryItemEventKind::ItemsCheckedInToInventory(payload) => {
                self.current_count = self.current_count.saturating_add(payload.count);
            }
            InventoryItemEventKind::ItemsRemovedFromInventory(payload) => {
                self.current_count = self.current_count.saturating_sub(payload.count);
            }
            InventoryItemEventKind::InventoryItemRenamed(payload) => {
                self.name.clone_from(&payload.new_name);
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
