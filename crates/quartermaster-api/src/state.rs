//! Shared application state.

use std::fmt;
use std::sync::Arc;

use quartermaster_core::clock::Clock;
use quartermaster_core::repository::Repository;
use quartermaster_inventory::domain::aggregates::InventoryItem;
use quartermaster_read_model::ReadModel;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Write side: load and save inventory items.
    pub repository: Arc<Repository<InventoryItem>>,
    /// Read side: projected inventory views.
    pub read_model: Arc<dyn ReadModel>,
    /// Time source stamped on raised events.
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        repository: Arc<Repository<InventoryItem>>,
        read_model: Arc<dyn ReadModel>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            read_model,
            clock,
        }
    }
}
