//! Quartermaster — inventory read model.
//!
//! Two independent projections (a list view and a details view) fed from
//! committed event batches, each behind its own lock, and a query facade over
//! both. The read side is eventually consistent with the write side.

pub mod details_view;
pub mod dto;
pub mod facade;
pub mod list_view;
pub mod projection;
pub mod store;
pub mod worker;

pub use details_view::InventoryItemDetailView;
pub use dto::{InventoryItemDetailsDto, InventoryItemListDto};
pub use facade::{ReadModel, ReadModelFacade};
pub use list_view::InventoryItemListView;
pub use projection::{Projection, ProjectionOutcome, ProjectionStats, ProjectionStatsSnapshot};
pub use store::{InventoryDetailsStore, InventoryListStore, ProjectionStore};
pub use worker::{InventoryProjections, ProjectionWorker};
