//! Quartermaster — Inventory Item bounded context.
//!
//! Responsible for the event-sourced `InventoryItem` aggregate, the commands
//! that drive it, and the handlers that run the load → behave → save cycle.

pub mod application;
pub mod domain;
