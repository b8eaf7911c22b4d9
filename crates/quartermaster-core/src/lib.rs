//! Quartermaster Core — event-sourcing abstractions.
//!
//! This crate defines the aggregate, event, event-store and publication
//! contracts plus the generic [`repository::Repository`] that enforces the
//! optimistic-concurrency save/load protocol. It contains no storage engine.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod publisher;
pub mod repository;
pub mod store;
