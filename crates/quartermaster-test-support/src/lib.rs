//! Shared test doubles and utilities for the Quartermaster inventory service.

mod clock;
mod publisher;
mod store;

pub use clock::{FixedClock, fixed_now};
pub use publisher::RecordingPublisher;
pub use store::{AppendCall, EmptyEventStore, FailingEventStore, RecordingEventStore};
