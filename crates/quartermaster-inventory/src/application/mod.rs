//! Application services.

pub mod command_handlers;
