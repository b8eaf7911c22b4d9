//! Quartermaster API — HTTP surface over the inventory command handlers and
//! read model.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Builds the application router (without transport layers).
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/inventory", routes::inventory::router())
        .with_state(state)
}
