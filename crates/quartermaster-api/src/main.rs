//! Quartermaster API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use quartermaster_api::config::ApiConfig;
use quartermaster_api::error::AppError;
use quartermaster_api::state::AppState;
use quartermaster_api::{app, telemetry};
use quartermaster_core::clock::SystemClock;
use quartermaster_core::publisher::InMemoryEventBus;
use quartermaster_core::repository::Repository;
use quartermaster_core::store::EventStore;
use quartermaster_event_store::{InMemoryEventStore, PgEventStore};
use quartermaster_read_model::worker::InventoryProjections;

async fn event_store(config: &ApiConfig) -> Result<Arc<dyn EventStore>, AppError> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, events are kept in memory only");
        return Ok(Arc::new(InMemoryEventStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("connected to PostgreSQL event store");
    Ok(Arc::new(PgEventStore::new(pool)))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    telemetry::init();
    tracing::info!("Starting Quartermaster API server");

    let config = ApiConfig::from_env()?;
    let store = event_store(&config).await?;

    // Read side first, so no committed batch is published before the
    // projections subscribe.
    let bus = Arc::new(InMemoryEventBus::new());
    let projections = InventoryProjections::spawn(&bus)?;

    let app_state = AppState::new(
        Arc::new(Repository::new(store, bus)),
        Arc::new(projections.facade()),
        Arc::new(SystemClock),
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
