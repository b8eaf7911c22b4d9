//! Routes for the Inventory Item context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use quartermaster_core::command::Command;
use quartermaster_inventory::application::command_handlers::{self, InventoryCommandResult};
use quartermaster_inventory::domain::commands::{
    CheckInItemsToInventory, CreateInventoryItem, DeactivateInventoryItem, InventoryCommand,
    RemoveItemsFromInventory, RenameInventoryItem,
};
use quartermaster_read_model::{InventoryItemDetailsDto, InventoryItemListDto};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /create.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// Id for the new item. Generated when absent.
    pub inventory_item_id: Option<Uuid>,
    /// Initial display name.
    pub name: String,
}

/// Request body for POST /deactivate.
#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    /// The item to deactivate.
    pub inventory_item_id: Uuid,
    /// Version the client last observed.
    pub original_version: i64,
}

/// Request body for POST /check-in and POST /remove.
#[derive(Debug, Deserialize)]
pub struct StockRequest {
    /// The item whose stock changes.
    pub inventory_item_id: Uuid,
    /// Units to add or remove.
    pub count: i64,
    /// Version the client last observed.
    pub original_version: i64,
}

/// Request body for POST /rename.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// The item to rename.
    pub inventory_item_id: Uuid,
    /// The new display name.
    pub new_name: String,
    /// Version the client last observed.
    pub original_version: i64,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The aggregate the command targeted.
    pub aggregate_id: Uuid,
    /// Version after the command; pass it as `original_version` next time.
    pub version: Option<i64>,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

impl From<InventoryCommandResult> for CommandResponse {
    fn from(result: InventoryCommandResult) -> Self {
        Self {
            aggregate_id: result.aggregate_id,
            version: result.new_version(),
            event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
        }
    }
}

async fn dispatch(
    state: &AppState,
    command: InventoryCommand,
) -> Result<Json<CommandResponse>, ApiError> {
    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        "handling command"
    );
    let result =
        command_handlers::handle_command(&command, state.clock.as_ref(), &state.repository)
            .await?;
    Ok(Json(result.into()))
}

/// POST /create
#[instrument(skip(state, request))]
async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = InventoryCommand::Create(CreateInventoryItem {
        correlation_id: Uuid::new_v4(),
        inventory_item_id: request.inventory_item_id.unwrap_or_else(Uuid::new_v4),
        name: request.name,
    });
    dispatch(&state, command).await
}

/// POST /deactivate
#[instrument(skip(state, request), fields(inventory_item_id = %request.inventory_item_id))]
async fn deactivate(
    State(state): State<AppState>,
    Json(request): Json<DeactivateRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = InventoryCommand::Deactivate(DeactivateInventoryItem {
        correlation_id: Uuid::new_v4(),
        inventory_item_id: request.inventory_item_id,
        original_version: request.original_version,
    });
    dispatch(&state, command).await
}

/// POST /check-in
#[instrument(skip(state, request), fields(inventory_item_id = %request.inventory_item_id))]
async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<StockRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = InventoryCommand::CheckIn(CheckInItemsToInventory {
        correlation_id: Uuid::new_v4(),
        inventory_item_id: request.inventory_item_id,
        count: request.count,
        original_version: request.original_version,
    });
    dispatch(&state, command).await
}

/// POST /remove
#[instrument(skip(state, request), fields(inventory_item_id = %request.inventory_item_id))]
async fn remove(
    State(state): State<AppState>,
    Json(request): Json<StockRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = InventoryCommand::Remove(RemoveItemsFromInventory {
        correlation_id: Uuid::new_v4(),
        inventory_item_id: request.inventory_item_id,
        count: request.count,
        original_version: request.original_version,
    });
    dispatch(&state, command).await
}

/// POST /rename
#[instrument(skip(state, request), fields(inventory_item_id = %request.inventory_item_id))]
async fn rename(
    State(state): State<AppState>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = InventoryCommand::Rename(RenameInventoryItem {
        correlation_id: Uuid::new_v4(),
        inventory_item_id: request.inventory_item_id,
        new_name: request.new_name,
        original_version: request.original_version,
    });
    dispatch(&state, command).await
}

/// GET /
async fn list_items(State(state): State<AppState>) -> Json<Vec<InventoryItemListDto>> {
    Json(state.read_model.get_inventory_items().await)
}

/// GET /{id}
async fn item_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItemDetailsDto>, ApiError> {
    Ok(Json(state.read_model.get_inventory_item_details(id).await?))
}

/// Returns the router for the inventory context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items))
        .route("/{id}", get(item_details))
        .route("/create", post(create))
        .route("/deactivate", post(deactivate))
        .route("/check-in", post(check_in))
        .route("/remove", post(remove))
        .route("/rename", post(rename))
}
