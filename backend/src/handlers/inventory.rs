//! HTTP handlers for inventory management endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use shared::{InventoryItem, InventoryTransaction, LedgerReconciliation};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    AdjustStockInput, BulkAdjustInput, BulkAdjustReport, CreateItemInput, StockMovement,
    UpdateItemInput,
};
use crate::AppState;

/// List all inventory items for the business
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let items = state
        .inventory_service()
        .list_items(current_user.0.business_id)
        .await?;
    Ok(Json(items))
}

/// Create an item with its initial stock entry
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<StockMovement>)> {
    let (item, transaction) = state
        .inventory_service()
        .create_item(current_user.0.business_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(StockMovement { item, transaction })))
}

pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    let item = state
        .inventory_service()
        .get_item(current_user.0.business_id, item_id)
        .await?;
    Ok(Json(item))
}

/// Edit descriptive fields of an item
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<InventoryItem>> {
    let item = state
        .inventory_service()
        .update_item(current_user.0.business_id, item_id, input)
        .await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .inventory_service()
        .delete_item(current_user.0.business_id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Adjust an item's stock by a signed amount
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<StockMovement>> {
    let movement = state
        .inventory_service()
        .adjust_stock(current_user.0.business_id, item_id, input)
        .await?;
    Ok(Json(movement))
}

/// Adjust several items; partial failure is reported in the body
pub async fn bulk_adjust(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkAdjustInput>,
) -> AppResult<Json<BulkAdjustReport>> {
    let report = state
        .inventory_service()
        .bulk_adjust(current_user.0.business_id, input)
        .await?;
    Ok(Json(report))
}

/// Get the ledger of one item
pub async fn get_item_transactions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryTransaction>>> {
    let transactions = state
        .inventory_service()
        .get_transactions(current_user.0.business_id, item_id)
        .await?;
    Ok(Json(transactions))
}

/// Download the ledger of one item as CSV
pub async fn export_item_transactions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let csv = state
        .inventory_service()
        .export_transactions_csv(current_user.0.business_id, item_id)
        .await?;
    let disposition = format!("attachment; filename=\"transactions-{}.csv\"", item_id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Replay an item's ledger against its stored quantity
pub async fn reconcile_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<LedgerReconciliation>> {
    let report = state
        .inventory_service()
        .reconcile(current_user.0.business_id, item_id)
        .await?;
    Ok(Json(report))
}

/// Items at or below their low-stock alert
pub async fn list_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let items = state
        .inventory_service()
        .low_stock(current_user.0.business_id)
        .await?;
    Ok(Json(items))
}

/// List all transactions for the business
pub async fn list_transactions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryTransaction>>> {
    let transactions = state
        .inventory_service()
        .list_transactions(current_user.0.business_id)
        .await?;
    Ok(Json(transactions))
}
