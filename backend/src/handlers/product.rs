//! HTTP handlers for the product catalogue

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::Product;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::ProductInput;
use crate::AppState;

pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let products = state
        .product_service()
        .list_products(current_user.0.business_id)
        .await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = state
        .product_service()
        .create_product(current_user.0.business_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = state
        .product_service()
        .get_product(current_user.0.business_id, product_id)
        .await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<Product>> {
    let product = state
        .product_service()
        .update_product(current_user.0.business_id, product_id, input)
        .await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .product_service()
        .delete_product(current_user.0.business_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
