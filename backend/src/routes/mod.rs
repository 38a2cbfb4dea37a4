//! Route definitions for the shop dashboard API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/pricing/preview", post(handlers::preview_pricing))
        .nest("/products", product_routes())
        .nest("/inventory", inventory_routes())
        .route("/context/snapshot", get(handlers::get_snapshot))
        .route("/assistant/chat", post(handlers::chat))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .merge(protected)
}

/// Product catalogue routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}

/// Inventory and stock ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/items/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/items/:item_id/adjust", post(handlers::adjust_stock))
        .route(
            "/items/:item_id/transactions",
            get(handlers::get_item_transactions),
        )
        .route(
            "/items/:item_id/transactions/export",
            get(handlers::export_item_transactions),
        )
        .route("/items/:item_id/reconcile", get(handlers::reconcile_item))
        .route("/bulk-adjust", post(handlers::bulk_adjust))
        .route("/low-stock", get(handlers::list_low_stock))
        .route("/transactions", get(handlers::list_transactions))
}
