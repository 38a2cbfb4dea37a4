//! Shop Dashboard backend
//!
//! Product pricing and the inventory stock ledger, served over HTTP.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use crate::config::Config;

use crate::error::{AppError, AppResult};
use crate::external::{ChatCompletionClient, TextCompletion};
use crate::services::{AssistantService, ContextService, InventoryService, ProductService};
use crate::store::Stores;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub config: Arc<Config>,
    /// Absent when no assistant endpoint is configured
    pub assistant: Option<Arc<dyn TextCompletion>>,
}

impl AppState {
    /// Build state from configuration, creating the assistant client if configured
    pub fn new(stores: Stores, config: Config) -> AppResult<Self> {
        let assistant = match &config.assistant {
            Some(assistant_config) => Some(
                Arc::new(ChatCompletionClient::new(assistant_config)?) as Arc<dyn TextCompletion>
            ),
            None => None,
        };

        Ok(Self {
            stores,
            config: Arc::new(config),
            assistant,
        })
    }

    /// Replace the text-completion collaborator
    pub fn with_assistant(mut self, completion: Arc<dyn TextCompletion>) -> Self {
        self.assistant = Some(completion);
        self
    }

    pub fn inventory_service(&self) -> InventoryService {
        InventoryService::new(
            self.stores.inventory.clone(),
            self.config.ledger.negative_stock,
        )
    }

    pub fn product_service(&self) -> ProductService {
        ProductService::new(
            self.stores.products.clone(),
            self.config.pricing.default_hourly_rate,
        )
    }

    pub fn context_service(&self) -> ContextService {
        ContextService::new(
            self.stores.products.clone(),
            self.stores.inventory.clone(),
            self.config.context.default_margin_percent,
        )
    }

    pub fn assistant_service(&self) -> AppResult<AssistantService> {
        let completion = self
            .assistant
            .clone()
            .ok_or_else(|| AppError::Unavailable("Assistant is not configured".to_string()))?;
        Ok(AssistantService::new(
            self.context_service(),
            completion,
            self.config.pricing.currency.clone(),
        ))
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Shop Dashboard API v1"
}
