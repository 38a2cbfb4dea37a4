//! Product catalogue service
//!
//! Derived pricing figures are never accepted from clients; they are
//! recomputed from the submitted recipe on every write.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{pricing, validation, IngredientLine, Product};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::{ProductDraft, ProductStore};

/// Product service for managing the catalogue
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    default_hourly_rate: Decimal,
}

/// Input for creating or replacing a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
    #[serde(default)]
    pub labor_minutes: Decimal,
    /// Falls back to the configured default rate
    pub hourly_rate: Option<Decimal>,
    pub target_margin_percent: Decimal,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(store: Arc<dyn ProductStore>, default_hourly_rate: Decimal) -> Self {
        Self {
            store,
            default_hourly_rate,
        }
    }

    fn draft(&self, input: ProductInput) -> AppResult<ProductDraft> {
        input.validate()?;
        validation::validate_name(&input.name)
            .map_err(|m| AppError::validation("name", m))?;
        validation::validate_ingredients(&input.ingredients)
            .map_err(|(idx, m)| AppError::validation(format!("ingredients[{}]", idx), m))?;
        validation::validate_non_negative(input.labor_minutes)
            .map_err(|m| AppError::validation("labor_minutes", m))?;

        let hourly_rate = input.hourly_rate.unwrap_or(self.default_hourly_rate);
        validation::validate_non_negative(hourly_rate)
            .map_err(|m| AppError::validation("hourly_rate", m))?;

        let ingredients: Vec<IngredientLine> = input
            .ingredients
            .into_iter()
            .map(|mut line| {
                line.name = line.name.trim().to_string();
                line
            })
            .collect();

        // Out-of-range margins are priced the same way the live preview prices them
        let target_margin_percent = pricing::clamp_target_margin(input.target_margin_percent);
        let pricing = pricing::compute_product(
            &ingredients,
            input.labor_minutes,
            hourly_rate,
            target_margin_percent,
        );

        Ok(ProductDraft {
            name: input.name.trim().to_string(),
            description: input
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ingredients,
            labor_minutes: input.labor_minutes,
            hourly_rate,
            target_margin_percent,
            pricing,
        })
    }

    pub async fn create_product(&self, business_id: Uuid, input: ProductInput) -> AppResult<Product> {
        let draft = self.draft(input)?;
        let product = self.store.insert_product(business_id, draft).await?;
        tracing::info!(
            product_id = %product.id,
            price = %product.selling_price,
            "Created product"
        );
        Ok(product)
    }

    pub async fn get_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<Product> {
        self.store
            .get_product(business_id, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn list_products(&self, business_id: Uuid) -> AppResult<Vec<Product>> {
        self.store.list_products(business_id).await
    }

    /// Replace a product's recipe and recompute its pricing
    pub async fn update_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        input: ProductInput,
    ) -> AppResult<Product> {
        let draft = self.draft(input)?;
        let product = self
            .store
            .update_product(business_id, product_id, draft)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        tracing::info!(
            product_id = %product.id,
            price = %product.selling_price,
            "Updated product"
        );
        Ok(product)
    }

    pub async fn delete_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<()> {
        if !self.store.delete_product(business_id, product_id).await? {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }
}
