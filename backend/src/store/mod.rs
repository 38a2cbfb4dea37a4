//! Persistence layer
//!
//! Services talk to storage through the [`InventoryStore`] and
//! [`ProductStore`] traits. Every call is scoped by business id; a row owned
//! by another business behaves as if it did not exist.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::pricing::ProductPricing;
use shared::{IngredientLine, InventoryItem, InventoryTransaction, Product, Unit};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Fields of a new inventory item, excluding its quantity
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub unit: Unit,
    pub cost_per_unit: Decimal,
    pub low_stock_alert: Option<Decimal>,
    pub batch_lot_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

/// Direct edits to an item. Quantity only moves through
/// [`InventoryStore::apply_adjustment`].
#[derive(Debug, Clone, Default)]
pub struct InventoryItemPatch {
    pub name: Option<String>,
    pub unit: Option<Unit>,
    pub cost_per_unit: Option<Decimal>,
    /// `Some(None)` clears the alert level
    pub low_stock_alert: Option<Option<Decimal>>,
    pub batch_lot_number: Option<Option<String>>,
    pub expiration_date: Option<Option<NaiveDate>>,
}

impl InventoryItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.unit.is_none()
            && self.cost_per_unit.is_none()
            && self.low_stock_alert.is_none()
            && self.batch_lot_number.is_none()
            && self.expiration_date.is_none()
    }

    /// Apply the patch to an in-memory copy of an item
    pub fn apply_to(&self, item: &mut InventoryItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(unit) = self.unit {
            item.unit = unit;
        }
        if let Some(cost) = self.cost_per_unit {
            item.cost_per_unit = cost;
        }
        if let Some(alert) = self.low_stock_alert {
            item.low_stock_alert = alert;
        }
        if let Some(batch) = &self.batch_lot_number {
            item.batch_lot_number = batch.clone();
        }
        if let Some(date) = self.expiration_date {
            item.expiration_date = date;
        }
    }
}

/// One stock movement to apply atomically
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub quantity_change: Decimal,
    pub notes: Option<String>,
    /// When false the store refuses changes that would end below zero
    pub allow_negative: bool,
}

/// Raw product inputs plus the pricing computed from them
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Vec<IngredientLine>,
    pub labor_minutes: Decimal,
    pub hourly_rate: Decimal,
    pub target_margin_percent: Decimal,
    pub pricing: ProductPricing,
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Round-trip check used by the health endpoint
    async fn ping(&self) -> AppResult<()>;

    /// Insert an item and its opening ledger entry in one transaction
    async fn insert_item_with_initial_stock(
        &self,
        business_id: Uuid,
        item: NewInventoryItem,
        initial_quantity: Decimal,
        notes: &str,
    ) -> AppResult<(InventoryItem, InventoryTransaction)>;

    async fn get_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>>;

    async fn list_items(&self, business_id: Uuid) -> AppResult<Vec<InventoryItem>>;

    /// Atomically add `quantity_change` to the stored quantity and append the
    /// matching ledger entry. Fails with `NotFound` or `InsufficientStock`.
    async fn apply_adjustment(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        adjustment: StockAdjustment,
    ) -> AppResult<(InventoryItem, InventoryTransaction)>;

    async fn update_item(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        patch: InventoryItemPatch,
    ) -> AppResult<Option<InventoryItem>>;

    /// Delete an item together with its ledger. Returns false if it did not exist.
    async fn delete_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<bool>;

    /// Ledger entries of one item in creation order
    async fn list_item_transactions(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Vec<InventoryTransaction>>;

    /// All ledger entries of a business, newest first
    async fn list_transactions(&self, business_id: Uuid) -> AppResult<Vec<InventoryTransaction>>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, business_id: Uuid, draft: ProductDraft) -> AppResult<Product>;

    async fn get_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<Option<Product>>;

    async fn list_products(&self, business_id: Uuid) -> AppResult<Vec<Product>>;

    async fn update_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        draft: ProductDraft,
    ) -> AppResult<Option<Product>>;

    async fn delete_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<bool>;
}

/// The store handles shared by all services
#[derive(Clone)]
pub struct Stores {
    pub inventory: Arc<dyn InventoryStore>,
    pub products: Arc<dyn ProductStore>,
}

impl Stores {
    /// Use one backend for both traits
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: InventoryStore + ProductStore + 'static,
    {
        Self {
            inventory: store.clone(),
            products: store,
        }
    }

    pub fn postgres(db: sqlx::PgPool) -> Self {
        Self::new(Arc::new(PgStore::new(db)))
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }
}
