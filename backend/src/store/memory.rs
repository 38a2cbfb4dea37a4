//! Process-local store
//!
//! All state sits behind one mutex, so each trait call is atomic with
//! respect to every other call, which mirrors a single database transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::{InventoryItem, InventoryTransaction, Product, TransactionType};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    InventoryItemPatch, InventoryStore, NewInventoryItem, ProductDraft, ProductStore,
    StockAdjustment,
};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct MemoryState {
    items: HashMap<Uuid, InventoryItem>,
    /// Append-only, in creation order
    transactions: Vec<InventoryTransaction>,
    products: HashMap<Uuid, Product>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned<'a>(
    items: &'a mut HashMap<Uuid, InventoryItem>,
    business_id: Uuid,
    item_id: Uuid,
) -> Option<&'a mut InventoryItem> {
    items
        .get_mut(&item_id)
        .filter(|item| item.business_id == business_id)
}

#[async_trait]
impl InventoryStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn insert_item_with_initial_stock(
        &self,
        business_id: Uuid,
        item: NewInventoryItem,
        initial_quantity: Decimal,
        notes: &str,
    ) -> AppResult<(InventoryItem, InventoryTransaction)> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let item = InventoryItem {
            id: Uuid::new_v4(),
            business_id,
            name: item.name,
            unit: item.unit,
            current_quantity: initial_quantity,
            cost_per_unit: item.cost_per_unit,
            low_stock_alert: item.low_stock_alert,
            batch_lot_number: item.batch_lot_number,
            expiration_date: item.expiration_date,
            created_at: now,
            updated_at: now,
        };
        let transaction = InventoryTransaction {
            id: Uuid::new_v4(),
            business_id,
            inventory_id: item.id,
            transaction_type: TransactionType::Add,
            quantity_change: initial_quantity,
            resulting_quantity: initial_quantity,
            notes: Some(notes.to_string()),
            created_at: now,
        };

        state.items.insert(item.id, item.clone());
        state.transactions.push(transaction.clone());
        Ok((item, transaction))
    }

    async fn get_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .get(&item_id)
            .filter(|item| item.business_id == business_id)
            .cloned())
    }

    async fn list_items(&self, business_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        let state = self.state.lock().await;
        let mut items: Vec<InventoryItem> = state
            .items
            .values()
            .filter(|item| item.business_id == business_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(items)
    }

    async fn apply_adjustment(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        adjustment: StockAdjustment,
    ) -> AppResult<(InventoryItem, InventoryTransaction)> {
        let mut state = self.state.lock().await;

        let item = owned(&mut state.items, business_id, item_id)
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        let new_quantity = item
            .current_quantity
            .checked_add(adjustment.quantity_change)
            .ok_or_else(|| {
                AppError::validation("quantity_change", "Resulting quantity is out of range")
            })?;
        if !adjustment.allow_negative && new_quantity < Decimal::ZERO {
            return Err(AppError::InsufficientStock {
                available: item.current_quantity,
                requested: adjustment.quantity_change,
            });
        }

        let now = Utc::now();
        item.current_quantity = new_quantity;
        item.updated_at = now;
        let item = item.clone();

        let transaction = InventoryTransaction {
            id: Uuid::new_v4(),
            business_id,
            inventory_id: item_id,
            transaction_type: TransactionType::from_change(adjustment.quantity_change),
            quantity_change: adjustment.quantity_change,
            resulting_quantity: new_quantity,
            notes: adjustment.notes,
            created_at: now,
        };
        state.transactions.push(transaction.clone());

        Ok((item, transaction))
    }

    async fn update_item(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        patch: InventoryItemPatch,
    ) -> AppResult<Option<InventoryItem>> {
        let mut state = self.state.lock().await;
        Ok(owned(&mut state.items, business_id, item_id).map(|item| {
            patch.apply_to(item);
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn delete_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if owned(&mut state.items, business_id, item_id).is_none() {
            return Ok(false);
        }
        state.items.remove(&item_id);
        state.transactions.retain(|t| t.inventory_id != item_id);
        Ok(true)
    }

    async fn list_item_transactions(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Vec<InventoryTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .filter(|t| t.inventory_id == item_id && t.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn list_transactions(&self, business_id: Uuid) -> AppResult<Vec<InventoryTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.business_id == business_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, business_id: Uuid, draft: ProductDraft) -> AppResult<Product> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            business_id,
            name: draft.name,
            description: draft.description,
            ingredients: draft.ingredients,
            labor_minutes: draft.labor_minutes,
            hourly_rate: draft.hourly_rate,
            target_margin_percent: draft.target_margin_percent,
            total_cost: draft.pricing.total_cost,
            selling_price: draft.pricing.selling_price,
            profit_margin_percent: draft.pricing.profit_margin,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .get(&product_id)
            .filter(|p| p.business_id == business_id)
            .cloned())
    }

    async fn list_products(&self, business_id: Uuid) -> AppResult<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.business_id == business_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(products)
    }

    async fn update_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        draft: ProductDraft,
    ) -> AppResult<Option<Product>> {
        let mut state = self.state.lock().await;
        let Some(product) = state
            .products
            .get_mut(&product_id)
            .filter(|p| p.business_id == business_id)
        else {
            return Ok(None);
        };

        product.name = draft.name;
        product.description = draft.description;
        product.ingredients = draft.ingredients;
        product.labor_minutes = draft.labor_minutes;
        product.hourly_rate = draft.hourly_rate;
        product.target_margin_percent = draft.target_margin_percent;
        product.total_cost = draft.pricing.total_cost;
        product.selling_price = draft.pricing.selling_price;
        product.profit_margin_percent = draft.pricing.profit_margin;
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let owned = state
            .products
            .get(&product_id)
            .is_some_and(|p| p.business_id == business_id);
        if owned {
            state.products.remove(&product_id);
        }
        Ok(owned)
    }
}
