//! Business context aggregator

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::BusinessSnapshot;
use uuid::Uuid;

use crate::store::{InventoryStore, ProductStore};

/// Builds the read-only snapshot consumed by the dashboard and the assistant
#[derive(Clone)]
pub struct ContextService {
    products: Arc<dyn ProductStore>,
    inventory: Arc<dyn InventoryStore>,
    default_margin: Decimal,
}

impl ContextService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        inventory: Arc<dyn InventoryStore>,
        default_margin: Decimal,
    ) -> Self {
        Self {
            products,
            inventory,
            default_margin,
        }
    }

    /// Aggregate the business's products and stock.
    ///
    /// Never fails: a failed read zeroes its own figures and is flagged in
    /// the snapshot, the other dimension is still reported.
    pub async fn get_snapshot(&self, business_id: Uuid) -> BusinessSnapshot {
        let (products, items) = tokio::join!(
            self.products.list_products(business_id),
            self.inventory.list_items(business_id),
        );

        let products = match products {
            Ok(products) => Some(products),
            Err(e) => {
                tracing::warn!(business_id = %business_id, error = %e, "Product read failed; snapshot degraded");
                None
            }
        };
        let items = match items {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!(business_id = %business_id, error = %e, "Inventory read failed; snapshot degraded");
                None
            }
        };

        BusinessSnapshot::aggregate(products.as_deref(), items.as_deref(), self.default_margin)
    }
}
