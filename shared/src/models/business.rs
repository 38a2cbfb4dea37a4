//! Business context snapshot used by the dashboard and the assistant

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{InventoryItem, Product};
use crate::pricing::round_money;

/// Read-only aggregate of a business's catalogue and stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessSnapshot {
    pub total_products: usize,
    pub total_inventory_items: usize,
    pub low_stock_items: usize,
    pub avg_margin_percent: Decimal,
    pub inventory_value: Decimal,
    /// False when the product read failed and product figures are defaults
    pub products_available: bool,
    /// False when the inventory read failed and inventory figures are zeros
    pub inventory_available: bool,
}

impl BusinessSnapshot {
    /// Build a snapshot from whatever reads succeeded.
    ///
    /// `None` means the corresponding read failed; that dimension falls back
    /// to zeros (and `default_margin` for the average margin).
    pub fn aggregate(
        products: Option<&[Product]>,
        items: Option<&[InventoryItem]>,
        default_margin: Decimal,
    ) -> Self {
        let (total_products, avg_margin_percent) = match products {
            Some(products) => (products.len(), average_margin(products, default_margin)),
            None => (0, default_margin),
        };

        let (total_inventory_items, low_stock_items, inventory_value) = match items {
            Some(items) => (
                items.len(),
                items.iter().filter(|i| i.is_low_stock()).count(),
                items
                    .iter()
                    .map(InventoryItem::stock_value)
                    .fold(Decimal::ZERO, Decimal::saturating_add),
            ),
            None => (0, 0, Decimal::ZERO),
        };

        Self {
            total_products,
            total_inventory_items,
            low_stock_items,
            avg_margin_percent,
            inventory_value: round_money(inventory_value),
            products_available: products.is_some(),
            inventory_available: items.is_some(),
        }
    }
}

/// Arithmetic mean of the stored margins, or `default_margin` when empty
pub fn average_margin(products: &[Product], default_margin: Decimal) -> Decimal {
    if products.is_empty() {
        return default_margin;
    }
    let sum = products
        .iter()
        .map(|p| p.profit_margin_percent)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    sum.checked_div(Decimal::from(products.len() as u64))
        .map(round_money)
        .unwrap_or(default_margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;
    use chrono::Utc;
    use uuid::Uuid;

    fn product(margin: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            name: "Latte".to_string(),
            description: None,
            ingredients: Vec::new(),
            labor_minutes: Decimal::ZERO,
            hourly_rate: Decimal::ZERO,
            target_margin_percent: Decimal::from(margin),
            total_cost: Decimal::ZERO,
            selling_price: Decimal::ZERO,
            profit_margin_percent: Decimal::from(margin),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(quantity: i64, alert: Option<i64>, cost: i64) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            name: "Milk".to_string(),
            unit: Unit::L,
            current_quantity: Decimal::from(quantity),
            cost_per_unit: Decimal::from(cost),
            low_stock_alert: alert.map(Decimal::from),
            batch_lot_number: None,
            expiration_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_aggregate_counts_and_average() {
        let products = vec![product(30), product(50)];
        let items = vec![item(2, Some(5), 3), item(10, Some(5), 1), item(0, None, 4)];

        let snapshot = BusinessSnapshot::aggregate(Some(&products), Some(&items), Decimal::from(40));

        assert_eq!(snapshot.total_products, 2);
        assert_eq!(snapshot.avg_margin_percent, Decimal::from(40));
        assert_eq!(snapshot.total_inventory_items, 3);
        assert_eq!(snapshot.low_stock_items, 1);
        assert_eq!(snapshot.inventory_value, Decimal::from(16));
    }

    #[test]
    fn test_huge_stock_value_saturates() {
        let mut big = item(1, None, 1);
        big.current_quantity = Decimal::MAX;
        big.cost_per_unit = Decimal::from(3);
        let items = vec![big.clone(), big];

        let snapshot = BusinessSnapshot::aggregate(Some(&[]), Some(&items), Decimal::from(40));
        assert_eq!(snapshot.inventory_value, Decimal::MAX);
        assert_eq!(snapshot.total_inventory_items, 2);
    }

    #[test]
    fn test_no_products_uses_default_margin() {
        let snapshot = BusinessSnapshot::aggregate(Some(&[]), Some(&[]), Decimal::from(40));
        assert_eq!(snapshot.avg_margin_percent, Decimal::from(40));
        assert_eq!(snapshot.total_products, 0);
    }

    #[test]
    fn test_failed_dimension_degrades_to_defaults() {
        let products = vec![product(20)];
        let snapshot = BusinessSnapshot::aggregate(Some(&products), None, Decimal::from(40));

        assert!(snapshot.products_available);
        assert!(!snapshot.inventory_available);
        assert_eq!(snapshot.total_products, 1);
        assert_eq!(snapshot.total_inventory_items, 0);
        assert_eq!(snapshot.low_stock_items, 0);

        let snapshot = BusinessSnapshot::aggregate(None, None, Decimal::from(40));
        assert_eq!(snapshot.avg_margin_percent, Decimal::from(40));
        assert!(!snapshot.products_available);
    }
}
