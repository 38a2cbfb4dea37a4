//! Inventory ledger models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Unit;

/// Notes attached to the transaction written when an item is created
pub const INITIAL_STOCK_NOTE: &str = "Initial stock";

/// A stocked item. `current_quantity` only changes through ledger adjustments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub unit: Unit,
    pub current_quantity: Decimal,
    pub cost_per_unit: Decimal,
    pub low_stock_alert: Option<Decimal>,
    pub batch_lot_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Whether the item is at or below its alert level. Items without an
    /// alert level are never low.
    pub fn is_low_stock(&self) -> bool {
        match self.low_stock_alert {
            Some(alert) => self.current_quantity <= alert,
            None => false,
        }
    }

    /// Stock value at cost; negative stock is valued at zero. Saturates at
    /// `Decimal::MAX`.
    pub fn stock_value(&self) -> Decimal {
        self.current_quantity
            .max(Decimal::ZERO)
            .saturating_mul(self.cost_per_unit)
    }
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Add,
    Remove,
}

impl TransactionType {
    /// Positive changes add stock, everything else removes it
    pub fn from_change(quantity_change: Decimal) -> Self {
        if quantity_change > Decimal::ZERO {
            TransactionType::Add
        } else {
            TransactionType::Remove
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Add => "add",
            TransactionType::Remove => "remove",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(TransactionType::Add),
            "remove" => Some(TransactionType::Remove),
            _ => None,
        }
    }
}

/// Immutable ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub business_id: Uuid,
    pub inventory_id: Uuid,
    pub transaction_type: TransactionType,
    /// Signed change applied to the item
    pub quantity_change: Decimal,
    /// Item quantity right after this change
    pub resulting_quantity: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of replaying an item's ledger against its cached quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerReconciliation {
    pub inventory_id: Uuid,
    pub cached_quantity: Decimal,
    pub replayed_quantity: Decimal,
    pub last_resulting_quantity: Option<Decimal>,
    pub transaction_count: usize,
    pub consistent: bool,
}

impl LedgerReconciliation {
    /// Replay `transactions` (creation order) from zero and compare with the item.
    ///
    /// The ledger is consistent when the replayed sum equals the cached
    /// quantity, every entry's `resulting_quantity` matches the running total,
    /// and the last entry agrees with the cached quantity.
    pub fn replay(item: &InventoryItem, transactions: &[InventoryTransaction]) -> Self {
        let mut running = Decimal::ZERO;
        let mut running_matches = true;
        for txn in transactions {
            running += txn.quantity_change;
            if txn.resulting_quantity != running {
                running_matches = false;
            }
        }

        let last_resulting_quantity = transactions.last().map(|t| t.resulting_quantity);
        let consistent = running_matches
            && running == item.current_quantity
            && last_resulting_quantity == Some(item.current_quantity);

        Self {
            inventory_id: item.id,
            cached_quantity: item.current_quantity,
            replayed_quantity: running,
            last_resulting_quantity,
            transaction_count: transactions.len(),
            consistent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, alert: Option<i64>) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            name: "Flour".to_string(),
            unit: Unit::Kg,
            current_quantity: Decimal::from(quantity),
            cost_per_unit: Decimal::new(150, 2),
            low_stock_alert: alert.map(Decimal::from),
            batch_lot_number: None,
            expiration_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn txn(item: &InventoryItem, change: i64, resulting: i64) -> InventoryTransaction {
        let change = Decimal::from(change);
        InventoryTransaction {
            id: Uuid::new_v4(),
            business_id: item.business_id,
            inventory_id: item.id,
            transaction_type: TransactionType::from_change(change),
            quantity_change: change,
            resulting_quantity: Decimal::from(resulting),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(item(5, Some(5)).is_low_stock());
        assert!(item(4, Some(5)).is_low_stock());
        assert!(!item(6, Some(5)).is_low_stock());
    }

    #[test]
    fn test_unset_alert_is_never_low() {
        assert!(!item(0, None).is_low_stock());
        assert!(!item(-3, None).is_low_stock());
    }

    #[test]
    fn test_transaction_type_from_sign() {
        assert_eq!(TransactionType::from_change(Decimal::ONE), TransactionType::Add);
        assert_eq!(TransactionType::from_change(-Decimal::ONE), TransactionType::Remove);
    }

    #[test]
    fn test_stock_value_ignores_negative_quantity() {
        assert_eq!(item(10, None).stock_value(), Decimal::new(1500, 2));
        assert_eq!(item(-2, None).stock_value(), Decimal::ZERO);
    }

    #[test]
    fn test_replay_consistent_ledger() {
        let it = item(120, None);
        let history = vec![txn(&it, 100, 100), txn(&it, 50, 150), txn(&it, -30, 120)];

        let report = LedgerReconciliation::replay(&it, &history);
        assert!(report.consistent);
        assert_eq!(report.replayed_quantity, Decimal::from(120));
        assert_eq!(report.transaction_count, 3);
    }

    #[test]
    fn test_replay_detects_drifted_cache() {
        // Cached total lost the -30 adjustment
        let it = item(150, None);
        let history = vec![txn(&it, 100, 100), txn(&it, 50, 150), txn(&it, -30, 120)];

        let report = LedgerReconciliation::replay(&it, &history);
        assert!(!report.consistent);
        assert_eq!(report.replayed_quantity, Decimal::from(120));
        assert_eq!(report.cached_quantity, Decimal::from(150));
    }

    #[test]
    fn test_replay_detects_wrong_resulting_quantity() {
        let it = item(150, None);
        let history = vec![txn(&it, 100, 100), txn(&it, 50, 160)];

        assert!(!LedgerReconciliation::replay(&it, &history).consistent);
    }

    #[test]
    fn test_replay_without_history_is_inconsistent() {
        let it = item(0, None);
        let report = LedgerReconciliation::replay(&it, &[]);
        assert!(!report.consistent);
        assert_eq!(report.last_resulting_quantity, None);
    }
}
