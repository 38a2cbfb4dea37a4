//! Product and recipe costing models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Unit;

/// One ingredient of a product recipe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientLine {
    pub name: String,
    pub unit_cost: Decimal,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Unit,
}

impl IngredientLine {
    pub fn new(name: impl Into<String>, unit_cost: Decimal, quantity: Decimal, unit: Unit) -> Self {
        Self {
            name: name.into(),
            unit_cost,
            quantity,
            unit,
        }
    }

    /// A line counts towards cost only when both cost and quantity are positive
    pub fn is_valid(&self) -> bool {
        self.unit_cost > Decimal::ZERO && self.quantity > Decimal::ZERO
    }

    fn checked_line_cost(&self) -> Option<Decimal> {
        if self.is_valid() {
            self.unit_cost.checked_mul(self.quantity)
        } else {
            None
        }
    }

    /// Whether the line adds to the recipe cost. A valid line whose cost
    /// overflows contributes nothing.
    pub fn contributes(&self) -> bool {
        self.checked_line_cost().is_some()
    }

    pub fn line_cost(&self) -> Decimal {
        self.checked_line_cost().unwrap_or(Decimal::ZERO)
    }
}

/// A sellable product with its cached cost snapshot.
///
/// `total_cost`, `selling_price` and `profit_margin_percent` are derived from
/// the raw inputs (`ingredients`, `labor_minutes`, `hourly_rate`,
/// `target_margin_percent`) every time the product is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Vec<IngredientLine>,
    pub labor_minutes: Decimal,
    pub hourly_rate: Decimal,
    pub target_margin_percent: Decimal,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub profit_margin_percent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
