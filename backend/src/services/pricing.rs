//! Pricing preview for draft products

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::pricing::{self, PricingBreakdown};
use shared::{currency, IngredientLine};

/// A draft recipe as typed into the product form. Nothing is validated:
/// out-of-range numbers simply contribute zero.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingPreviewInput {
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
    #[serde(default)]
    pub labor_minutes: Decimal,
    pub hourly_rate: Option<Decimal>,
    #[serde(default)]
    pub target_margin_percent: Decimal,
    /// Display currency; the configured currency when absent
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingPreview {
    #[serde(flatten)]
    pub breakdown: PricingBreakdown,
    pub currency: String,
    pub formatted_total_cost: String,
    pub formatted_selling_price: String,
}

/// Compute the breakdown and display strings for a draft recipe
pub fn preview(
    input: &PricingPreviewInput,
    default_hourly_rate: Decimal,
    default_currency: &str,
) -> PricingPreview {
    let hourly_rate = input.hourly_rate.unwrap_or(default_hourly_rate);
    let breakdown = pricing::compute_breakdown(
        &input.ingredients,
        input.labor_minutes,
        hourly_rate,
        input.target_margin_percent,
    );

    let currency_code = input
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default_currency)
        .to_uppercase();

    PricingPreview {
        formatted_total_cost: currency::format(breakdown.total_cost, &currency_code),
        formatted_selling_price: currency::format(breakdown.selling_price, &currency_code),
        currency: currency_code,
        breakdown,
    }
}
