//! WebAssembly module for the Shop Dashboard
//!
//! Provides client-side computation for:
//! - Live product pricing previews
//! - Currency formatting and parsing
//! - Form validation
//!
//! Amounts cross the boundary as decimal strings so that the browser shows
//! exactly the figures the backend will store.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::pricing::{self, PricingBreakdown};
use shared::{currency, validation, IngredientLine};
use wasm_bindgen::prelude::*;

/// Draft recipe as held by the product form
#[derive(Debug, Deserialize)]
struct DraftRecipe {
    #[serde(default)]
    ingredients: Vec<IngredientLine>,
    #[serde(default)]
    labor_minutes: Decimal,
    #[serde(default)]
    hourly_rate: Decimal,
    #[serde(default)]
    target_margin_percent: Decimal,
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("shopdash pricing module loaded"));
}

fn to_js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

fn breakdown_for(draft_json: &str) -> Result<PricingBreakdown, String> {
    let draft: DraftRecipe =
        serde_json::from_str(draft_json).map_err(|e| format!("Invalid recipe JSON: {}", e))?;
    Ok(pricing::compute_breakdown(
        &draft.ingredients,
        draft.labor_minutes,
        draft.hourly_rate,
        draft.target_margin_percent,
    ))
}

fn parse_amount(amount: &str) -> Result<Decimal, String> {
    Decimal::from_str(amount.trim()).map_err(|e| format!("Invalid amount: {}", e))
}

/// Price a draft recipe; returns the breakdown as JSON
#[wasm_bindgen]
pub fn preview_pricing(draft_json: &str) -> Result<String, JsValue> {
    let breakdown = breakdown_for(draft_json).map_err(to_js_error)?;
    serde_json::to_string(&breakdown).map_err(|e| to_js_error(e.to_string()))
}

/// Realized margin in percent for a price and cost given as decimal strings
#[wasm_bindgen]
pub fn realized_margin(selling_price: &str, total_cost: &str) -> Result<String, JsValue> {
    let price = parse_amount(selling_price).map_err(to_js_error)?;
    let cost = parse_amount(total_cost).map_err(to_js_error)?;
    Ok(pricing::round_money(pricing::compute_realized_margin(price, cost)).to_string())
}

/// Format a decimal string for display in `currency_code`
#[wasm_bindgen]
pub fn format_currency(amount: &str, currency_code: &str) -> Result<String, JsValue> {
    let amount = parse_amount(amount).map_err(to_js_error)?;
    Ok(currency::format(amount, currency_code))
}

/// Parse a display string back to a decimal string. When `currency_code` is
/// given its separators are used, otherwise they are guessed.
#[wasm_bindgen]
pub fn parse_currency(display: &str, currency_code: Option<String>) -> Result<String, JsValue> {
    let parsed = match currency_code.as_deref() {
        Some(code) => currency::parse_in(display, code),
        None => currency::parse(display),
    };
    parsed
        .map(|amount| amount.to_string())
        .map_err(|e| to_js_error(e.to_string()))
}

/// Validate a product or item name; returns the error message if invalid
#[wasm_bindgen]
pub fn validate_name(name: &str) -> Option<String> {
    validation::validate_name(name).err().map(str::to_string)
}
