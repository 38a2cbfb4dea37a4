//! Recipe costing and price calculation
//!
//! Every function here is total: out-of-range inputs (negative costs,
//! quantities, minutes, rates or prices) contribute zero instead of failing,
//! so a half-filled form never produces a negative or undefined price.
//! Arithmetic is checked; a figure that does not fit in a `Decimal` is
//! reported as zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::IngredientLine;

/// Highest target margin used by the price formula
pub const MAX_TARGET_MARGIN_PERCENT: i64 = 99;

const MINUTES_PER_HOUR: i64 = 60;

/// Cost snapshot persisted on a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductPricing {
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub profit_margin: Decimal,
}

/// Full breakdown shown in the live preview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingBreakdown {
    pub ingredient_cost: Decimal,
    pub labor_cost: Decimal,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub profit_margin: Decimal,
    pub markup: Decimal,
    pub valid_lines: usize,
    pub invalid_lines: usize,
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Round a money or percentage figure to exactly two decimals
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn checked_ingredient_cost(lines: &[IngredientLine]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.line_cost()))
}

fn checked_labor_cost(labor_minutes: Decimal, hourly_rate: Decimal) -> Option<Decimal> {
    non_negative(labor_minutes)
        .checked_div(Decimal::from(MINUTES_PER_HOUR))?
        .checked_mul(non_negative(hourly_rate))
}

/// Sum of `unit_cost * quantity` over lines with positive cost and quantity
pub fn compute_ingredient_cost(lines: &[IngredientLine]) -> Decimal {
    checked_ingredient_cost(lines).unwrap_or(Decimal::ZERO)
}

/// Labor cost for `labor_minutes` at `hourly_rate`
pub fn compute_labor_cost(labor_minutes: Decimal, hourly_rate: Decimal) -> Decimal {
    checked_labor_cost(labor_minutes, hourly_rate).unwrap_or(Decimal::ZERO)
}

pub fn compute_total_cost(
    lines: &[IngredientLine],
    labor_minutes: Decimal,
    hourly_rate: Decimal,
) -> Decimal {
    checked_ingredient_cost(lines)
        .zip(checked_labor_cost(labor_minutes, hourly_rate))
        .and_then(|(ingredients, labor)| ingredients.checked_add(labor))
        .unwrap_or(Decimal::ZERO)
}

/// Normalize a target margin: negatives become 0 and values between 99 and
/// 100 are clamped to 99. Values of 100 or more are returned unchanged and
/// handled by the doubling fallback in [`compute_selling_price`].
pub fn clamp_target_margin(target_margin_percent: Decimal) -> Decimal {
    let max = Decimal::from(MAX_TARGET_MARGIN_PERCENT);
    let hundred = Decimal::from(100);
    if target_margin_percent < Decimal::ZERO {
        Decimal::ZERO
    } else if target_margin_percent > max && target_margin_percent < hundred {
        max
    } else {
        target_margin_percent
    }
}

/// Price that yields `target_margin_percent` of the selling price as profit.
///
/// A target of 100% or more has no finite price, so the cost is doubled.
pub fn compute_selling_price(total_cost: Decimal, target_margin_percent: Decimal) -> Decimal {
    let cost = non_negative(total_cost);
    let hundred = Decimal::from(100);
    let margin = clamp_target_margin(target_margin_percent);

    let price = if margin >= hundred {
        cost.checked_mul(Decimal::from(2))
    } else {
        margin
            .checked_div(hundred)
            .and_then(|share| cost.checked_div(Decimal::ONE - share))
    };
    price.unwrap_or(Decimal::ZERO)
}

/// Share of the selling price that is profit, in percent.
///
/// Returns 0 for a zero price or for negative inputs. A price below cost
/// yields a negative margin.
pub fn compute_realized_margin(selling_price: Decimal, total_cost: Decimal) -> Decimal {
    if selling_price <= Decimal::ZERO || total_cost < Decimal::ZERO {
        return Decimal::ZERO;
    }
    (selling_price - total_cost)
        .checked_div(selling_price)
        .and_then(|share| share.checked_mul(Decimal::from(100)))
        .unwrap_or(Decimal::ZERO)
}

/// Percentage of cost added to reach the selling price. 0 when cost is not positive.
pub fn compute_markup(selling_price: Decimal, total_cost: Decimal) -> Decimal {
    if total_cost <= Decimal::ZERO || selling_price < Decimal::ZERO {
        return Decimal::ZERO;
    }
    (selling_price - total_cost)
        .checked_div(total_cost)
        .and_then(|ratio| ratio.checked_mul(Decimal::from(100)))
        .unwrap_or(Decimal::ZERO)
}

/// Cost snapshot for a recipe, rounded to cents.
///
/// The selling price is derived from the rounded total cost so that the
/// stored figures are consistent with each other.
pub fn compute_product(
    lines: &[IngredientLine],
    labor_minutes: Decimal,
    hourly_rate: Decimal,
    target_margin_percent: Decimal,
) -> ProductPricing {
    let total_cost = round_money(compute_total_cost(lines, labor_minutes, hourly_rate));
    let selling_price = round_money(compute_selling_price(total_cost, target_margin_percent));
    let profit_margin = round_money(compute_realized_margin(selling_price, total_cost));

    ProductPricing {
        total_cost,
        selling_price,
        profit_margin,
    }
}

/// [`compute_product`] plus the intermediate figures for display
pub fn compute_breakdown(
    lines: &[IngredientLine],
    labor_minutes: Decimal,
    hourly_rate: Decimal,
    target_margin_percent: Decimal,
) -> PricingBreakdown {
    let pricing = compute_product(lines, labor_minutes, hourly_rate, target_margin_percent);
    let valid_lines = lines.iter().filter(|l| l.contributes()).count();

    PricingBreakdown {
        ingredient_cost: round_money(compute_ingredient_cost(lines)),
        labor_cost: round_money(compute_labor_cost(labor_minutes, hourly_rate)),
        total_cost: pricing.total_cost,
        selling_price: pricing.selling_price,
        profit_margin: pricing.profit_margin,
        markup: round_money(compute_markup(pricing.selling_price, pricing.total_cost)),
        valid_lines,
        invalid_lines: lines.len() - valid_lines,
    }
}
