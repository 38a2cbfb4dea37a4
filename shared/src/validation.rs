//! Input validation helpers shared by the backend and the browser preview

use rust_decimal::Decimal;

use crate::currency;
use crate::models::IngredientLine;

/// Longest accepted product or item name
pub const MAX_NAME_LENGTH: usize = 200;

/// Validate a product or inventory item name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required");
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err("Name must be at most 200 characters");
    }
    Ok(())
}

/// Validate that a stored numeric field is not negative
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value cannot be negative");
    }
    Ok(())
}

/// Validate a stock adjustment delta. No-op adjustments are rejected.
pub fn validate_quantity_change(quantity_change: Decimal) -> Result<(), &'static str> {
    if quantity_change.is_zero() {
        return Err("Quantity change must not be zero");
    }
    Ok(())
}

/// Validate the ingredient lines of a recipe about to be saved.
///
/// Lines must be named and carry non-negative numbers. Zero-cost or
/// zero-quantity lines are accepted and simply do not contribute to cost.
pub fn validate_ingredients(lines: &[IngredientLine]) -> Result<(), (usize, &'static str)> {
    for (idx, line) in lines.iter().enumerate() {
        if line.name.trim().is_empty() {
            return Err((idx, "Ingredient name is required"));
        }
        if line.unit_cost < Decimal::ZERO {
            return Err((idx, "Ingredient cost cannot be negative"));
        }
        if line.quantity < Decimal::ZERO {
            return Err((idx, "Ingredient quantity cannot be negative"));
        }
    }
    Ok(())
}

/// Validate a currency code against the formatter's table
pub fn validate_currency_code(code: &str) -> Result<(), &'static str> {
    if currency::lookup(code).is_none() {
        return Err("Unsupported currency code");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Sourdough loaf").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
        assert!(validate_name(&"x".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_quantity_change() {
        assert!(validate_quantity_change(Decimal::from(5)).is_ok());
        assert!(validate_quantity_change(Decimal::from(-5)).is_ok());
        assert!(validate_quantity_change(Decimal::ZERO).is_err());
        assert!(validate_quantity_change(Decimal::new(0, 3)).is_err());
    }

    #[test]
    fn test_validate_ingredients_reports_index() {
        let lines = vec![
            IngredientLine::new("Flour", Decimal::ONE, Decimal::ONE, Unit::Kg),
            IngredientLine::new("Salt", Decimal::ONE, Decimal::from(-1), Unit::G),
        ];
        assert_eq!(
            validate_ingredients(&lines),
            Err((1, "Ingredient quantity cannot be negative"))
        );

        let zero_cost = vec![IngredientLine::new("Water", Decimal::ZERO, Decimal::ONE, Unit::L)];
        assert!(validate_ingredients(&zero_cost).is_ok());
    }

    #[test]
    fn test_validate_currency_code() {
        assert!(validate_currency_code("usd").is_ok());
        assert!(validate_currency_code("ZZZ").is_err());
    }
}
