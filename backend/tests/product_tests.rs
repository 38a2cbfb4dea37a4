//! Product catalogue and pricing tests
//!
//! Tests for:
//! - Server-side recomputation of cached pricing figures
//! - The reference recipe (35.00 cost, 58.33 price, 40% margin)
//! - Selling price never below cost for valid inputs

use std::str::FromStr;
use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::pricing::{compute_product, compute_realized_margin, compute_selling_price};
use shared::{IngredientLine, Unit};
use shopdash_backend::error::AppError;
use shopdash_backend::services::product::ProductInput;
use shopdash_backend::services::ProductService;
use shopdash_backend::store::MemoryStore;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn reference_input() -> ProductInput {
    ProductInput {
        name: "Latte kit".to_string(),
        description: None,
        ingredients: vec![
            IngredientLine::new("Espresso", dec("10"), dec("2"), Unit::Piece),
            IngredientLine::new("Milk", dec("5"), dec("1"), Unit::L),
        ],
        labor_minutes: dec("30"),
        hourly_rate: Some(dec("20")),
        target_margin_percent: dec("40"),
    }
}

fn service() -> ProductService {
    ProductService::new(Arc::new(MemoryStore::new()), dec("15"))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_reference_recipe_is_priced_on_create() {
        let product = service()
            .create_product(Uuid::new_v4(), reference_input())
            .await
            .unwrap();

        assert_eq!(product.total_cost, dec("35.00"));
        assert_eq!(product.selling_price, dec("58.33"));
        assert_eq!(product.profit_margin_percent, dec("40.00"));
        assert_eq!(product.ingredients.len(), 2);
    }

    #[tokio::test]
    async fn test_update_recomputes_pricing() {
        let service = service();
        let business = Uuid::new_v4();
        let product = service
            .create_product(business, reference_input())
            .await
            .unwrap();

        let mut input = reference_input();
        input.ingredients.pop();
        input.target_margin_percent = dec("50");
        let updated = service
            .update_product(business, product.id, input)
            .await
            .unwrap();

        // 20 ingredients + 10 labor at 50% margin
        assert_eq!(updated.total_cost, dec("30"));
        assert_eq!(updated.selling_price, dec("60"));
        assert_eq!(updated.profit_margin_percent, dec("50"));

        let stored = service.get_product(business, product.id).await.unwrap();
        assert_eq!(stored.selling_price, dec("60"));
        assert_eq!(stored.ingredients.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let service = service();
        let business = Uuid::new_v4();
        assert!(matches!(
            service.get_product(business, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update_product(business, Uuid::new_v4(), reference_input())
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_product(business, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_products_are_scoped_to_business() {
        let service = service();
        let owner = Uuid::new_v4();
        let product = service
            .create_product(owner, reference_input())
            .await
            .unwrap();

        assert!(service.list_products(Uuid::new_v4()).await.unwrap().is_empty());
        assert!(matches!(
            service.delete_product(Uuid::new_v4(), product.id).await,
            Err(AppError::NotFound(_))
        ));
        service.delete_product(owner, product.id).await.unwrap();
        assert!(service.list_products(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_inputs_reproduce_cached_pricing() {
        let service = service();
        let business = Uuid::new_v4();
        let mut input = reference_input();
        input.ingredients = vec![IngredientLine::new("Saffron", dec("0.12345"), dec("1000"), Unit::G)];
        input.labor_minutes = dec("7.5");
        input.hourly_rate = Some(dec("18.125"));
        input.target_margin_percent = dec("37.5");

        let created = service.create_product(business, input).await.unwrap();
        let stored = service.get_product(business, created.id).await.unwrap();

        assert_eq!(stored.ingredients[0].unit_cost, dec("0.12345"));
        let recomputed = compute_product(
            &stored.ingredients,
            stored.labor_minutes,
            stored.hourly_rate,
            stored.target_margin_percent,
        );
        assert_eq!(recomputed.total_cost, stored.total_cost);
        assert_eq!(recomputed.selling_price, stored.selling_price);
        assert_eq!(recomputed.profit_margin, stored.profit_margin_percent);
    }

    #[test]
    fn test_schema_keeps_numeric_inputs_unrounded() {
        let schema = include_str!("../migrations/20260101000000_init.sql");
        assert!(
            !schema.contains("NUMERIC("),
            "a fixed-scale NUMERIC column would round stored pricing inputs"
        );
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let mut input = reference_input();
        input.name = "   ".to_string();
        let err = service()
            .create_product(Uuid::new_v4(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn test_negative_labor_rejected() {
        let mut input = reference_input();
        input.labor_minutes = dec("-1");
        let err = service()
            .create_product(Uuid::new_v4(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "labor_minutes"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn money_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..100_000i64).prop_map(|v| Decimal::new(v, 2))
    }

    fn line_strategy() -> impl Strategy<Value = IngredientLine> {
        (money_strategy(), (0i64..1_000i64).prop_map(|v| Decimal::new(v, 1)))
            .prop_map(|(cost, qty)| IngredientLine::new("line", cost, qty, Unit::G))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Selling at or above cost for every valid recipe
        #[test]
        fn prop_price_not_below_cost(
            lines in prop::collection::vec(line_strategy(), 0..8),
            minutes in 0i64..600i64,
            rate in money_strategy(),
            margin in 0i64..100i64
        ) {
            let pricing = compute_product(&lines, Decimal::from(minutes), rate, Decimal::from(margin));
            prop_assert!(pricing.selling_price >= pricing.total_cost);
            prop_assert!(pricing.profit_margin >= Decimal::ZERO);
        }

        /// The realized margin of a computed price returns the target margin
        #[test]
        fn prop_margin_round_trip(
            cost in (1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 2)),
            margin in 0i64..99i64
        ) {
            let target = Decimal::from(margin);
            let price = compute_selling_price(cost, target);
            let realized = compute_realized_margin(price, cost);
            prop_assert!((realized - target).abs() < dec("0.0001"));
        }
    }
}
