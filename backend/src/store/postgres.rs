//! PostgreSQL store backed by sqlx

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    IngredientLine, InventoryItem, InventoryTransaction, Product, TransactionType, Unit,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{
    InventoryItemPatch, InventoryStore, NewInventoryItem, ProductDraft, ProductStore,
    StockAdjustment,
};
use crate::error::{AppError, AppResult};

const ITEM_COLUMNS: &str = "id, business_id, name, unit, current_quantity, cost_per_unit, \
     low_stock_alert, batch_lot_number, expiration_date, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, business_id, inventory_id, transaction_type, \
     quantity_change, resulting_quantity, notes, created_at";

const PRODUCT_COLUMNS: &str = "id, business_id, name, description, labor_minutes, hourly_rate, \
     target_margin_percent, total_cost, selling_price, profit_margin_percent, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    business_id: Uuid,
    name: String,
    unit: String,
    current_quantity: Decimal,
    cost_per_unit: Decimal,
    low_stock_alert: Option<Decimal>,
    batch_lot_number: Option<String>,
    expiration_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(r: ItemRow) -> Self {
        InventoryItem {
            id: r.id,
            business_id: r.business_id,
            name: r.name,
            unit: Unit::from_str(&r.unit).unwrap_or_default(),
            current_quantity: r.current_quantity,
            cost_per_unit: r.cost_per_unit,
            low_stock_alert: r.low_stock_alert,
            batch_lot_number: r.batch_lot_number,
            expiration_date: r.expiration_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    business_id: Uuid,
    inventory_id: Uuid,
    transaction_type: String,
    quantity_change: Decimal,
    resulting_quantity: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TransactionRow> for InventoryTransaction {
    fn from(r: TransactionRow) -> Self {
        InventoryTransaction {
            id: r.id,
            business_id: r.business_id,
            inventory_id: r.inventory_id,
            transaction_type: TransactionType::from_str(&r.transaction_type)
                .unwrap_or_else(|| TransactionType::from_change(r.quantity_change)),
            quantity_change: r.quantity_change,
            resulting_quantity: r.resulting_quantity,
            notes: r.notes,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    business_id: Uuid,
    name: String,
    description: Option<String>,
    labor_minutes: Decimal,
    hourly_rate: Decimal,
    target_margin_percent: Decimal,
    total_cost: Decimal,
    selling_price: Decimal,
    profit_margin_percent: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, ingredients: Vec<IngredientLine>) -> Product {
        Product {
            id: self.id,
            business_id: self.business_id,
            name: self.name,
            description: self.description,
            ingredients,
            labor_minutes: self.labor_minutes,
            hourly_rate: self.hourly_rate,
            target_margin_percent: self.target_margin_percent,
            total_cost: self.total_cost,
            selling_price: self.selling_price,
            profit_margin_percent: self.profit_margin_percent,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct IngredientRow {
    product_id: Uuid,
    name: String,
    unit_cost: Decimal,
    quantity: Decimal,
    unit: String,
}

impl From<IngredientRow> for IngredientLine {
    fn from(r: IngredientRow) -> Self {
        IngredientLine {
            name: r.name,
            unit_cost: r.unit_cost,
            quantity: r.quantity,
            unit: Unit::from_str(&r.unit).unwrap_or_default(),
        }
    }
}

async fn insert_transaction(
    tx: &mut Transaction<'_, Postgres>,
    business_id: Uuid,
    item_id: Uuid,
    transaction_type: TransactionType,
    quantity_change: Decimal,
    resulting_quantity: Decimal,
    notes: Option<&str>,
) -> AppResult<InventoryTransaction> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        INSERT INTO inventory_transactions (
            business_id, inventory_id, transaction_type, quantity_change, resulting_quantity, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(business_id)
    .bind(item_id)
    .bind(transaction_type.as_str())
    .bind(quantity_change)
    .bind(resulting_quantity)
    .bind(notes)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.into())
}

async fn insert_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    ingredients: &[IngredientLine],
) -> AppResult<()> {
    for (position, line) in ingredients.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO product_ingredients (product_id, position, name, unit_cost, quantity, unit)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product_id)
        .bind(position as i32)
        .bind(&line.name)
        .bind(line.unit_cost)
        .bind(line.quantity)
        .bind(line.unit.as_str())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

impl PgStore {
    async fn load_ingredients(
        &self,
        product_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<IngredientLine>>> {
        let rows = sqlx::query_as::<_, IngredientRow>(
            r#"
            SELECT product_id, name, unit_cost, quantity, unit
            FROM product_ingredients
            WHERE product_id = ANY($1)
            ORDER BY product_id, position
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_product: HashMap<Uuid, Vec<IngredientLine>> = HashMap::new();
        for row in rows {
            by_product.entry(row.product_id).or_default().push(row.into());
        }
        Ok(by_product)
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn insert_item_with_initial_stock(
        &self,
        business_id: Uuid,
        item: NewInventoryItem,
        initial_quantity: Decimal,
        notes: &str,
    ) -> AppResult<(InventoryItem, InventoryTransaction)> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO inventory_items (
                business_id, name, unit, current_quantity, cost_per_unit,
                low_stock_alert, batch_lot_number, expiration_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(&item.name)
        .bind(item.unit.as_str())
        .bind(initial_quantity)
        .bind(item.cost_per_unit)
        .bind(item.low_stock_alert)
        .bind(&item.batch_lot_number)
        .bind(item.expiration_date)
        .fetch_one(&mut *tx)
        .await?;
        let item: InventoryItem = row.into();

        let transaction = insert_transaction(
            &mut tx,
            business_id,
            item.id,
            TransactionType::Add,
            initial_quantity,
            initial_quantity,
            Some(notes),
        )
        .await?;

        tx.commit().await?;
        Ok((item, transaction))
    }

    async fn get_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1 AND business_id = $2"
        ))
        .bind(item_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_items(&self, business_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE business_id = $1
            ORDER BY name, created_at
            "#
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn apply_adjustment(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        adjustment: StockAdjustment,
    ) -> AppResult<(InventoryItem, InventoryTransaction)> {
        let mut tx = self.db.begin().await?;

        // Increment under the row lock; concurrent adjustments serialize
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE inventory_items
            SET current_quantity = current_quantity + $1, updated_at = NOW()
            WHERE id = $2 AND business_id = $3
              AND ($4 OR current_quantity + $1 >= 0)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(adjustment.quantity_change)
        .bind(item_id)
        .bind(business_id)
        .bind(adjustment.allow_negative)
        .fetch_optional(&mut *tx)
        .await?;

        let item: InventoryItem = match row {
            Some(row) => row.into(),
            None => {
                let available = sqlx::query_scalar::<_, Decimal>(
                    "SELECT current_quantity FROM inventory_items WHERE id = $1 AND business_id = $2",
                )
                .bind(item_id)
                .bind(business_id)
                .fetch_optional(&mut *tx)
                .await?;

                return Err(match available {
                    Some(available) => AppError::InsufficientStock {
                        available,
                        requested: adjustment.quantity_change,
                    },
                    None => AppError::NotFound("Inventory item".to_string()),
                });
            }
        };

        let transaction = insert_transaction(
            &mut tx,
            business_id,
            item.id,
            TransactionType::from_change(adjustment.quantity_change),
            adjustment.quantity_change,
            item.current_quantity,
            adjustment.notes.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok((item, transaction))
    }

    async fn update_item(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        patch: InventoryItemPatch,
    ) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE inventory_items
            SET name = COALESCE($1, name),
                unit = COALESCE($2, unit),
                cost_per_unit = COALESCE($3, cost_per_unit),
                low_stock_alert = CASE WHEN $4 THEN $5 ELSE low_stock_alert END,
                batch_lot_number = CASE WHEN $6 THEN $7 ELSE batch_lot_number END,
                expiration_date = CASE WHEN $8 THEN $9 ELSE expiration_date END,
                updated_at = NOW()
            WHERE id = $10 AND business_id = $11
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&patch.name)
        .bind(patch.unit.map(|u| u.as_str()))
        .bind(patch.cost_per_unit)
        .bind(patch.low_stock_alert.is_some())
        .bind(patch.low_stock_alert.flatten())
        .bind(patch.batch_lot_number.is_some())
        .bind(patch.batch_lot_number.clone().flatten())
        .bind(patch.expiration_date.is_some())
        .bind(patch.expiration_date.flatten())
        .bind(item_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<bool> {
        // inventory_transactions.inventory_id cascades on delete
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1 AND business_id = $2")
            .bind(item_id)
            .bind(business_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_item_transactions(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Vec<InventoryTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM inventory_transactions
            WHERE inventory_id = $1 AND business_id = $2
            ORDER BY sequence ASC
            "#
        ))
        .bind(item_id)
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_transactions(&self, business_id: Uuid) -> AppResult<Vec<InventoryTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM inventory_transactions
            WHERE business_id = $1
            ORDER BY sequence DESC
            "#
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert_product(&self, business_id: Uuid, draft: ProductDraft) -> AppResult<Product> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (
                business_id, name, description, labor_minutes, hourly_rate,
                target_margin_percent, total_cost, selling_price, profit_margin_percent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.labor_minutes)
        .bind(draft.hourly_rate)
        .bind(draft.target_margin_percent)
        .bind(draft.pricing.total_cost)
        .bind(draft.pricing.selling_price)
        .bind(draft.pricing.profit_margin)
        .fetch_one(&mut *tx)
        .await?;

        insert_ingredients(&mut tx, row.id, &draft.ingredients).await?;
        tx.commit().await?;

        Ok(row.into_product(draft.ingredients))
    }

    async fn get_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<Option<Product>> {
        let Some(row) = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND business_id = $2"
        ))
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        else {
            return Ok(None);
        };

        let mut ingredients = self.load_ingredients(&[row.id]).await?;
        let lines = ingredients.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_product(lines)))
    }

    async fn list_products(&self, business_id: Uuid) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE business_id = $1
            ORDER BY name, created_at
            "#
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut ingredients = self.load_ingredients(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = ingredients.remove(&row.id).unwrap_or_default();
                row.into_product(lines)
            })
            .collect())
    }

    async fn update_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        draft: ProductDraft,
    ) -> AppResult<Option<Product>> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, description = $2, labor_minutes = $3, hourly_rate = $4,
                target_margin_percent = $5, total_cost = $6, selling_price = $7,
                profit_margin_percent = $8, updated_at = NOW()
            WHERE id = $9 AND business_id = $10
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.labor_minutes)
        .bind(draft.hourly_rate)
        .bind(draft.target_margin_percent)
        .bind(draft.pricing.total_cost)
        .bind(draft.pricing.selling_price)
        .bind(draft.pricing.profit_margin)
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM product_ingredients WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        insert_ingredients(&mut tx, product_id, &draft.ingredients).await?;

        tx.commit().await?;
        Ok(Some(row.into_product(draft.ingredients)))
    }

    async fn delete_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND business_id = $2")
            .bind(product_id)
            .bind(business_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
