//! Inventory stock ledger
//!
//! An item's `current_quantity` only ever changes together with a new
//! ledger entry, through [`InventoryStore::apply_adjustment`] or the initial
//! stock written at creation. Replaying an item's ledger from zero therefore
//! reproduces its stored quantity.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use shared::{
    validation, InventoryItem, InventoryTransaction, LedgerReconciliation, Unit,
    INITIAL_STOCK_NOTE,
};
use uuid::Uuid;
use validator::Validate;

use crate::config::NegativeStockPolicy;
use crate::error::{AppError, AppResult};
use crate::store::{InventoryItemPatch, InventoryStore, NewInventoryItem, StockAdjustment};

/// Inventory service for managing items and their stock ledger
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
    policy: NegativeStockPolicy,
}

/// Input for creating an inventory item
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    #[serde(default)]
    pub unit: Unit,
    pub initial_quantity: Decimal,
    #[serde(default)]
    pub cost_per_unit: Decimal,
    pub low_stock_alert: Option<Decimal>,
    #[validate(length(max = 100, message = "Batch/lot number must be at most 100 characters"))]
    pub batch_lot_number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

/// Input for a single stock adjustment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustStockInput {
    pub quantity_change: Decimal,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Input for applying the same adjustment to several items
#[derive(Debug, Deserialize, Validate)]
pub struct BulkAdjustInput {
    pub item_ids: Vec<Uuid>,
    pub quantity_change: Decimal,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Input for editing an item's descriptive fields.
///
/// `current_quantity` is accepted by the deserializer only so that a request
/// trying to set it can be rejected explicitly.
///
/// The optional item fields distinguish an absent key (leave unchanged) from
/// an explicit `null` (clear the value).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    pub unit: Option<Unit>,
    pub cost_per_unit: Option<Decimal>,
    #[serde(default, deserialize_with = "present")]
    pub low_stock_alert: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present")]
    pub batch_lot_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub expiration_date: Option<Option<NaiveDate>>,
    pub current_quantity: Option<Decimal>,
}

const MAX_BATCH_LOT_LEN: usize = 100;

/// Wraps a present key, `null` included, in `Some`
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Item state after an adjustment together with the ledger entry it produced
#[derive(Debug, Clone, Serialize)]
pub struct StockMovement {
    pub item: InventoryItem,
    pub transaction: InventoryTransaction,
}

/// Per-item result of a bulk adjustment
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResult {
    pub item_id: Uuid,
    #[serde(flatten)]
    pub outcome: BulkOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkOutcome {
    Adjusted {
        item: InventoryItem,
        transaction: InventoryTransaction,
    },
    Failed {
        code: String,
        message: String,
    },
}

impl BulkItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BulkOutcome::Adjusted { .. })
    }
}

/// Outcome of a bulk adjustment, one entry per distinct requested item
#[derive(Debug, Clone, Serialize)]
pub struct BulkAdjustReport {
    pub results: Vec<BulkItemResult>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkAdjustReport {
    fn from_results(results: Vec<BulkItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
        }
    }
}

/// Row layout of the transaction history export
#[derive(Debug, Serialize)]
struct TransactionCsvRow<'a> {
    created_at: String,
    #[serde(rename = "type")]
    transaction_type: &'static str,
    quantity_change: Decimal,
    resulting_quantity: Decimal,
    notes: &'a str,
}

fn check(field: &str, result: Result<(), &'static str>) -> AppResult<()> {
    result.map_err(|message| AppError::validation(field, message))
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(store: Arc<dyn InventoryStore>, policy: NegativeStockPolicy) -> Self {
        Self { store, policy }
    }

    /// Create an item and its "Initial stock" ledger entry atomically
    pub async fn create_item(
        &self,
        business_id: Uuid,
        input: CreateItemInput,
    ) -> AppResult<(InventoryItem, InventoryTransaction)> {
        input.validate()?;
        check("name", validation::validate_name(&input.name))?;
        check(
            "initial_quantity",
            validation::validate_non_negative(input.initial_quantity),
        )?;
        check(
            "cost_per_unit",
            validation::validate_non_negative(input.cost_per_unit),
        )?;
        if let Some(alert) = input.low_stock_alert {
            check("low_stock_alert", validation::validate_non_negative(alert))?;
        }

        let new_item = NewInventoryItem {
            name: input.name.trim().to_string(),
            unit: input.unit,
            cost_per_unit: input.cost_per_unit,
            low_stock_alert: input.low_stock_alert,
            batch_lot_number: clean_notes(input.batch_lot_number),
            expiration_date: input.expiration_date,
        };

        let (item, transaction) = self
            .store
            .insert_item_with_initial_stock(
                business_id,
                new_item,
                input.initial_quantity,
                INITIAL_STOCK_NOTE,
            )
            .await?;

        tracing::info!(
            item_id = %item.id,
            quantity = %item.current_quantity,
            "Created inventory item with initial stock"
        );
        Ok((item, transaction))
    }

    pub async fn get_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<InventoryItem> {
        self.store
            .get_item(business_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
    }

    pub async fn list_items(&self, business_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        self.store.list_items(business_id).await
    }

    /// Apply a signed, non-zero quantity change to one item
    pub async fn adjust_stock(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        input: AdjustStockInput,
    ) -> AppResult<StockMovement> {
        input.validate()?;
        if let Err(message) = validation::validate_quantity_change(input.quantity_change) {
            tracing::warn!(item_id = %item_id, "Rejected zero stock adjustment");
            return Err(AppError::validation("quantity_change", message));
        }

        let adjustment = StockAdjustment {
            quantity_change: input.quantity_change,
            notes: clean_notes(input.notes),
            allow_negative: self.policy.allows_negative(),
        };

        let result = self
            .store
            .apply_adjustment(business_id, item_id, adjustment)
            .await;

        match result {
            Ok((item, transaction)) => {
                tracing::info!(
                    item_id = %item_id,
                    change = %transaction.quantity_change,
                    resulting = %transaction.resulting_quantity,
                    "Stock adjusted"
                );
                Ok(StockMovement { item, transaction })
            }
            Err(e) => {
                tracing::warn!(item_id = %item_id, error = %e, "Stock adjustment failed");
                Err(e)
            }
        }
    }

    /// Apply the same change to every listed item independently.
    ///
    /// Items are processed one after another; a failure is recorded in the
    /// report and does not stop the remaining items. Duplicate ids are
    /// adjusted once.
    pub async fn bulk_adjust(
        &self,
        business_id: Uuid,
        input: BulkAdjustInput,
    ) -> AppResult<BulkAdjustReport> {
        input.validate()?;
        check(
            "quantity_change",
            validation::validate_quantity_change(input.quantity_change),
        )?;
        if input.item_ids.is_empty() {
            return Err(AppError::validation(
                "item_ids",
                "At least one item must be selected",
            ));
        }

        let mut seen = HashSet::new();
        let item_ids: Vec<Uuid> = input
            .item_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut results = Vec::with_capacity(item_ids.len());
        for item_id in item_ids {
            let single = AdjustStockInput {
                quantity_change: input.quantity_change,
                notes: input.notes.clone(),
            };
            let outcome = match self.adjust_stock(business_id, item_id, single).await {
                Ok(movement) => BulkOutcome::Adjusted {
                    item: movement.item,
                    transaction: movement.transaction,
                },
                Err(e) => BulkOutcome::Failed {
                    code: e.code().to_string(),
                    message: e.public_message(),
                },
            };
            results.push(BulkItemResult { item_id, outcome });
        }

        let report = BulkAdjustReport::from_results(results);
        if report.failed > 0 {
            tracing::warn!(
                succeeded = report.succeeded,
                failed = report.failed,
                "Bulk stock adjustment partially failed"
            );
        } else {
            tracing::info!(succeeded = report.succeeded, "Bulk stock adjustment completed");
        }
        Ok(report)
    }

    /// Edit descriptive fields. Quantity cannot be changed here.
    pub async fn update_item(
        &self,
        business_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<InventoryItem> {
        if input.current_quantity.is_some() {
            return Err(AppError::validation(
                "current_quantity",
                "Quantity can only be changed through a stock adjustment",
            ));
        }
        input.validate()?;
        if let Some(name) = &input.name {
            check("name", validation::validate_name(name))?;
        }
        if let Some(cost) = input.cost_per_unit {
            check("cost_per_unit", validation::validate_non_negative(cost))?;
        }
        if let Some(Some(alert)) = input.low_stock_alert {
            check("low_stock_alert", validation::validate_non_negative(alert))?;
        }
        if let Some(Some(batch)) = &input.batch_lot_number {
            if batch.chars().count() > MAX_BATCH_LOT_LEN {
                return Err(AppError::validation(
                    "batch_lot_number",
                    "Batch/lot number must be at most 100 characters",
                ));
            }
        }

        let patch = InventoryItemPatch {
            name: input.name.map(|n| n.trim().to_string()),
            unit: input.unit,
            cost_per_unit: input.cost_per_unit,
            low_stock_alert: input.low_stock_alert,
            batch_lot_number: input.batch_lot_number.map(clean_notes),
            expiration_date: input.expiration_date,
        };
        if patch.is_empty() {
            return self.get_item(business_id, item_id).await;
        }

        self.store
            .update_item(business_id, item_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
    }

    /// Hard delete; the item's ledger is deleted with it
    pub async fn delete_item(&self, business_id: Uuid, item_id: Uuid) -> AppResult<()> {
        if !self.store.delete_item(business_id, item_id).await? {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }
        tracing::info!(item_id = %item_id, "Deleted inventory item and its ledger");
        Ok(())
    }

    /// Ledger of one item in creation order
    pub async fn get_transactions(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Vec<InventoryTransaction>> {
        self.get_item(business_id, item_id).await?;
        self.store.list_item_transactions(business_id, item_id).await
    }

    /// All ledger entries of the business, newest first
    pub async fn list_transactions(&self, business_id: Uuid) -> AppResult<Vec<InventoryTransaction>> {
        self.store.list_transactions(business_id).await
    }

    /// Replay an item's ledger and compare it with the stored quantity
    pub async fn reconcile(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<LedgerReconciliation> {
        let item = self.get_item(business_id, item_id).await?;
        let transactions = self
            .store
            .list_item_transactions(business_id, item_id)
            .await?;

        let report = LedgerReconciliation::replay(&item, &transactions);
        if !report.consistent {
            tracing::warn!(
                item_id = %item_id,
                cached = %report.cached_quantity,
                replayed = %report.replayed_quantity,
                "Ledger does not reproduce stored quantity"
            );
        }
        Ok(report)
    }

    /// Items at or below their low-stock alert
    pub async fn low_stock(&self, business_id: Uuid) -> AppResult<Vec<InventoryItem>> {
        let items = self.store.list_items(business_id).await?;
        Ok(items.into_iter().filter(InventoryItem::is_low_stock).collect())
    }

    /// Export one item's ledger as CSV
    pub async fn export_transactions_csv(
        &self,
        business_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<String> {
        let transactions = self.get_transactions(business_id, item_id).await?;
        let rows: Vec<TransactionCsvRow<'_>> = transactions
            .iter()
            .map(|t| TransactionCsvRow {
                created_at: t.created_at.to_rfc3339(),
                transaction_type: t.transaction_type.as_str(),
                quantity_change: t.quantity_change,
                resulting_quantity: t.resulting_quantity,
                notes: t.notes.as_deref().unwrap_or(""),
            })
            .collect();
        export_to_csv(&rows)
    }
}

/// Serialize records as CSV with a header row
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> InventoryService {
        InventoryService::new(Arc::new(MemoryStore::new()), NegativeStockPolicy::Allow)
    }

    fn flour(quantity: i64) -> CreateItemInput {
        CreateItemInput {
            name: "Flour".to_string(),
            unit: Unit::Kg,
            initial_quantity: Decimal::from(quantity),
            cost_per_unit: Decimal::from(2),
            low_stock_alert: Some(Decimal::from(10)),
            batch_lot_number: None,
            expiration_date: None,
        }
    }

    #[test]
    fn test_update_input_tells_null_from_absent() {
        let input: UpdateItemInput =
            serde_json::from_str(r#"{"low_stock_alert": null, "batch_lot_number": "B-1"}"#)
                .unwrap();
        assert_eq!(input.low_stock_alert, Some(None));
        assert_eq!(input.batch_lot_number, Some(Some("B-1".to_string())));
        assert_eq!(input.expiration_date, None);
    }

    #[tokio::test]
    async fn test_export_has_header_and_rows() {
        let service = service();
        let business = Uuid::new_v4();
        let (item, _) = service.create_item(business, flour(5)).await.unwrap();

        let csv = service
            .export_transactions_csv(business, item.id)
            .await
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("created_at,type,quantity_change,resulting_quantity,notes")
        );
        let row = lines.next().unwrap();
        assert!(row.ends_with(",add,5,5,Initial stock"));
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn test_blank_notes_are_dropped() {
        let service = service();
        let business = Uuid::new_v4();
        let (item, _) = service.create_item(business, flour(5)).await.unwrap();

        let movement = service
            .adjust_stock(
                business,
                item.id,
                AdjustStockInput {
                    quantity_change: Decimal::ONE,
                    notes: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(movement.transaction.notes, None);
    }

    #[tokio::test]
    async fn test_negative_initial_quantity_rejected() {
        let service = service();
        let err = service
            .create_item(Uuid::new_v4(), flour(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "initial_quantity"));
    }

    #[tokio::test]
    async fn test_bulk_rejects_empty_selection() {
        let err = service()
            .bulk_adjust(
                Uuid::new_v4(),
                BulkAdjustInput {
                    item_ids: vec![],
                    quantity_change: Decimal::ONE,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "item_ids"));
    }

    #[tokio::test]
    async fn test_bulk_adjusts_duplicate_ids_once() {
        let service = service();
        let business = Uuid::new_v4();
        let (item, _) = service.create_item(business, flour(5)).await.unwrap();

        let report = service
            .bulk_adjust(
                business,
                BulkAdjustInput {
                    item_ids: vec![item.id, item.id],
                    quantity_change: Decimal::from(2),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(
            service.get_item(business, item.id).await.unwrap().current_quantity,
            Decimal::from(7)
        );
    }
}
