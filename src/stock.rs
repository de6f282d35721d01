// Stock Ledger
//
// Tracks ingredient-level stock counts and derives which menu items must be
// taken off sale when an ingredient runs out. Depletion disables items;
// restocking never re-enables them automatically, because the ledger cannot
// know whether other depleted ingredients still gate the same item. That
// re-enable is an explicit operator action on the catalog.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::store::{MemoryStore, StoreError};

/// Error types for stock operations
#[derive(Debug, Error)]
pub enum StockError {
    /// Data-integrity error: the ingredient id is not registered.
    /// Not user-recoverable; logged and surfaced as a system error.
    #[error("Unknown ingredient: {0}")]
    UnknownIngredient(i32),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl IntoResponse for StockError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            StockError::UnknownIngredient(id) => {
                tracing::error!("Stock adjustment referenced unknown ingredient {}", id);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Unknown ingredient: {}", id),
                )
            }
            StockError::StoreError(e) => {
                tracing::error!("Stock store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Stock record for a single ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub ingredient_id: i32,
    pub name: String,
    /// Current quantity in `unit`s; never negative
    pub quantity: i64,
    /// Alerting threshold for `low_stock`
    pub min_stock: i64,
    pub unit: String,
    /// Menu items that become unorderable when this ingredient hits zero
    pub dependent_menu_items: Vec<i32>,
}

/// Result of a stock adjustment
///
/// `disabled_menu_items` is non-empty only when this adjustment crossed the
/// quantity from positive to zero; applying the disable to the catalog is the
/// caller's responsibility.
#[derive(Debug, Clone, Serialize)]
pub struct StockAdjustment {
    pub ingredient_id: i32,
    pub new_quantity: i64,
    pub disabled_menu_items: Vec<i32>,
}

/// Ingredient stock ledger over the record store
#[derive(Clone)]
pub struct StockLedger {
    entries: Arc<MemoryStore<i32, StockEntry>>,
}

impl StockLedger {
    pub fn new(entries: Arc<MemoryStore<i32, StockEntry>>) -> Self {
        Self { entries }
    }

    /// Register or replace an ingredient's stock record
    pub fn register(&self, entry: StockEntry) {
        self.entries.put(entry.ingredient_id, entry);
    }

    /// Fetch a single stock entry
    pub fn find_by_id(&self, ingredient_id: i32) -> Result<StockEntry, StockError> {
        self.entries
            .get(&ingredient_id)
            .map(|versioned| versioned.record)
            .ok_or(StockError::UnknownIngredient(ingredient_id))
    }

    /// Apply a signed delta to an ingredient's quantity
    ///
    /// Decrements clamp at zero: deducting more than is on hand is treated as
    /// best-effort consumption, not an error. When the quantity crosses from
    /// positive to zero, the returned adjustment carries every dependent menu
    /// item to disable, exactly once per crossing; adjusting an already-empty
    /// entry emits nothing. Concurrent adjustments to the same ingredient are
    /// serialized by the version check.
    pub async fn adjust(
        &self,
        ingredient_id: i32,
        delta: i64,
    ) -> Result<StockAdjustment, StockError> {
        loop {
            let versioned = self
                .entries
                .get(&ingredient_id)
                .ok_or(StockError::UnknownIngredient(ingredient_id))?;

            let current = versioned.record.quantity;
            let new_quantity = (current + delta).max(0);
            let crossed_to_zero = current > 0 && new_quantity == 0;

            let mut entry = versioned.record.clone();
            entry.quantity = new_quantity;

            match self
                .entries
                .compare_and_swap(&ingredient_id, versioned.version, entry)
            {
                Ok(stored) => {
                    let disabled_menu_items = if crossed_to_zero {
                        stored.record.dependent_menu_items.clone()
                    } else {
                        Vec::new()
                    };
                    if crossed_to_zero {
                        tracing::warn!(
                            "Ingredient {} depleted; {} dependent menu item(s) to disable",
                            ingredient_id,
                            disabled_menu_items.len()
                        );
                    }
                    return Ok(StockAdjustment {
                        ingredient_id,
                        new_quantity: stored.record.quantity,
                        disabled_menu_items,
                    });
                }
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Entries at or below their own minimum threshold
    ///
    /// Lazy and restartable; intended for alerting, never mutates state.
    pub fn low_stock(&self) -> impl Iterator<Item = StockEntry> + '_ {
        self.entries
            .scan()
            .map(|(_, versioned)| versioned.record)
            .filter(|entry| entry.quantity <= entry.min_stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> StockLedger {
        let ledger = StockLedger::new(Arc::new(MemoryStore::new()));
        ledger.register(StockEntry {
            ingredient_id: 1,
            name: "Tomato".to_string(),
            quantity: 10,
            min_stock: 3,
            unit: "kg".to_string(),
            dependent_menu_items: vec![100, 101],
        });
        ledger.register(StockEntry {
            ingredient_id: 2,
            name: "Mozzarella".to_string(),
            quantity: 2,
            min_stock: 5,
            unit: "kg".to_string(),
            dependent_menu_items: vec![100],
        });
        ledger
    }

    #[tokio::test]
    async fn test_adjust_decrements_quantity() {
        let ledger = ledger();
        let adjustment = ledger.adjust(1, -4).await.unwrap();
        assert_eq!(adjustment.new_quantity, 6);
        assert!(adjustment.disabled_menu_items.is_empty());
    }

    #[tokio::test]
    async fn test_adjust_clamps_at_zero() {
        let ledger = ledger();
        let adjustment = ledger.adjust(1, -25).await.unwrap();
        assert_eq!(adjustment.new_quantity, 0);
    }

    #[tokio::test]
    async fn test_crossing_to_zero_disables_dependents() {
        let ledger = ledger();
        let adjustment = ledger.adjust(1, -10).await.unwrap();
        assert_eq!(adjustment.new_quantity, 0);
        assert_eq!(adjustment.disabled_menu_items, vec![100, 101]);
    }

    #[tokio::test]
    async fn test_no_duplicate_disable_when_already_zero() {
        let ledger = ledger();
        ledger.adjust(1, -10).await.unwrap();

        let adjustment = ledger.adjust(1, -5).await.unwrap();
        assert_eq!(adjustment.new_quantity, 0);
        assert!(adjustment.disabled_menu_items.is_empty());
    }

    #[tokio::test]
    async fn test_redepletion_after_restock_is_a_new_crossing() {
        let ledger = ledger();
        ledger.adjust(1, -10).await.unwrap();
        ledger.adjust(1, 5).await.unwrap();

        let adjustment = ledger.adjust(1, -5).await.unwrap();
        assert_eq!(adjustment.disabled_menu_items, vec![100, 101]);
    }

    #[tokio::test]
    async fn test_restock_emits_no_enable_effect() {
        let ledger = ledger();
        ledger.adjust(1, -10).await.unwrap();

        let adjustment = ledger.adjust(1, 20).await.unwrap();
        assert_eq!(adjustment.new_quantity, 20);
        assert!(adjustment.disabled_menu_items.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ingredient_is_rejected() {
        let ledger = ledger();
        let result = ledger.adjust(99, -1).await;
        assert!(matches!(result, Err(StockError::UnknownIngredient(99))));
    }

    #[tokio::test]
    async fn test_low_stock_uses_per_entry_threshold() {
        let ledger = ledger();
        let low: Vec<i32> = ledger.low_stock().map(|e| e.ingredient_id).collect();
        assert_eq!(low, vec![2]);

        ledger.adjust(1, -8).await.unwrap();
        let mut low: Vec<i32> = ledger.low_stock().map(|e| e.ingredient_id).collect();
        low.sort_unstable();
        assert_eq!(low, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_concurrent_adjustments_never_lose_updates() {
        let ledger = StockLedger::new(Arc::new(MemoryStore::new()));
        ledger.register(StockEntry {
            ingredient_id: 1,
            name: "Flour".to_string(),
            quantity: 100,
            min_stock: 0,
            unit: "kg".to_string(),
            dependent_menu_items: vec![],
        });

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.adjust(1, -7).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.find_by_id(1).unwrap().quantity, 30);
    }
}
