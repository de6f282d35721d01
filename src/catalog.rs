// Menu catalog
//
// Menu items with their price snapshots and availability flag, plus the
// item -> ingredient mapping the fulfillment path uses to deduct stock.
// The engine is the sole writer of availability=false (stock depletion);
// setting it back to true is an operator decision made after restocking.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::store::{MemoryStore, StoreError};

/// Error types for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Data-integrity error: the menu item id is not in the catalog
    #[error("Unknown menu item: {0}")]
    UnknownMenuItem(i32),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            CatalogError::UnknownMenuItem(id) => (
                StatusCode::NOT_FOUND,
                format!("Menu item with id {} not found", id),
            ),
            CatalogError::StoreError(e) => {
                tracing::error!("Catalog store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// A menu item as the ordering engine sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub available: bool,
}

/// One ingredient consumed per unit of a menu item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientUse {
    pub ingredient_id: i32,
    pub quantity_per_unit: i64,
}

/// Request DTO for the operator availability toggle
#[derive(Debug, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub available: bool,
}

/// Catalog storage over the record store
#[derive(Clone)]
pub struct CatalogRepository {
    menu_items: Arc<MemoryStore<i32, MenuItem>>,
    recipes: Arc<MemoryStore<i32, Vec<IngredientUse>>>,
}

impl CatalogRepository {
    pub fn new(
        menu_items: Arc<MemoryStore<i32, MenuItem>>,
        recipes: Arc<MemoryStore<i32, Vec<IngredientUse>>>,
    ) -> Self {
        Self {
            menu_items,
            recipes,
        }
    }

    /// Register a menu item together with its ingredient recipe
    pub fn register(&self, item: MenuItem, recipe: Vec<IngredientUse>) {
        let id = item.id;
        self.menu_items.put(id, item);
        self.recipes.put(id, recipe);
    }

    /// Fetch a menu item
    pub async fn find_by_id(&self, menu_item_id: i32) -> Result<MenuItem, CatalogError> {
        self.menu_items
            .get(&menu_item_id)
            .map(|versioned| versioned.record)
            .ok_or(CatalogError::UnknownMenuItem(menu_item_id))
    }

    /// All menu items, ordered by id
    pub async fn list(&self) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self
            .menu_items
            .scan()
            .map(|(_, versioned)| versioned.record)
            .collect();
        items.sort_by_key(|item| item.id);
        items
    }

    /// Ingredients consumed per unit of a menu item
    ///
    /// Items without a registered recipe consume nothing.
    pub async fn ingredients_of(
        &self,
        menu_item_id: i32,
    ) -> Result<Vec<IngredientUse>, CatalogError> {
        if !self.menu_items.contains(&menu_item_id) {
            return Err(CatalogError::UnknownMenuItem(menu_item_id));
        }
        Ok(self
            .recipes
            .get(&menu_item_id)
            .map(|versioned| versioned.record)
            .unwrap_or_default())
    }

    /// Set a menu item's availability flag
    pub async fn set_available(
        &self,
        menu_item_id: i32,
        available: bool,
    ) -> Result<MenuItem, CatalogError> {
        loop {
            let versioned = self
                .menu_items
                .get(&menu_item_id)
                .ok_or(CatalogError::UnknownMenuItem(menu_item_id))?;

            let mut item = versioned.record.clone();
            item.available = available;

            match self
                .menu_items
                .compare_and_swap(&menu_item_id, versioned.version, item)
            {
                Ok(stored) => return Ok(stored.record),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Disable every listed menu item after a stock depletion
    ///
    /// Best effort across the set: an unknown id is logged and skipped so one
    /// bad reference does not leave the other items orderable.
    pub async fn mark_unavailable(&self, menu_item_ids: &[i32]) {
        for &menu_item_id in menu_item_ids {
            match self.set_available(menu_item_id, false).await {
                Ok(_) => {
                    tracing::info!("Menu item {} marked unavailable", menu_item_id);
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to disable menu item {} after stock depletion: {}",
                        menu_item_id,
                        e
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn catalog() -> CatalogRepository {
        let catalog = CatalogRepository::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
        catalog.register(
            MenuItem {
                id: 100,
                name: "Margherita".to_string(),
                price: dec!(12.50),
                available: true,
            },
            vec![
                IngredientUse {
                    ingredient_id: 1,
                    quantity_per_unit: 2,
                },
                IngredientUse {
                    ingredient_id: 2,
                    quantity_per_unit: 1,
                },
            ],
        );
        catalog.register(
            MenuItem {
                id: 101,
                name: "Bruschetta".to_string(),
                price: dec!(6.00),
                available: true,
            },
            vec![IngredientUse {
                ingredient_id: 1,
                quantity_per_unit: 1,
            }],
        );
        catalog
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let catalog = catalog();
        let item = catalog.find_by_id(100).await.unwrap();
        assert_eq!(item.name, "Margherita");
        assert!(item.available);
    }

    #[tokio::test]
    async fn test_unknown_menu_item() {
        let catalog = catalog();
        let result = catalog.find_by_id(999).await;
        assert!(matches!(result, Err(CatalogError::UnknownMenuItem(999))));
    }

    #[tokio::test]
    async fn test_ingredients_of() {
        let catalog = catalog();
        let uses = catalog.ingredients_of(100).await.unwrap();
        assert_eq!(uses.len(), 2);
        assert_eq!(uses[0].ingredient_id, 1);
        assert_eq!(uses[0].quantity_per_unit, 2);
    }

    #[tokio::test]
    async fn test_mark_unavailable_disables_items() {
        let catalog = catalog();
        catalog.mark_unavailable(&[100, 101]).await;

        assert!(!catalog.find_by_id(100).await.unwrap().available);
        assert!(!catalog.find_by_id(101).await.unwrap().available);
    }

    #[tokio::test]
    async fn test_operator_reenable() {
        let catalog = catalog();
        catalog.mark_unavailable(&[100]).await;

        let item = catalog.set_available(100, true).await.unwrap();
        assert!(item.available);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let catalog = catalog();
        let items = catalog.list().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].id < items[1].id);
    }
}
