use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::catalog::CatalogError;
use crate::store::StoreError;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,

    /// Data-integrity error: the cart references an item the catalog
    /// does not know.
    #[error("Menu item not found: {0}")]
    UnknownMenuItem(i32),

    #[error("Menu item {0} is currently unavailable")]
    ItemUnavailable(i32),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Valid location, outside the geofence. Retryable by moving closer.
    #[error("Location rejected: {distance_meters} m from the restaurant")]
    LocationRejected { distance_meters: u64 },

    /// Missing or malformed location. Retryable by re-acquiring the
    /// device's position. Deliberately distinct from `LocationRejected`.
    #[error("Location unavailable or invalid")]
    LocationUnavailable,

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Role check failed; not retryable without different credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl From<CatalogError> for OrderError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownMenuItem(id) => OrderError::UnknownMenuItem(id),
            CatalogError::StoreError(e) => OrderError::StoreError(e),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            OrderError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Order not found" }),
            ),
            OrderError::UnknownMenuItem(id) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Menu item with id {} not found", id) }),
            ),
            OrderError::ItemUnavailable(id) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Menu item {} is currently unavailable", id) }),
            ),
            OrderError::InvalidQuantity(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            OrderError::LocationRejected { distance_meters } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Delivery location is outside the service area",
                    "distance_meters": distance_meters,
                }),
            ),
            OrderError::LocationUnavailable => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Location unavailable; please re-check your position" }),
            ),
            OrderError::InvalidTransition(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            OrderError::Unauthorized(msg) => {
                (StatusCode::FORBIDDEN, json!({ "error": msg }))
            }
            OrderError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            OrderError::StoreError(e) => {
                tracing::error!("Order store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal storage error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
