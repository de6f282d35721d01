// Error handling for the top-level API handlers
// Domain modules carry their own error enums; this type covers the
// catalog/admin surface wired directly into the router.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::catalog::CatalogError;

/// Error type for the catalog and admin handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request failed validation (HTTP 400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed geolocation input (HTTP 400, distinct error code so the
    /// client retries location acquisition instead of showing a rejection)
    #[error("Invalid coordinates")]
    InvalidCoordinates,

    /// Resource not found by ID (HTTP 404)
    #[error("{resource} with id {id} not found")]
    NotFound { resource: String, id: String },

    /// Role check failed (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Anything unexpected (HTTP 500, details kept out of the response)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Consistent error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "NOT_FOUND")
    pub error_code: String,
    /// Human-readable error message
    pub message: String,
    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Validation(msg) => {
                debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            ApiError::InvalidCoordinates => {
                debug!("Rejected malformed coordinates");
                (
                    StatusCode::BAD_REQUEST,
                    "INVALID_COORDINATES",
                    "Latitude must be in [-90, 90] and longitude in [-180, 180]".to_string(),
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{} with id {} not found", resource, id),
                )
            }
            ApiError::Forbidden(msg) => {
                warn!("Forbidden access attempt: {}", msg);
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error_code: error_code.to_string(),
            message,
            timestamp: Utc::now().to_rfc3339(),
        });

        (status, body).into_response()
    }
}

impl From<crate::stock::StockError> for ApiError {
    fn from(err: crate::stock::StockError) -> Self {
        match err {
            crate::stock::StockError::UnknownIngredient(id) => ApiError::NotFound {
                resource: "Ingredient".to_string(),
                id: id.to_string(),
            },
            crate::stock::StockError::StoreError(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownMenuItem(id) => ApiError::NotFound {
                resource: "Menu item".to_string(),
                id: id.to_string(),
            },
            CatalogError::StoreError(e) => ApiError::Internal(e.to_string()),
        }
    }
}
