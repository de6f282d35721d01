use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::geo::Coordinates;

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of the caller requesting a lifecycle transition
///
/// Verifying the role claim is the external auth collaborator's job; the
/// engine only decides whether a verified role may perform a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Customer,
    Operator,
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Customer => "customer",
            ActorRole::Operator => "operator",
            ActorRole::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "customer" => Ok(ActorRole::Customer),
            "operator" => Ok(ActorRole::Operator),
            "system" => Ok(ActorRole::System),
            _ => Err(format!("Invalid actor role: {}", s)),
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ordered line with its price frozen at placement time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: i32,
    pub quantity: i32,
    /// Unit price captured when the order was placed; later catalog price
    /// changes never alter a placed order.
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Domain model representing an order
///
/// `total` is computed once at creation and never recomputed. Orders are
/// never deleted: they end in `delivered` or `cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: i32,
    pub items: Vec<OrderLine>,
    pub total: Decimal,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    /// Simulation orders exercise the lifecycle without touching real stock
    /// or loyalty ledgers.
    pub simulation: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for one cart line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItemRequest {
    pub menu_item_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub note: Option<String>,
}

/// Reported device location at checkout
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct ReportedLocation {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub longitude: f64,
}

impl From<ReportedLocation> for Coordinates {
    fn from(location: ReportedLocation) -> Self {
        Coordinates::new(location.latitude, location.longitude)
    }
}

/// Request DTO for placing an order
#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    pub customer_id: i32,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<CartItemRequest>,
    /// Required for real orders; simulation orders skip the geofence
    pub location: Option<ReportedLocation>,
    pub fulfillment_method: Option<String>,
    #[serde(default)]
    pub simulation: bool,
}

/// Request DTO for advancing an order's lifecycle
#[derive(Debug, Deserialize, Validate)]
pub struct AdvanceOrderRequest {
    pub status: OrderStatus,
    /// Captured on the order when the target status is `cancelled`
    pub reason: Option<String>,
}

/// Query parameters for order listing
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub customer_id: i32,
    pub status: Option<OrderStatus>,
}
