// HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::orders::{
    ActorRole, AdvanceOrderRequest, Order, OrderError, OrderListQuery, PlaceOrderRequest,
};

/// Header carrying the verified actor role
///
/// Authentication happens upstream; by the time a request reaches the engine
/// the gateway has already verified the caller and stamped this header.
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

fn actor_role(headers: &HeaderMap) -> Result<ActorRole, OrderError> {
    let raw = headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            OrderError::Unauthorized(format!("Missing {} header", ACTOR_ROLE_HEADER))
        })?;
    ActorRole::from_str(raw).map_err(OrderError::Unauthorized)
}

/// Handler for POST /api/orders
/// Places a new order after the geofence check
pub async fn place_order_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;
    if let Some(location) = &request.location {
        location
            .validate()
            .map_err(|_| OrderError::LocationUnavailable)?;
    }

    let order = state.order_service.place_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Handler for GET /api/orders/{order_id}
pub async fn get_order_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, OrderError> {
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(order))
}

/// Handler for GET /api/orders?customer_id=&status=
pub async fn list_orders_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Order>>, OrderError> {
    let orders = state
        .order_service
        .get_customer_orders(query.customer_id, query.status)
        .await;
    Ok(Json(orders))
}

/// Handler for PATCH /api/orders/{order_id}/status
/// Advances an order through its lifecycle, gated by the caller's role
pub async fn advance_order_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<AdvanceOrderRequest>,
) -> Result<Json<Order>, OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let role = actor_role(&headers)?;
    let order = state
        .order_service
        .advance_order(order_id, request.status, role, request.reason)
        .await?;
    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_role_header_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("operator"));
        assert_eq!(actor_role(&headers).unwrap(), ActorRole::Operator);
    }

    #[test]
    fn test_missing_role_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            actor_role(&headers),
            Err(OrderError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_unknown_role_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("superuser"));
        assert!(matches!(
            actor_role(&headers),
            Err(OrderError::Unauthorized(_))
        ));
    }
}
