use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::CatalogRepository;
use crate::geo::{GeoError, GeoValidator};
use crate::loyalty::{LoyaltyCalculator, LoyaltyRepository};
use crate::orders::{
    ActorRole, Order, OrderError, OrderLine, OrderStatus, PlaceOrderRequest, PriceCalculator,
    StatusMachine, TransitionPolicy,
};
use crate::stock::StockLedger;

/// Service for order business logic
///
/// Orchestrates geofence validation at checkout, order creation, lifecycle
/// transitions, and the delivery-time stock and loyalty bookkeeping.
#[derive(Clone)]
pub struct OrderService {
    orders_repo: crate::orders::OrdersRepository,
    catalog: CatalogRepository,
    stock: StockLedger,
    loyalty_repo: LoyaltyRepository,
    loyalty_calculator: LoyaltyCalculator,
    geo_validator: GeoValidator,
    policy: Arc<dyn TransitionPolicy>,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(
        orders_repo: crate::orders::OrdersRepository,
        catalog: CatalogRepository,
        stock: StockLedger,
        loyalty_repo: LoyaltyRepository,
        loyalty_calculator: LoyaltyCalculator,
        geo_validator: GeoValidator,
        policy: Arc<dyn TransitionPolicy>,
    ) -> Self {
        Self {
            orders_repo,
            catalog,
            stock,
            loyalty_repo,
            loyalty_calculator,
            geo_validator,
            policy,
        }
    }

    /// Place a new order
    ///
    /// Real orders are gated by the geofence before anything else happens: a
    /// rejected or unavailable location creates no order, adjusts no stock,
    /// and grants no points. Prices are snapshotted from the catalog and the
    /// total is frozen at creation. Stock and loyalty are NOT touched here;
    /// they settle when the order reaches `delivered`.
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, OrderError> {
        if request.items.is_empty() {
            return Err(OrderError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }

        if !request.simulation {
            let location = request.location.ok_or(OrderError::LocationUnavailable)?;
            let decision = self
                .geo_validator
                .validate(location.into())
                .map_err(|e| match e {
                    GeoError::InvalidCoordinates => OrderError::LocationUnavailable,
                })?;
            if !decision.eligible {
                tracing::debug!(
                    "Order for customer {} rejected at {} m from the restaurant",
                    request.customer_id,
                    decision.distance_meters
                );
                return Err(OrderError::LocationRejected {
                    distance_meters: decision.distance_meters,
                });
            }
        }

        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(OrderError::InvalidQuantity(format!(
                    "Quantity must be positive, got {}",
                    item.quantity
                )));
            }

            let menu_item = self.catalog.find_by_id(item.menu_item_id).await?;
            if !menu_item.available {
                return Err(OrderError::ItemUnavailable(item.menu_item_id));
            }

            lines.push(OrderLine {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                unit_price: menu_item.price,
                note: item.note.clone(),
            });
        }

        let total = PriceCalculator::order_total(&lines);
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            items: lines,
            total,
            status: OrderStatus::Pending,
            fulfillment_method: request.fulfillment_method,
            cancellation_reason: None,
            simulation: request.simulation,
            created_at: now,
            updated_at: now,
        };

        let order = self.orders_repo.create(order).await;
        tracing::info!(
            "Created {}order {} for customer {} totalling {}",
            if order.simulation { "simulation " } else { "" },
            order.id,
            order.customer_id,
            order.total
        );
        Ok(order)
    }

    /// Advance an order through its lifecycle
    ///
    /// Role policy and state machine both have to agree before the status is
    /// written. The write goes through compare-and-swap, so two concurrent
    /// requests on the same order serialize; the loser re-validates against
    /// the new status and fails cleanly. Reaching `delivered` on a real order
    /// settles stock and loyalty afterwards; failures there are reported
    /// loudly but never roll back the delivered order.
    pub async fn advance_order(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        role: ActorRole,
        reason: Option<String>,
    ) -> Result<Order, OrderError> {
        let order = loop {
            let versioned = self.orders_repo.find_versioned(order_id).await?;
            let current = &versioned.record;

            StatusMachine::transition(current.status, target)
                .map_err(OrderError::InvalidTransition)?;

            if !self.policy.allows(role, current.status, target) {
                return Err(OrderError::Unauthorized(format!(
                    "Role {} may not move order from {} to {}",
                    role, current.status, target
                )));
            }

            let mut updated = current.clone();
            updated.status = target;
            updated.updated_at = Utc::now();
            if target == OrderStatus::Cancelled {
                updated.cancellation_reason = reason.clone();
            }

            match self
                .orders_repo
                .replace_if_unchanged(order_id, versioned.version, updated)
                .await
            {
                Ok(order) => break order,
                Err(OrderError::StoreError(crate::store::StoreError::VersionConflict {
                    ..
                })) => continue,
                Err(e) => return Err(e),
            }
        };

        tracing::info!(
            "Order {} moved to {} by {}",
            order.id,
            order.status,
            role
        );

        if target == OrderStatus::Delivered {
            self.settle_delivered_order(&order).await;
        }

        Ok(order)
    }

    // Delivery-time bookkeeping: deduct consumed ingredients and credit
    // loyalty points. Best effort once the order is delivered: each failure
    // is logged as an anomaly, never propagated back to the caller.
    async fn settle_delivered_order(&self, order: &Order) {
        if order.simulation {
            tracing::debug!(
                "Order {} is a simulation; skipping stock and loyalty settlement",
                order.id
            );
            return;
        }

        for line in &order.items {
            let uses = match self.catalog.ingredients_of(line.menu_item_id).await {
                Ok(uses) => uses,
                Err(e) => {
                    tracing::error!(
                        "Stock settlement for order {}: no ingredient mapping for menu item {}: {}",
                        order.id,
                        line.menu_item_id,
                        e
                    );
                    continue;
                }
            };

            for ingredient_use in uses {
                let delta = -(ingredient_use.quantity_per_unit * i64::from(line.quantity));
                match self.stock.adjust(ingredient_use.ingredient_id, delta).await {
                    Ok(adjustment) => {
                        if !adjustment.disabled_menu_items.is_empty() {
                            self.catalog
                                .mark_unavailable(&adjustment.disabled_menu_items)
                                .await;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            "Stock settlement failed for order {} (ingredient {}): {}; order stays delivered",
                            order.id,
                            ingredient_use.ingredient_id,
                            e
                        );
                    }
                }
            }
        }

        match self.loyalty_repo.find_by_customer(order.customer_id).await {
            Ok(account) => {
                match self
                    .loyalty_calculator
                    .points_earned(order.total, &account, Utc::now())
                {
                    Ok(points) => match self
                        .loyalty_repo
                        .credit_points(order.customer_id, points)
                        .await
                    {
                        Ok(account) => {
                            tracing::info!(
                                "Awarded {} loyalty points to customer {} for order {} (balance {})",
                                points,
                                order.customer_id,
                                order.id,
                                account.points
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to credit loyalty points for order {}: {}",
                                order.id,
                                e
                            );
                        }
                    },
                    Err(e) => {
                        tracing::warn!(
                            "Failed to calculate loyalty points for order {}: {}",
                            order.id,
                            e
                        );
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    "No loyalty account to credit for order {}: {}",
                    order.id,
                    e
                );
            }
        }
    }

    /// Get a specific order by ID
    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.orders_repo.find_by_id(order_id).await
    }

    /// Get all orders for a customer with optional status filter
    pub async fn get_customer_orders(
        &self,
        customer_id: i32,
        status: Option<OrderStatus>,
    ) -> Vec<Order> {
        self.orders_repo.find_by_customer(customer_id, status).await
    }
}
