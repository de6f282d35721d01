use std::sync::Arc;
use uuid::Uuid;

use crate::orders::{Order, OrderError, OrderStatus};
use crate::store::{MemoryStore, StoreError, Versioned};

/// Repository for order records over the record store
///
/// Exposes versioned reads and compare-and-swap writes so the service layer
/// can serialize transitions per order without a global lock. Orders are
/// created and updated, never deleted.
#[derive(Clone)]
pub struct OrdersRepository {
    orders: Arc<MemoryStore<Uuid, Order>>,
}

impl OrdersRepository {
    /// Create a new OrdersRepository
    pub fn new(orders: Arc<MemoryStore<Uuid, Order>>) -> Self {
        Self { orders }
    }

    /// Persist a freshly constructed order
    pub async fn create(&self, order: Order) -> Order {
        self.orders.put(order.id, order.clone());
        order
    }

    /// Find an order by ID
    pub async fn find_by_id(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.orders
            .get(&order_id)
            .map(|versioned| versioned.record)
            .ok_or(OrderError::NotFound)
    }

    /// Versioned read for a read-modify-write cycle
    pub async fn find_versioned(&self, order_id: Uuid) -> Result<Versioned<Order>, OrderError> {
        self.orders.get(&order_id).ok_or(OrderError::NotFound)
    }

    /// Replace an order only if it is still at `expected_version`
    ///
    /// Returns `StoreError::VersionConflict` (wrapped) when another writer
    /// got there first; the caller re-reads and re-validates.
    pub async fn replace_if_unchanged(
        &self,
        order_id: Uuid,
        expected_version: u64,
        order: Order,
    ) -> Result<Order, OrderError> {
        match self
            .orders
            .compare_and_swap(&order_id, expected_version, order)
        {
            Ok(stored) => Ok(stored.record),
            Err(StoreError::NotFound) => Err(OrderError::NotFound),
            Err(e) => Err(OrderError::StoreError(e)),
        }
    }

    /// Find orders for a customer with optional status filter,
    /// newest first
    pub async fn find_by_customer(
        &self,
        customer_id: i32,
        status: Option<OrderStatus>,
    ) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .scan()
            .map(|(_, versioned)| versioned.record)
            .filter(|order| order.customer_id == customer_id)
            .filter(|order| status.map_or(true, |wanted| order.status == wanted))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}
