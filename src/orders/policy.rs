// Transition role policy
//
// Decides which actor roles may request which lifecycle transitions. Kept as
// a swappable collaborator so authorization rules can change without touching
// the state machine or the service orchestration.

use crate::orders::{ActorRole, OrderStatus};

/// Role gate consulted before a lifecycle transition is applied
pub trait TransitionPolicy: Send + Sync {
    /// True if `role` may move an order from `from` to `to`
    ///
    /// Only consulted for transitions the state machine already allows;
    /// returning true for an illegal transition grants nothing.
    fn allows(&self, role: ActorRole, from: OrderStatus, to: OrderStatus) -> bool;
}

/// Default product policy
///
/// - Operators may perform any legal transition (accept, reject, fulfill).
/// - The automated fulfillment path runs accepted → preparing → ready →
///   delivered but may never accept or cancel.
/// - Customers may only withdraw their still-pending order.
#[derive(Debug, Clone, Default)]
pub struct DefaultTransitionPolicy;

impl TransitionPolicy for DefaultTransitionPolicy {
    fn allows(&self, role: ActorRole, from: OrderStatus, to: OrderStatus) -> bool {
        match role {
            ActorRole::Operator => true,
            ActorRole::System => matches!(
                (from, to),
                (OrderStatus::Accepted, OrderStatus::Preparing)
                    | (OrderStatus::Preparing, OrderStatus::Ready)
                    | (OrderStatus::Ready, OrderStatus::Delivered)
            ),
            ActorRole::Customer => {
                matches!((from, to), (OrderStatus::Pending, OrderStatus::Cancelled))
            }
        }
    }
}
