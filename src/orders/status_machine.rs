use crate::orders::OrderStatus;

/// Service for managing order status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Accepted, Cancelled
    /// - Accepted → Preparing, Cancelled
    /// - Preparing → Ready
    /// - Ready → Delivered
    /// - Delivered, Cancelled → (terminal, nothing allowed)
    ///
    /// Everything else is rejected, including transitions to the current
    /// status and any cancellation once preparation has begun.
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (OrderStatus::Pending, OrderStatus::Accepted)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Accepted, OrderStatus::Preparing)
                | (OrderStatus::Accepted, OrderStatus::Cancelled)
                | (OrderStatus::Preparing, OrderStatus::Ready)
                | (OrderStatus::Ready, OrderStatus::Delivered)
        )
    }

    /// Attempt to transition from one status to another
    ///
    /// Returns `Ok(to)` if the transition is in the table, `Err(message)`
    /// otherwise. Never coerces an illegal request to a "nearest legal"
    /// state.
    pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    const VALID_TRANSITIONS: [(OrderStatus, OrderStatus); 6] = [
        (OrderStatus::Pending, OrderStatus::Accepted),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Accepted, OrderStatus::Preparing),
        (OrderStatus::Accepted, OrderStatus::Cancelled),
        (OrderStatus::Preparing, OrderStatus::Ready),
        (OrderStatus::Ready, OrderStatus::Delivered),
    ];

    #[test]
    fn test_all_table_transitions_allowed() {
        for (from, to) in VALID_TRANSITIONS {
            assert!(
                StatusMachine::is_valid_transition(from, to),
                "Transition from {} to {} should be allowed",
                from,
                to
            );
            assert_eq!(StatusMachine::transition(from, to), Ok(to));
        }
    }

    #[test]
    fn test_every_pair_outside_table_rejected() {
        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                if VALID_TRANSITIONS.contains(&(from, to)) {
                    continue;
                }
                assert!(
                    !StatusMachine::is_valid_transition(from, to),
                    "Transition from {} to {} should be rejected",
                    from,
                    to
                );
                let result = StatusMachine::transition(from, to);
                assert!(result.is_err());
                assert!(result
                    .unwrap_err()
                    .contains("Invalid status transition"));
            }
        }
    }

    #[test]
    fn test_same_status_is_rejected() {
        for status in ALL_STATUSES {
            assert!(!StatusMachine::is_valid_transition(status, status));
        }
    }

    #[test]
    fn test_cancellation_after_preparation_started_is_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Preparing,
            OrderStatus::Cancelled
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Ready,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for to in ALL_STATUSES {
                assert!(
                    !StatusMachine::is_valid_transition(terminal, to),
                    "No transition should be allowed from {} to {}",
                    terminal,
                    to
                );
            }
        }
    }

    #[test]
    fn test_no_skipping_forward() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Preparing
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Delivered
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Accepted,
            OrderStatus::Ready
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Preparing,
            OrderStatus::Delivered
        ));
    }

    #[test]
    fn test_no_moving_backward() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Accepted,
            OrderStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Preparing,
            OrderStatus::Accepted
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Ready,
            OrderStatus::Preparing
        ));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Pending),
            Just(OrderStatus::Accepted),
            Just(OrderStatus::Preparing),
            Just(OrderStatus::Ready),
            Just(OrderStatus::Delivered),
            Just(OrderStatus::Cancelled),
        ]
    }

    /// transition() and is_valid_transition() agree for every pair
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(
            from in order_status_strategy(),
            to in order_status_strategy()
        )| {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            let transition_result = StatusMachine::transition(from, to);

            if is_valid {
                prop_assert_eq!(transition_result, Ok(to));
            } else {
                prop_assert!(transition_result.is_err());
            }
        });
    }

    /// Terminal states never allow a transition out
    #[test]
    fn prop_terminal_states_are_final() {
        proptest!(|(to in order_status_strategy())| {
            prop_assert!(!StatusMachine::is_valid_transition(OrderStatus::Delivered, to));
            prop_assert!(!StatusMachine::is_valid_transition(OrderStatus::Cancelled, to));
        });
    }

    /// Cancellation is only reachable before preparation begins
    #[test]
    fn prop_cancellation_window() {
        proptest!(|(from in order_status_strategy())| {
            let allowed = StatusMachine::is_valid_transition(from, OrderStatus::Cancelled);
            let expected = matches!(from, OrderStatus::Pending | OrderStatus::Accepted);
            prop_assert_eq!(allowed, expected);
        });
    }
}
