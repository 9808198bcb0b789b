//! CompleteOrder - counter hand-over for dine-in and pickup orders
//!
//! Delivery orders never take this path; they complete through the shipper
//! flow with its cash-collection rule.

use super::{apply_status, guard_transition};
use crate::orders::{OrderError, OrderResult};
use shared::order::status::PaymentStatus;
use shared::order::types::{ActorRef, OrderType};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus};

pub fn execute(
    order: &mut Order,
    actor: &ActorRef,
    note: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    guard_transition(order, OrderStatus::Completed, actor)?;
    if order.order_type == OrderType::Delivery {
        return Err(OrderError::Validation(format!(
            "Order {} is a delivery order - it completes through the shipper flow",
            order.order_number
        )));
    }

    apply_status(order, OrderStatus::Completed, actor, now, note);

    Ok(vec![OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::OrderCompleted,
        EventPayload::OrderCompleted {
            order_type: order.order_type,
            payment_collected: order.payment.status == PaymentStatus::Confirmed,
        },
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{delivery_order, pickup_order};
    use shared::order::status::ActorRole;

    #[test]
    fn test_pickup_completes_at_counter() {
        let mut order = pickup_order(OrderStatus::Ready);
        let events = execute(
            &mut order,
            &ActorRef::staff("c1", ActorRole::Cashier),
            None,
            5_000,
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(events[0].event_type, OrderEventType::OrderCompleted);
    }

    #[test]
    fn test_delivery_orders_rejected_here() {
        let mut order = delivery_order(OrderStatus::Ready);
        let err = execute(
            &mut order,
            &ActorRef::staff("c1", ActorRole::Cashier),
            None,
            5_000,
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(order.status, OrderStatus::Ready);
    }

    #[test]
    fn test_shipper_cannot_complete_at_counter() {
        let mut order = pickup_order(OrderStatus::Ready);
        let err = execute(
            &mut order,
            &ActorRef::staff("s1", ActorRole::Shipper),
            None,
            5_000,
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::Forbidden(_)));
    }
}
