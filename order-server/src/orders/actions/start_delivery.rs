//! StartDelivery - the assigned shipper departs with the order

use super::{apply_status, ensure_assigned_shipper, guard_transition};
use crate::orders::{OrderError, OrderResult};
use shared::order::types::{ActorRef, OrderType};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus};

pub fn execute(order: &mut Order, actor: &ActorRef, now: i64) -> OrderResult<Vec<OrderEvent>> {
    guard_transition(order, OrderStatus::Delivering, actor)?;
    if order.order_type != OrderType::Delivery {
        return Err(OrderError::Validation(format!(
            "Order {} is not a delivery order",
            order.order_number
        )));
    }
    ensure_assigned_shipper(order, actor)?;

    order.shipper.picked_up_at = Some(now);
    apply_status(order, OrderStatus::Delivering, actor, now, None);

    Ok(vec![OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::DeliveryStarted,
        EventPayload::DeliveryStarted {},
    )])
}
