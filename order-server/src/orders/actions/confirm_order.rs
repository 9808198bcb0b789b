//! ConfirmOrder - cashier approves a pending order
//!
//! Stamps the processor identity and hands the order to the kitchen.

use super::{apply_status, guard_transition};
use crate::orders::OrderResult;
use shared::order::types::ActorRef;
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus};

pub fn execute(
    order: &mut Order,
    actor: &ActorRef,
    note: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    guard_transition(order, OrderStatus::Confirmed, actor)?;

    apply_status(order, OrderStatus::Confirmed, actor, now, note);
    order.processed_by = actor.id.clone();
    order.processed_at = Some(now);

    let event = OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::OrderConfirmed,
        EventPayload::OrderConfirmed { order: Box::new(order.clone()) },
    );
    Ok(vec![event])
}
