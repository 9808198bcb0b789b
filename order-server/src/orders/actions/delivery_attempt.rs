//! LogDeliveryAttempt - record a failed hand-over while out on delivery

use super::ensure_assigned_shipper;
use crate::orders::{OrderError, OrderResult};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::order::types::{ActorRef, DeliveryAttempt, DeliveryFailure};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus};

pub fn execute(
    order: &mut Order,
    actor: &ActorRef,
    outcome: DeliveryFailure,
    note: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    if order.status != OrderStatus::Delivering {
        return Err(OrderError::Conflict(format!(
            "Order {} is {} - attempts are only logged while DELIVERING",
            order.order_number, order.status
        )));
    }
    ensure_assigned_shipper(order, actor)?;
    validate_optional_text(&note, "note", MAX_NOTE_LEN)?;

    order.shipper.delivery_attempts.push(DeliveryAttempt {
        attempted_at: now,
        outcome,
        note: note.clone(),
    });
    order.push_audit(
        "delivery_attempt",
        actor.id.clone(),
        Some(actor.role),
        now,
        None,
        Some(format!("{outcome:?}")),
        note.clone(),
    );

    Ok(vec![OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::DeliveryAttemptLogged,
        EventPayload::DeliveryAttemptLogged { outcome, note },
    )])
}
