//! CompleteDelivery - shipper hands the order over
//!
//! Cash orders must have the money collected before the transition is
//! allowed, unless an explicit force-complete override is supplied - the
//! override is audited with actor and reason and flagged on the payment
//! record for the daily reconciliation.

use super::{apply_status, ensure_assigned_shipper, guard_transition};
use crate::orders::{OrderError, OrderResult};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use shared::order::status::PaymentStatus;
use shared::order::types::{ActorRef, PaymentMethod};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus, payment_can_transition};

pub fn execute(
    order: &mut Order,
    actor: &ActorRef,
    payment_collected: bool,
    force_reason: Option<String>,
    note: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    guard_transition(order, OrderStatus::Completed, actor)?;
    ensure_assigned_shipper(order, actor)?;
    validate_optional_text(&note, "note", MAX_NOTE_LEN)?;

    if order.payment.method == PaymentMethod::Cash && !payment_collected {
        match &force_reason {
            None => {
                return Err(OrderError::Conflict(format!(
                    "Order {} is cash on delivery - collect payment or force-complete with a reason",
                    order.order_number
                )));
            }
            Some(reason) => {
                validate_required_text(reason, "force_reason", MAX_NOTE_LEN)?;
                order.payment.force_completed = true;
                order.payment.force_completed_by = actor.id.clone();
                order.payment.force_completed_reason = Some(reason.clone());
                order.push_audit(
                    "payment_force_completed",
                    actor.id.clone(),
                    Some(actor.role),
                    now,
                    None,
                    None,
                    Some(reason.clone()),
                );
            }
        }
    }

    let mut events = Vec::new();

    if payment_collected {
        order.shipper.payment_collected = true;
        order.shipper.payment_collected_at = Some(now);
        // Collected cash settles the payment machine on the spot
        let previous = order.payment.status;
        if payment_can_transition(previous, PaymentStatus::Confirmed) {
            order.payment.status = PaymentStatus::Confirmed;
            order.payment.confirmed_by = actor.id.clone();
            order.payment.confirmed_at = Some(now);
            order.push_audit(
                "payment_confirmed",
                actor.id.clone(),
                Some(actor.role),
                now,
                Some(previous.to_string()),
                Some(PaymentStatus::Confirmed.to_string()),
                Some("Collected on delivery".into()),
            );
            events.push(OrderEvent::for_order(
                order,
                actor.id.clone(),
                Some(actor.role),
                OrderEventType::PaymentConfirmed,
                EventPayload::PaymentConfirmed {},
            ));
        }
    }

    order.shipper.delivered_at = Some(now);
    apply_status(order, OrderStatus::Completed, actor, now, note);

    events.push(OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::OrderCompleted,
        EventPayload::OrderCompleted {
            order_type: order.order_type,
            payment_collected,
        },
    ));
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::delivery_order;
    use shared::order::status::ActorRole;

    fn cash_order() -> Order {
        let mut order = delivery_order(OrderStatus::Delivering);
        order.payment.method = PaymentMethod::Cash;
        order.shipper.assigned_to = Some("s1".into());
        order
    }

    fn shipper() -> ActorRef {
        ActorRef::staff("s1", ActorRole::Shipper)
    }

    #[test]
    fn test_cash_requires_collection() {
        let mut order = cash_order();
        let err = execute(&mut order, &shipper(), false, None, None, 5_000).unwrap_err();
        assert!(matches!(err, OrderError::Conflict(_)));
        assert_eq!(order.status, OrderStatus::Delivering);
    }

    #[test]
    fn test_cash_collected_confirms_payment_and_completes() {
        let mut order = cash_order();
        let events = execute(&mut order, &shipper(), true, None, None, 5_000).unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.payment.status, PaymentStatus::Confirmed);
        assert!(order.shipper.payment_collected);
        assert_eq!(order.shipper.delivered_at, Some(5_000));

        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![OrderEventType::PaymentConfirmed, OrderEventType::OrderCompleted]
        );
        // payment_confirmed + status_changed audit entries
        assert_eq!(order.audit_log.len(), 2);
    }

    #[test]
    fn test_force_complete_requires_reason_and_is_audited() {
        let mut order = cash_order();
        let err =
            execute(&mut order, &shipper(), false, Some("  ".into()), None, 5_000).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let mut order = cash_order();
        execute(
            &mut order,
            &shipper(),
            false,
            Some("Khách hẹn trả sau".into()),
            None,
            5_000,
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.payment.force_completed);
        assert_eq!(order.payment.force_completed_by.as_deref(), Some("s1"));
        assert!(order.audit_log.iter().any(|e| e.action == "payment_force_completed"));
        // Payment machine untouched by the override
        assert_eq!(order.payment.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_bank_transfer_completes_without_collection() {
        let mut order = delivery_order(OrderStatus::Delivering);
        order.shipper.assigned_to = Some("s1".into());
        order.payment.status = PaymentStatus::Confirmed;

        let events = execute(&mut order, &shipper(), false, None, None, 5_000).unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, OrderEventType::OrderCompleted);
    }

    #[test]
    fn test_complete_from_ready_is_invalid() {
        let mut order = cash_order();
        order.status = OrderStatus::Ready;
        let err = execute(&mut order, &shipper(), true, None, None, 5_000).unwrap_err();
        // READY -> COMPLETED exists for cashier, not shipper
        assert!(matches!(err, OrderError::Forbidden(_)));
    }
}
