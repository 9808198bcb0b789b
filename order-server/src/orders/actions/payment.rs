//! Payment actions - the second, loosely-coupled state machine
//!
//! Payment progresses `PENDING → PROCESSING → CONFIRMED | FAILED` with
//! `CONFIRMED → REFUNDED` after cancellation. It moves independently of the
//! order status: an order can be READY while payment is still PROCESSING.

use crate::orders::{OrderError, OrderResult};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::order::status::{ActorRole, PaymentStatus};
use shared::order::types::{ActorRef, PaymentMethod, RefundStatus};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus, payment_can_transition};

fn guard_payment(order: &Order, to: PaymentStatus) -> OrderResult<PaymentStatus> {
    let from = order.payment.status;
    if !payment_can_transition(from, to) {
        return Err(OrderError::Conflict(format!(
            "Payment of order {} is {from} - cannot move to {to}",
            order.order_number
        )));
    }
    Ok(from)
}

fn guard_staff(actor: &ActorRef) -> OrderResult<()> {
    if !matches!(actor.role, ActorRole::Cashier | ActorRole::Admin) {
        return Err(OrderError::Forbidden(format!(
            "{} may not verify payments",
            actor.role
        )));
    }
    Ok(())
}

/// Customer claims the bank transfer was made (PENDING → PROCESSING)
pub fn claim(order: &mut Order, now: i64) -> OrderResult<Vec<OrderEvent>> {
    if order.payment.method != PaymentMethod::BankTransfer {
        return Err(OrderError::Validation(format!(
            "Order {} is not paid by bank transfer",
            order.order_number
        )));
    }
    let from = guard_payment(order, PaymentStatus::Processing)?;

    order.payment.customer_claimed_paid = true;
    order.payment.claimed_at = Some(now);
    order.payment.status = PaymentStatus::Processing;
    order.push_audit(
        "payment_claimed",
        None,
        Some(ActorRole::Customer),
        now,
        Some(from.to_string()),
        Some(PaymentStatus::Processing.to_string()),
        None,
    );

    Ok(vec![OrderEvent::for_order(
        order,
        None,
        Some(ActorRole::Customer),
        OrderEventType::PaymentClaimed,
        EventPayload::PaymentClaimed {
            amount: order.pricing.total,
            customer_phone: order.customer.phone.clone(),
            claimed_at: now,
        },
    )])
}

/// Staff verifies the transfer (PENDING|PROCESSING → CONFIRMED)
pub fn confirm(
    order: &mut Order,
    actor: &ActorRef,
    transaction_ref: Option<String>,
    note: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    guard_staff(actor)?;
    validate_optional_text(&note, "note", MAX_NOTE_LEN)?;
    let from = guard_payment(order, PaymentStatus::Confirmed)?;

    order.payment.status = PaymentStatus::Confirmed;
    order.payment.confirmed_by = actor.id.clone();
    order.payment.confirmed_at = Some(now);
    order.payment.transaction_ref = transaction_ref;
    order.push_audit(
        "payment_confirmed",
        actor.id.clone(),
        Some(actor.role),
        now,
        Some(from.to_string()),
        Some(PaymentStatus::Confirmed.to_string()),
        note,
    );

    Ok(vec![OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::PaymentConfirmed,
        EventPayload::PaymentConfirmed {},
    )])
}

/// Staff rejects a claimed transfer (PROCESSING → FAILED)
pub fn fail(
    order: &mut Order,
    actor: &ActorRef,
    reason: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    guard_staff(actor)?;
    validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;
    let from = guard_payment(order, PaymentStatus::Failed)?;

    order.payment.status = PaymentStatus::Failed;
    order.payment.customer_claimed_paid = false;
    order.push_audit(
        "payment_failed",
        actor.id.clone(),
        Some(actor.role),
        now,
        Some(from.to_string()),
        Some(PaymentStatus::Failed.to_string()),
        reason.clone(),
    );

    Ok(vec![OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::PaymentFailed,
        EventPayload::PaymentFailed { reason },
    )])
}

/// Staff refunds a confirmed payment on a cancelled order
/// (CONFIRMED → REFUNDED)
pub fn refund(order: &mut Order, actor: &ActorRef, now: i64) -> OrderResult<Vec<OrderEvent>> {
    guard_staff(actor)?;
    if order.status != OrderStatus::Cancelled {
        return Err(OrderError::Conflict(format!(
            "Order {} is not cancelled - nothing to refund",
            order.order_number
        )));
    }
    let from = guard_payment(order, PaymentStatus::Refunded)?;

    order.payment.status = PaymentStatus::Refunded;
    if let Some(cancellation) = &mut order.cancellation {
        cancellation.refund_status = RefundStatus::Completed;
    }
    order.push_audit(
        "payment_refunded",
        actor.id.clone(),
        Some(actor.role),
        now,
        Some(from.to_string()),
        Some(PaymentStatus::Refunded.to_string()),
        None,
    );

    Ok(vec![OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::PaymentRefunded,
        EventPayload::PaymentRefunded {},
    )])
}
