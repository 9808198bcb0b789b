//! CancelOrder - terminal cancellation with stock restoration
//!
//! Customers may cancel only while the order is PENDING; cashier/admin may
//! cancel any non-terminal order. The action reports which reservations to
//! return; the manager restores them after the cancelled state is durably
//! committed, so a crash can never restore stock for an order that is still
//! live.

use super::{apply_status, guard_transition};
use crate::orders::OrderResult;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::order::status::PaymentStatus;
use shared::order::types::{ActorRef, Cancellation, RefundStatus};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus};

/// Stock to return after commit: (product_id, quantity)
pub type StockRestores = Vec<(String, u32)>;

pub fn execute(
    order: &mut Order,
    actor: &ActorRef,
    reason: Option<String>,
    now: i64,
) -> OrderResult<(Vec<OrderEvent>, StockRestores)> {
    guard_transition(order, OrderStatus::Cancelled, actor)?;
    validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;

    let reason = reason.unwrap_or_else(|| "Cancelled by customer".to_string());

    // Every reserved line goes back, matching exactly what creation took
    let restores: StockRestores = order
        .items
        .iter()
        .map(|item| (item.product_id.clone(), item.quantity))
        .collect();

    // A confirmed payment on a cancelled order awaits a refund
    let refund_status = if order.payment.status == PaymentStatus::Confirmed {
        RefundStatus::Pending
    } else {
        RefundStatus::None
    };

    order.cancellation = Some(Cancellation {
        cancelled_by: actor.id.clone(),
        role: actor.role,
        cancelled_at: now,
        reason: reason.clone(),
        refund_status,
    });
    apply_status(order, OrderStatus::Cancelled, actor, now, Some(reason.clone()));

    let event = OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::OrderCancelled,
        EventPayload::OrderCancelled { reason },
    );
    Ok((vec![event], restores))
}
