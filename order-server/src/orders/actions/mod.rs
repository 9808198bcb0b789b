//! Order action implementations
//!
//! Each action validates one operation against the loaded order, mutates it
//! in place, appends the audit entries, and returns the domain events to
//! broadcast after commit. Actions never persist anything themselves - the
//! manager owns the per-order lock and the write transaction, so a failing
//! action leaves no trace.

pub mod assign_shipper;
pub mod cancel_order;
pub mod complete_delivery;
pub mod complete_order;
pub mod confirm_order;
pub mod create_order;
pub mod delivery_attempt;
pub mod kitchen_progress;
pub mod payment;
pub mod start_delivery;

use crate::orders::{OrderError, OrderResult};
use shared::order::status::{self, OrderStatus};
use shared::order::types::ActorRef;
use shared::order::Order;

/// Check the transition table and the actor's role for the requested edge.
///
/// A structurally missing edge is `InvalidTransition`; an existing edge the
/// actor's role may not drive is `Forbidden`. Always checked in that order
/// so callers learn the strongest reason first.
pub(crate) fn guard_transition(
    order: &Order,
    to: OrderStatus,
    actor: &ActorRef,
) -> OrderResult<()> {
    let from = order.status;
    let roles = status::allowed_roles(from, to);
    if roles.is_empty() {
        return Err(OrderError::InvalidTransition { from, to });
    }
    if !roles.contains(&actor.role) {
        return Err(OrderError::Forbidden(format!(
            "{} may not move order {} from {from} to {to}",
            actor.role, order.order_number
        )));
    }
    Ok(())
}

/// Apply a guarded status change and append its audit entry. Callers must
/// have run [`guard_transition`] first.
pub(crate) fn apply_status(
    order: &mut Order,
    to: OrderStatus,
    actor: &ActorRef,
    now: i64,
    note: Option<String>,
) {
    let from = order.status;
    order.status = to;
    order.push_audit(
        "status_changed",
        actor.id.clone(),
        Some(actor.role),
        now,
        Some(from.to_string()),
        Some(to.to_string()),
        note,
    );
}

/// Delivery operations may only be driven by the assigned shipper (admins
/// can step in for any order).
pub(crate) fn ensure_assigned_shipper(order: &Order, actor: &ActorRef) -> OrderResult<()> {
    use shared::order::status::ActorRole;
    if actor.role == ActorRole::Admin {
        return Ok(());
    }
    let assigned = order.shipper.assigned_to.as_deref();
    match (assigned, actor.id.as_deref()) {
        (Some(a), Some(b)) if a == b => Ok(()),
        (None, _) => Err(OrderError::Conflict(format!(
            "Order {} has no shipper assigned",
            order.order_number
        ))),
        _ => Err(OrderError::Forbidden(format!(
            "Order {} is assigned to another shipper",
            order.order_number
        ))),
    }
}
