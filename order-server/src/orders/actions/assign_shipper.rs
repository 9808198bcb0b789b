//! AssignShipper - a rider grabs a ready delivery order
//!
//! Assignment is first-come-first-served: the second rider to grab the same
//! order gets a conflict, and the fan-out tells every shipper client to drop
//! it from the available list.

use crate::orders::{OrderError, OrderResult};
use shared::order::status::ActorRole;
use shared::order::types::{ActorRef, OrderType};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus};

pub fn execute(
    order: &mut Order,
    actor: &ActorRef,
    shipper_name: String,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    if !matches!(actor.role, ActorRole::Shipper | ActorRole::Admin) {
        return Err(OrderError::Forbidden(format!(
            "{} may not take delivery orders",
            actor.role
        )));
    }
    let Some(shipper_id) = actor.id.clone() else {
        return Err(OrderError::Validation("shipper id is required".into()));
    };
    if order.order_type != OrderType::Delivery {
        return Err(OrderError::Validation(format!(
            "Order {} is not a delivery order",
            order.order_number
        )));
    }
    if order.status != OrderStatus::Ready {
        return Err(OrderError::Conflict(format!(
            "Order {} is {} - only READY orders can be taken",
            order.order_number, order.status
        )));
    }
    if let Some(existing) = &order.shipper.assigned_to {
        return Err(OrderError::Conflict(format!(
            "Order {} already taken by shipper {existing}",
            order.order_number
        )));
    }

    order.shipper.assigned_to = Some(shipper_id.clone());
    order.shipper.assigned_name = Some(shipper_name.clone());
    order.shipper.assigned_at = Some(now);
    order.push_audit(
        "shipper_assigned",
        Some(shipper_id.clone()),
        Some(actor.role),
        now,
        None,
        Some(shipper_id.clone()),
        None,
    );

    Ok(vec![OrderEvent::for_order(
        order,
        Some(shipper_id.clone()),
        Some(actor.role),
        OrderEventType::ShipperAssigned,
        EventPayload::ShipperAssigned { shipper_id, shipper_name },
    )])
}
