//! Kitchen progress - per-item status cascade and the ready override
//!
//! Item statuses flow `pending → cooking → done`. The aggregate order
//! status cascades from them: the first item going active moves a CONFIRMED
//! order to COOKING, and the order reaches READY only once every item is
//! DONE - or via the explicit whole-order override.

use super::{apply_status, guard_transition};
use crate::orders::{OrderError, OrderResult};
use shared::order::types::{ActorRef, KitchenStatus};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus};

/// Kitchen picks up the whole order (aggregate CONFIRMED → COOKING without
/// touching item statuses).
pub fn start_cooking(
    order: &mut Order,
    actor: &ActorRef,
    note: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    guard_transition(order, OrderStatus::Cooking, actor)?;
    apply_status(order, OrderStatus::Cooking, actor, now, note);

    Ok(vec![OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::CookingStarted,
        EventPayload::CookingStarted {},
    )])
}

/// Update a single item's kitchen status, cascading the aggregate status.
pub fn set_item_status(
    order: &mut Order,
    item_index: usize,
    status: KitchenStatus,
    actor: &ActorRef,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    if !matches!(order.status, OrderStatus::Confirmed | OrderStatus::Cooking) {
        return Err(OrderError::Conflict(format!(
            "Order {} is {} - kitchen updates only apply between CONFIRMED and READY",
            order.order_number, order.status
        )));
    }
    let item_count = order.items.len();
    let Some(item) = order.items.get_mut(item_index) else {
        return Err(OrderError::Validation(format!(
            "Item index {item_index} out of range (order has {item_count} items)"
        )));
    };

    let previous = item.kitchen_status;
    item.kitchen_status = status;
    order.push_audit(
        "item_status_changed",
        actor.id.clone(),
        Some(actor.role),
        now,
        Some(format!("{item_index}:{previous:?}")),
        Some(format!("{item_index}:{status:?}")),
        None,
    );

    let mut events = vec![OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::ItemStatusChanged,
        EventPayload::ItemStatusChanged { item_index, status },
    )];

    // Cascade: first active item pulls the aggregate into COOKING
    if order.status == OrderStatus::Confirmed
        && matches!(status, KitchenStatus::Cooking | KitchenStatus::Done)
    {
        guard_transition(order, OrderStatus::Cooking, actor)?;
        apply_status(order, OrderStatus::Cooking, actor, now, None);
        events.push(OrderEvent::for_order(
            order,
            actor.id.clone(),
            Some(actor.role),
            OrderEventType::CookingStarted,
            EventPayload::CookingStarted {},
        ));
    }

    // Cascade: last DONE item completes the kitchen's part
    if order.status == OrderStatus::Cooking && order.all_items_done() {
        guard_transition(order, OrderStatus::Ready, actor)?;
        apply_status(order, OrderStatus::Ready, actor, now, None);
        events.push(ready_event(order, actor));
    }

    Ok(events)
}

/// Explicit "mark whole order done" override: flags every item DONE and
/// moves the aggregate to READY in one step.
pub fn mark_order_ready(
    order: &mut Order,
    actor: &ActorRef,
    note: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    let mut events = Vec::new();

    // An order still CONFIRMED passes through COOKING so the audit trail
    // shows every edge it traversed.
    if order.status == OrderStatus::Confirmed {
        guard_transition(order, OrderStatus::Cooking, actor)?;
        apply_status(order, OrderStatus::Cooking, actor, now, None);
        events.push(OrderEvent::for_order(
            order,
            actor.id.clone(),
            Some(actor.role),
            OrderEventType::CookingStarted,
            EventPayload::CookingStarted {},
        ));
    }

    guard_transition(order, OrderStatus::Ready, actor)?;
    for item in &mut order.items {
        item.kitchen_status = KitchenStatus::Done;
    }
    apply_status(order, OrderStatus::Ready, actor, now, note);
    events.push(ready_event(order, actor));

    Ok(events)
}

fn ready_event(order: &Order, actor: &ActorRef) -> OrderEvent {
    OrderEvent::for_order(
        order,
        actor.id.clone(),
        Some(actor.role),
        OrderEventType::OrderReady,
        EventPayload::OrderReady {
            order_type: order.order_type,
            delivery_location: order.delivery_location.clone(),
            table_number: order.table_number.clone(),
            customer_name: order.customer.name.clone(),
            customer_phone: order.customer.phone.clone(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::delivery_order;
    use shared::order::status::ActorRole;

    fn kitchen() -> ActorRef {
        ActorRef::staff("kitchen-1", ActorRole::Kitchen)
    }

    #[test]
    fn test_first_item_cooking_cascades_aggregate() {
        let mut order = delivery_order(OrderStatus::Confirmed);

        let events =
            set_item_status(&mut order, 0, KitchenStatus::Cooking, &kitchen(), 5_000).unwrap();

        assert_eq!(order.status, OrderStatus::Cooking);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, OrderEventType::ItemStatusChanged);
        assert_eq!(events[1].event_type, OrderEventType::CookingStarted);
        // item change + status change
        assert_eq!(order.audit_log.len(), 2);
    }

    #[test]
    fn test_last_done_item_reaches_ready() {
        let mut order = delivery_order(OrderStatus::Confirmed);

        set_item_status(&mut order, 0, KitchenStatus::Done, &kitchen(), 5_000).unwrap();
        assert_eq!(order.status, OrderStatus::Cooking);

        let events =
            set_item_status(&mut order, 1, KitchenStatus::Done, &kitchen(), 6_000).unwrap();

        assert_eq!(order.status, OrderStatus::Ready);
        assert!(events.iter().any(|e| e.event_type == OrderEventType::OrderReady));
    }

    #[test]
    fn test_item_index_out_of_range() {
        let mut order = delivery_order(OrderStatus::Confirmed);
        let err =
            set_item_status(&mut order, 9, KitchenStatus::Cooking, &kitchen(), 5_000).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_item_update_on_pending_order_rejected() {
        let mut order = delivery_order(OrderStatus::Pending);
        let err =
            set_item_status(&mut order, 0, KitchenStatus::Cooking, &kitchen(), 5_000).unwrap_err();
        assert!(matches!(err, OrderError::Conflict(_)));
    }

    #[test]
    fn test_mark_ready_override_from_confirmed() {
        let mut order = delivery_order(OrderStatus::Confirmed);

        let events = mark_order_ready(&mut order, &kitchen(), None, 5_000).unwrap();

        assert_eq!(order.status, OrderStatus::Ready);
        assert!(order.all_items_done());
        // Audit shows CONFIRMED -> COOKING -> READY, not a skipped edge
        assert_eq!(order.audit_log.len(), 2);
        assert_eq!(events.last().unwrap().event_type, OrderEventType::OrderReady);
    }

    #[test]
    fn test_ready_event_carries_routing_fields() {
        let mut order = delivery_order(OrderStatus::Cooking);
        let events = mark_order_ready(&mut order, &kitchen(), None, 5_000).unwrap();
        match &events[0].payload {
            EventPayload::OrderReady { order_type, delivery_location, .. } => {
                assert_eq!(*order_type, shared::order::OrderType::Delivery);
                assert_eq!(delivery_location.as_deref(), Some("12A6"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
