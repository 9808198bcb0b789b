//! Lifecycle flows, races, and the payment machine end to end

use super::{delivery_request, item_input, test_env};
use crate::orders::OrderError;
use shared::order::status::ActorRole;
use shared::order::types::{ActorRef, KitchenStatus, OrderType, PaymentMethod};
use shared::order::{OrderEventType, OrderStatus, PaymentStatus};

fn cashier() -> ActorRef {
    ActorRef::staff("cashier-1", ActorRole::Cashier)
}

fn kitchen() -> ActorRef {
    ActorRef::staff("kitchen-1", ActorRole::Kitchen)
}

fn shipper(id: &str) -> ActorRef {
    ActorRef::staff(id, ActorRole::Shipper)
}

#[tokio::test]
async fn test_full_delivery_lifecycle() {
    let env = test_env();
    let mut rx = env.manager.subscribe();

    let order = env
        .manager
        .create_order(delivery_request(vec![item_input("com-ga", 1), item_input("tra-sua", 1)]))
        .unwrap();
    let id = order.id.clone();

    env.manager
        .transition(&id, OrderStatus::Confirmed, cashier(), None)
        .await
        .unwrap();
    env.manager
        .set_item_status(&id, 0, KitchenStatus::Done, kitchen())
        .await
        .unwrap();
    let order = env
        .manager
        .set_item_status(&id, 1, KitchenStatus::Done, kitchen())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Ready);

    env.manager.claim_payment(&id).await.unwrap();
    env.manager
        .confirm_payment(&id, cashier(), Some("FT123".into()), None)
        .await
        .unwrap();

    env.manager.assign_shipper(&id, shipper("s1")).await.unwrap();
    env.manager.start_delivery(&id, shipper("s1")).await.unwrap();
    let order = env
        .manager
        .complete_delivery(&id, shipper("s1"), false, None, None)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment.status, PaymentStatus::Confirmed);

    // Audit trail: created + 5 status changes + item×2 (one also cascades
    // cooking + ready) + payment claim + payment confirm + assignment
    let status_entries: Vec<_> = order
        .audit_log
        .iter()
        .filter(|e| e.action == "status_changed")
        .collect();
    let traversed: Vec<_> = status_entries
        .iter()
        .map(|e| e.new_value.as_deref().unwrap())
        .collect();
    assert_eq!(
        traversed,
        vec!["CONFIRMED", "COOKING", "READY", "DELIVERING", "COMPLETED"]
    );

    // Every broadcast event arrived in commit order
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event.event_type);
    }
    assert_eq!(seen.first(), Some(&OrderEventType::OrderCreated));
    assert!(seen.contains(&OrderEventType::OrderReady));
    assert!(seen.contains(&OrderEventType::ShipperAssigned));
    assert_eq!(seen.last(), Some(&OrderEventType::OrderCompleted));
}

#[tokio::test]
async fn test_pickup_completes_at_counter() {
    let env = test_env();
    let mut req = delivery_request(vec![item_input("com-ga", 1)]);
    req.order_type = OrderType::Pickup;
    req.delivery_location = None;
    let order = env.manager.create_order(req).unwrap();

    env.manager
        .transition(&order.id, OrderStatus::Confirmed, cashier(), None)
        .await
        .unwrap();
    env.manager
        .transition(&order.id, OrderStatus::Ready, kitchen(), None)
        .await
        .unwrap();
    let order = env
        .manager
        .transition(&order.id, OrderStatus::Completed, cashier(), None)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_cancel_pending_restores_stock_round_trip() {
    let env = test_env();
    let before = env.catalog.current_stock("com-ga").unwrap();

    let order = env
        .manager
        .create_order(delivery_request(vec![item_input("com-ga", 3)]))
        .unwrap();
    assert_eq!(env.catalog.current_stock("com-ga"), Some(before - 3));

    let cancelled = env
        .manager
        .cancel_order(&order.id, ActorRef::customer(), Some("Đặt nhầm".into()))
        .await
        .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(env.catalog.current_stock("com-ga"), Some(before));
    assert_eq!(cancelled.cancellation.as_ref().unwrap().reason, "Đặt nhầm");
}

#[tokio::test]
async fn test_confirm_and_cancel_race_has_one_winner() {
    // Run the race many times; whichever operation wins, the loser must get
    // a clean rejection and the audit log must show exactly one terminal
    // outcome.
    for _ in 0..25 {
        let env = test_env();
        let order = env
            .manager
            .create_order(delivery_request(vec![item_input("com-ga", 1)]))
            .unwrap();
        let id = order.id.clone();

        let confirm =
            env.manager
                .transition(&id, OrderStatus::Confirmed, cashier(), None);
        let cancel = env.manager.cancel_order(&id, ActorRef::customer(), None);
        let (confirm_result, cancel_result) = tokio::join!(confirm, cancel);

        let final_order = env.manager.get_order(&id).unwrap();
        match (confirm_result.is_ok(), cancel_result.is_ok()) {
            (true, false) => {
                assert_eq!(final_order.status, OrderStatus::Confirmed);
                assert!(matches!(
                    cancel_result.unwrap_err(),
                    OrderError::Forbidden(_) | OrderError::InvalidTransition { .. }
                ));
                assert_eq!(env.catalog.current_stock("com-ga"), Some(9));
            }
            (false, true) => {
                assert_eq!(final_order.status, OrderStatus::Cancelled);
                assert!(matches!(
                    confirm_result.unwrap_err(),
                    OrderError::InvalidTransition { .. }
                ));
                // Cancellation restored the reservation
                assert_eq!(env.catalog.current_stock("com-ga"), Some(10));
            }
            other => panic!("expected exactly one winner, got {other:?}"),
        }

        let status_changes = final_order
            .audit_log
            .iter()
            .filter(|e| e.action == "status_changed")
            .count();
        assert_eq!(status_changes, 1);
    }
}

#[tokio::test]
async fn test_two_shippers_race_for_one_order() {
    let env = test_env();
    let order = env
        .manager
        .create_order(delivery_request(vec![item_input("com-ga", 1)]))
        .unwrap();
    let id = order.id.clone();

    env.manager
        .transition(&id, OrderStatus::Confirmed, cashier(), None)
        .await
        .unwrap();
    env.manager
        .transition(&id, OrderStatus::Ready, kitchen(), None)
        .await
        .unwrap();

    let grab1 = env.manager.assign_shipper(&id, shipper("s1"));
    let grab2 = env.manager.assign_shipper(&id, shipper("s2"));
    let (r1, r2) = tokio::join!(grab1, grab2);

    assert_ne!(r1.is_ok(), r2.is_ok(), "exactly one shipper must win");
    let order = env.manager.get_order(&id).unwrap();
    assert!(order.shipper.assigned_to.is_some());
}

#[tokio::test]
async fn test_cash_delivery_force_complete_is_audited() {
    let env = test_env();
    let mut req = delivery_request(vec![item_input("com-ga", 1)]);
    req.payment_method = PaymentMethod::Cash;
    let order = env.manager.create_order(req).unwrap();
    let id = order.id.clone();

    env.manager
        .transition(&id, OrderStatus::Confirmed, cashier(), None)
        .await
        .unwrap();
    env.manager
        .transition(&id, OrderStatus::Ready, kitchen(), None)
        .await
        .unwrap();
    env.manager.assign_shipper(&id, shipper("s1")).await.unwrap();
    env.manager.start_delivery(&id, shipper("s1")).await.unwrap();

    // Without collection or override: rejected
    let err = env
        .manager
        .complete_delivery(&id, shipper("s1"), false, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Conflict(_)));

    // With the audited override: accepted
    let order = env
        .manager
        .complete_delivery(&id, shipper("s1"), false, Some("Khách quen, trả sau".into()), None)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.payment.force_completed);
    assert!(order.audit_log.iter().any(|e| e.action == "payment_force_completed"));
}

#[tokio::test]
async fn test_refund_flow_after_staff_cancel() {
    let env = test_env();
    let order = env
        .manager
        .create_order(delivery_request(vec![item_input("com-ga", 1)]))
        .unwrap();
    let id = order.id.clone();

    env.manager.claim_payment(&id).await.unwrap();
    env.manager
        .confirm_payment(&id, cashier(), None, None)
        .await
        .unwrap();
    env.manager
        .cancel_order(&id, cashier(), Some("Bếp quá tải".into()))
        .await
        .unwrap();

    let order = env.manager.refund_payment(&id, cashier()).await.unwrap();
    assert_eq!(order.payment.status, PaymentStatus::Refunded);
    assert_eq!(
        order.cancellation.as_ref().unwrap().refund_status,
        shared::order::RefundStatus::Completed
    );
}

#[tokio::test]
async fn test_kitchen_queue_aggregates_by_zone() {
    let env = test_env();
    let o1 = env
        .manager
        .create_order(delivery_request(vec![item_input("tra-sua", 2)]))
        .unwrap();
    let o2 = env
        .manager
        .create_order(delivery_request(vec![item_input("tra-sua", 1), item_input("com-ga", 1)]))
        .unwrap();
    for id in [&o1.id, &o2.id] {
        env.manager
            .transition(id, OrderStatus::Confirmed, cashier(), None)
            .await
            .unwrap();
    }

    let (orders, aggregated) = env
        .manager
        .kitchen_orders(Some(shared::models::KitchenZone::Beverage))
        .unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(aggregated.len(), 1);
    assert_eq!(aggregated[0].product_name, "Trà sữa");
    assert_eq!(aggregated[0].quantity, 3);
}

#[tokio::test]
async fn test_shipper_console_lists() {
    let env = test_env();
    let order = env
        .manager
        .create_order(delivery_request(vec![item_input("com-ga", 1)]))
        .unwrap();
    let id = order.id.clone();
    env.manager
        .transition(&id, OrderStatus::Confirmed, cashier(), None)
        .await
        .unwrap();
    env.manager
        .transition(&id, OrderStatus::Ready, kitchen(), None)
        .await
        .unwrap();

    let (available, mine) = env.manager.shipper_orders("s1").unwrap();
    assert_eq!(available.len(), 1);
    assert!(mine.is_empty());

    env.manager.assign_shipper(&id, shipper("s1")).await.unwrap();
    let (available, mine) = env.manager.shipper_orders("s1").unwrap();
    assert!(available.is_empty());
    assert_eq!(mine.len(), 1);
}
