//! The order aggregate
//!
//! All mutation goes through the manager's actions; the methods here are
//! queries plus the append-only audit hook. The struct itself is the wire
//! format for both persistence and full-order client events.

use super::status::{ActorRole, OrderStatus};
use super::types::{
    AuditEntry, Cancellation, CustomerInfo, InternalNote, KitchenStatus, OrderItem, OrderType,
    PaymentInfo, PaymentMethod, Pricing, Priority, ShipperInfo,
};
use serde::{Deserialize, Serialize};

/// Central order aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Stable internal id
    pub id: String,
    /// Globally unique sequential number, `ORD-YYYYMMDD-####`, reset daily
    pub order_number: String,
    /// Human-facing display code `A01..Z99`, then `AA01..`, daily cycle
    pub shortcode: String,
    pub customer: CustomerInfo,
    pub items: Vec<OrderItem>,
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(default)]
    pub is_gift: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift_message: Option<String>,
    #[serde(default)]
    pub hide_gift_sender: bool,
    pub status: OrderStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub payment: PaymentInfo,
    pub pricing: Pricing,
    #[serde(default)]
    pub shipper: ShipperInfo,
    /// Append-only; every status/payment transition appends exactly one entry
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Cancellation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internal_notes: Vec<InternalNote>,
    /// Cashier who confirmed the order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Customer-initiated cancel window
    pub fn can_customer_cancel(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Minutes since creation (stale-order warnings on the cashier console)
    pub fn age_minutes(&self, now_millis: i64) -> i64 {
        (now_millis - self.created_at) / 60_000
    }

    /// All items individually marked done (aggregate-ready condition)
    pub fn all_items_done(&self) -> bool {
        !self.items.is_empty()
            && self.items.iter().all(|i| i.kitchen_status == KitchenStatus::Done)
    }

    /// Whether completing delivery requires the cash-collected flag
    pub fn requires_cash_collection(&self) -> bool {
        self.payment.method == PaymentMethod::Cash
    }

    /// Append an audit entry. This is the only supported way to touch the
    /// audit log; entries are never edited or removed.
    pub fn push_audit(
        &mut self,
        action: &str,
        actor_id: Option<String>,
        actor_role: Option<ActorRole>,
        timestamp: i64,
        previous_value: Option<String>,
        new_value: Option<String>,
        note: Option<String>,
    ) {
        self.audit_log.push(AuditEntry {
            action: action.to_string(),
            actor_id,
            actor_role,
            timestamp,
            previous_value,
            new_value,
            note,
        });
        self.updated_at = timestamp;
    }

    /// Sort key for queue views: priority first, then FIFO, then order
    /// number as a deterministic tie-break.
    pub fn queue_key(&self) -> (i32, i64, String) {
        (-self.priority.score, self.created_at, self.order_number.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::types::{KitchenStatus, OrderItem};
    use crate::models::product::KitchenZone;

    fn item(status: KitchenStatus) -> OrderItem {
        OrderItem {
            product_id: "p1".into(),
            product_name: "Cơm gà".into(),
            product_price: 35_000,
            quantity: 1,
            size: None,
            sugar_level: None,
            ice_level: None,
            toppings: vec![],
            required_option: None,
            note: None,
            kitchen_zone: KitchenZone::HotKitchen,
            kitchen_status: status,
            item_total: 35_000,
        }
    }

    fn order_with_items(items: Vec<OrderItem>) -> Order {
        Order {
            id: "o1".into(),
            order_number: "ORD-20260805-0001".into(),
            shortcode: "A01".into(),
            customer: CustomerInfo {
                name: "Nguyen Van A".into(),
                phone: "0912345678".into(),
                class_tag: None,
                account_id: None,
            },
            items,
            order_type: OrderType::Delivery,
            delivery_location: Some("12A6".into()),
            table_number: None,
            is_gift: false,
            gift_message: None,
            hide_gift_sender: false,
            status: OrderStatus::Pending,
            priority: Priority::default(),
            payment: PaymentInfo::default(),
            pricing: Pricing { subtotal: 35_000, total: 35_000, ..Default::default() },
            shipper: ShipperInfo::default(),
            audit_log: vec![],
            cancellation: None,
            internal_notes: vec![],
            processed_by: None,
            processed_at: None,
            estimated_ready_at: None,
            estimated_delivery_at: None,
            created_at: 1_000,
            updated_at: 1_000,
        }
    }

    #[test]
    fn test_all_items_done_cascade_condition() {
        let mut order = order_with_items(vec![
            item(KitchenStatus::Done),
            item(KitchenStatus::Cooking),
        ]);
        assert!(!order.all_items_done());
        order.items[1].kitchen_status = KitchenStatus::Done;
        assert!(order.all_items_done());
    }

    #[test]
    fn test_empty_order_is_not_done() {
        let order = order_with_items(vec![]);
        assert!(!order.all_items_done());
    }

    #[test]
    fn test_push_audit_appends_and_bumps_updated_at() {
        let mut order = order_with_items(vec![item(KitchenStatus::Pending)]);
        order.push_audit(
            "status_changed",
            Some("u1".into()),
            Some(ActorRole::Cashier),
            2_000,
            Some("PENDING".into()),
            Some("CONFIRMED".into()),
            None,
        );
        assert_eq!(order.audit_log.len(), 1);
        assert_eq!(order.updated_at, 2_000);
        assert_eq!(order.audit_log[0].previous_value.as_deref(), Some("PENDING"));
    }

    #[test]
    fn test_queue_key_orders_by_priority_then_age() {
        let mut urgent = order_with_items(vec![]);
        urgent.priority.score = 100;
        urgent.created_at = 5_000;
        let mut older = order_with_items(vec![]);
        older.created_at = 1_000;
        // Urgent sorts before older despite being newer
        assert!(urgent.queue_key() < older.queue_key());
    }
}
