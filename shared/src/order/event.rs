//! Domain events emitted after a committed order mutation
//!
//! Events drive the realtime fan-out only. They are not a persistence
//! mechanism: delivery is best-effort and a reconnecting client re-pulls
//! current state over HTTP instead of replaying missed events.

use super::snapshot::Order;
use super::status::ActorRole;
use super::types::{DeliveryFailure, KitchenStatus, OrderType};
use serde::{Deserialize, Serialize};

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderCreated,
    OrderConfirmed,
    CookingStarted,
    ItemStatusChanged,
    OrderReady,
    ShipperAssigned,
    DeliveryStarted,
    DeliveryAttemptLogged,
    OrderCompleted,
    OrderCancelled,
    PaymentClaimed,
    PaymentConfirmed,
    PaymentFailed,
    PaymentRefunded,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderCreated => write!(f, "ORDER_CREATED"),
            OrderEventType::OrderConfirmed => write!(f, "ORDER_CONFIRMED"),
            OrderEventType::CookingStarted => write!(f, "COOKING_STARTED"),
            OrderEventType::ItemStatusChanged => write!(f, "ITEM_STATUS_CHANGED"),
            OrderEventType::OrderReady => write!(f, "ORDER_READY"),
            OrderEventType::ShipperAssigned => write!(f, "SHIPPER_ASSIGNED"),
            OrderEventType::DeliveryStarted => write!(f, "DELIVERY_STARTED"),
            OrderEventType::DeliveryAttemptLogged => write!(f, "DELIVERY_ATTEMPT_LOGGED"),
            OrderEventType::OrderCompleted => write!(f, "ORDER_COMPLETED"),
            OrderEventType::OrderCancelled => write!(f, "ORDER_CANCELLED"),
            OrderEventType::PaymentClaimed => write!(f, "PAYMENT_CLAIMED"),
            OrderEventType::PaymentConfirmed => write!(f, "PAYMENT_CONFIRMED"),
            OrderEventType::PaymentFailed => write!(f, "PAYMENT_FAILED"),
            OrderEventType::PaymentRefunded => write!(f, "PAYMENT_REFUNDED"),
        }
    }
}

/// Event payload variants - one per event type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    /// Full order for the cashier console + customer confirmation
    OrderCreated { order: Box<Order> },
    /// Full order for the kitchen display
    OrderConfirmed { order: Box<Order> },
    /// Kitchen picked the order up (aggregate, not per-item)
    CookingStarted {},
    ItemStatusChanged {
        item_index: usize,
        status: KitchenStatus,
    },
    OrderReady {
        order_type: OrderType,
        #[serde(skip_serializing_if = "Option::is_none")]
        delivery_location: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        table_number: Option<String>,
        customer_name: String,
        customer_phone: String,
    },
    ShipperAssigned {
        shipper_id: String,
        shipper_name: String,
    },
    DeliveryStarted {},
    DeliveryAttemptLogged {
        outcome: DeliveryFailure,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    OrderCompleted {
        order_type: OrderType,
        payment_collected: bool,
    },
    OrderCancelled { reason: String },
    PaymentClaimed {
        amount: i64,
        customer_phone: String,
        claimed_at: i64,
    },
    PaymentConfirmed {},
    PaymentFailed {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    PaymentRefunded {},
}

/// Domain event - one committed state change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderEvent {
    pub event_id: String,
    pub order_id: String,
    pub order_number: String,
    pub shortcode: String,
    /// For routing to the customer's live connection, when resolvable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_account: Option<String>,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_role: Option<ActorRole>,
    pub event_type: OrderEventType,
    pub payload: EventPayload,
}

impl OrderEvent {
    /// Build an event off a committed order state
    pub fn for_order(
        order: &Order,
        actor_id: Option<String>,
        actor_role: Option<ActorRole>,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            shortcode: order.shortcode.clone(),
            customer_account: order.customer.account_id.clone(),
            timestamp: crate::util::now_millis(),
            actor_id,
            actor_role,
            event_type,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_tagging() {
        let payload = EventPayload::ItemStatusChanged {
            item_index: 2,
            status: KitchenStatus::Cooking,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "ITEM_STATUS_CHANGED");
        assert_eq!(json["item_index"], 2);
        assert_eq!(json["status"], "COOKING");
    }

    #[test]
    fn test_event_type_display_matches_wire_name() {
        assert_eq!(OrderEventType::OrderReady.to_string(), "ORDER_READY");
        assert_eq!(OrderEventType::PaymentClaimed.to_string(), "PAYMENT_CLAIMED");
    }
}
