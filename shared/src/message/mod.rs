//! Realtime wire types - rooms and client events
//!
//! 实时消息类型 - 服务端与各角色终端共享。
//!
//! Every live connection belongs to exactly one [`Room`]; the fan-out router
//! turns domain events into [`ClientEvent`] values and the hub delivers them
//! as JSON text frames. Each variant has a fixed schema, validated at the
//! serialization boundary rather than assembled ad hoc.

use crate::order::snapshot::Order;
use crate::order::status::{ActorRole, OrderStatus, PaymentStatus};
use crate::order::types::{DeliveryFailure, KitchenStatus, OrderType};
use serde::{Deserialize, Serialize};

/// Broadcast group, one per connected audience
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Room {
    Customer,
    Cashier,
    Kitchen,
    Shipper,
    /// Pass station hands finished dine-in orders to the floor
    Pass,
    Admin,
}

impl Room {
    pub const ALL: [Room; 6] = [
        Room::Customer,
        Room::Cashier,
        Room::Kitchen,
        Room::Shipper,
        Room::Pass,
        Room::Admin,
    ];

    /// Parse the `role` query/handshake parameter
    pub fn parse(s: &str) -> Option<Room> {
        match s {
            "customer" => Some(Room::Customer),
            "cashier" => Some(Room::Cashier),
            "kitchen" => Some(Room::Kitchen),
            "shipper" => Some(Room::Shipper),
            "pass" => Some(Room::Pass),
            "admin" => Some(Room::Admin),
            _ => None,
        }
    }
}

impl From<ActorRole> for Room {
    fn from(role: ActorRole) -> Self {
        match role {
            ActorRole::Customer => Room::Customer,
            ActorRole::Cashier => Room::Cashier,
            ActorRole::Kitchen => Room::Kitchen,
            ActorRole::Shipper => Room::Shipper,
            ActorRole::Admin => Room::Admin,
        }
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::Customer => write!(f, "customer"),
            Room::Cashier => write!(f, "cashier"),
            Room::Kitchen => write!(f, "kitchen"),
            Room::Shipper => write!(f, "shipper"),
            Room::Pass => write!(f, "pass"),
            Room::Admin => write!(f, "admin"),
        }
    }
}

/// Connection counts per room, pushed to every client on join/leave
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RoleCounts {
    pub customer: usize,
    pub cashier: usize,
    pub kitchen: usize,
    pub shipper: usize,
    pub pass: usize,
    pub admin: usize,
}

/// Events pushed to clients. The `event` tag is the wire event name; the
/// remaining fields are the payload. Sound/visual hints (`play_sound`,
/// `show_popup`, `show_confetti`) are explicit fields consumed by clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// → cashier room: a new order needs approval
    OrderCreated {
        order: Box<Order>,
        play_sound: bool,
        show_popup: bool,
    },
    /// → kitchen room: lightweight heads-up before confirmation
    OrderIncoming { order_id: String, item_count: usize },
    /// → originating customer connection: creation acknowledged
    OrderSubmitted {
        order_id: String,
        order_number: String,
        shortcode: String,
    },
    /// → kitchen room: confirmed order with full detail
    NewKitchenOrder { order: Box<Order>, play_sound: bool },
    /// → customer connection: order progress narration
    OrderStatusUpdate {
        order_id: String,
        status: OrderStatus,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_ready_at: Option<i64>,
        play_sound: bool,
        show_confetti: bool,
    },
    /// → cashier room: status patch for list views
    OrderUpdated {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<OrderStatus>,
        #[serde(skip_serializing_if = "Option::is_none")]
        payment_status: Option<PaymentStatus>,
    },
    /// → cashier room: per-item kitchen progress
    KitchenUpdate {
        order_id: String,
        item_index: usize,
        status: KitchenStatus,
    },
    /// → cashier room: whole order finished in the kitchen
    OrderReady {
        order_id: String,
        order_number: String,
        shortcode: String,
        order_type: OrderType,
        play_sound: bool,
    },
    /// → shipper room: delivery order waiting for a rider
    OrderReadyForPickup {
        order_id: String,
        order_number: String,
        shortcode: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        delivery_location: Option<String>,
        customer_name: String,
        customer_phone: String,
        play_sound: bool,
    },
    /// → pass room: dine-in order to hand over
    OrderReadyForPass {
        order_id: String,
        shortcode: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        table_number: Option<String>,
    },
    /// → cashier room
    OrderAssignedToShipper { order_id: String, shipper_name: String },
    /// → shipper room: remove from the available list
    OrderTaken { order_id: String, taken_by: String },
    /// → cashier room: a hand-over failed out on delivery
    DeliveryAttempt {
        order_id: String,
        outcome: DeliveryFailure,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// → cashier room
    OrderCompleted { order_id: String, payment_collected: bool },
    /// → cashier + kitchen rooms
    OrderCancelled {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// → cashier room: customer claims the transfer was made
    PaymentClaimReceived {
        order_id: String,
        order_number: String,
        shortcode: String,
        customer_phone: String,
        amount: i64,
        claimed_at: i64,
        play_sound: bool,
    },
    /// → customer connection
    PaymentStatusUpdate {
        order_id: String,
        status: PaymentStatus,
        message: String,
        show_confetti: bool,
    },
    /// → kitchen room: payment cleared, safe to serve
    OrderPaymentConfirmed { order_id: String },
    /// → all connections
    OnlineCount { total: usize, by_role: RoleCounts },
    /// → the joining connection
    JoinedRoom { room: Room, connection_id: String },
}

impl ClientEvent {
    /// Wire event name (the serde tag)
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::OrderCreated { .. } => "order_created",
            ClientEvent::OrderIncoming { .. } => "order_incoming",
            ClientEvent::OrderSubmitted { .. } => "order_submitted",
            ClientEvent::NewKitchenOrder { .. } => "new_kitchen_order",
            ClientEvent::OrderStatusUpdate { .. } => "order_status_update",
            ClientEvent::OrderUpdated { .. } => "order_updated",
            ClientEvent::KitchenUpdate { .. } => "kitchen_update",
            ClientEvent::OrderReady { .. } => "order_ready",
            ClientEvent::OrderReadyForPickup { .. } => "order_ready_for_pickup",
            ClientEvent::OrderReadyForPass { .. } => "order_ready_for_pass",
            ClientEvent::OrderAssignedToShipper { .. } => "order_assigned_to_shipper",
            ClientEvent::OrderTaken { .. } => "order_taken",
            ClientEvent::DeliveryAttempt { .. } => "delivery_attempt",
            ClientEvent::OrderCompleted { .. } => "order_completed",
            ClientEvent::OrderCancelled { .. } => "order_cancelled",
            ClientEvent::PaymentClaimReceived { .. } => "payment_claim_received",
            ClientEvent::PaymentStatusUpdate { .. } => "payment_status_update",
            ClientEvent::OrderPaymentConfirmed { .. } => "order_payment_confirmed",
            ClientEvent::OnlineCount { .. } => "online_count",
            ClientEvent::JoinedRoom { .. } => "joined_room",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_tagging() {
        let ev = ClientEvent::KitchenUpdate {
            order_id: "o1".into(),
            item_index: 0,
            status: KitchenStatus::Done,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "kitchen_update");
        assert_eq!(json["status"], "DONE");
        assert_eq!(ev.name(), "kitchen_update");
    }

    #[test]
    fn test_room_parse_roundtrip() {
        for room in Room::ALL {
            assert_eq!(Room::parse(&room.to_string()), Some(room));
        }
        assert_eq!(Room::parse("dj_booth"), None);
    }
}
