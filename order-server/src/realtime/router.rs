//! Event fan-out router
//!
//! 事件路由与分发 - 把领域事件翻译成各房间的客户端事件。
//!
//! ```text
//! OrdersManager (broadcast)
//!        │
//!        └── FanoutRouter
//!               ├── routes_for(event)  ← fixed routing table (pure)
//!               └── dispatch ──► PresenceRegistry ──► ConnectionHub
//! ```
//!
//! Fan-out is fire-and-forget relative to the state transition: the order
//! mutation has already committed by the time an event arrives here, so a
//! missing room, an offline customer, or a full outbox can only ever cost a
//! notification, never the state change.

use std::sync::Arc;

use shared::message::{ClientEvent, Room};
use shared::order::status::{OrderStatus, PaymentStatus};
use shared::order::types::OrderType;
use shared::order::{EventPayload, OrderEvent};
use tokio::sync::broadcast;

use super::hub::ConnectionHub;
use super::presence::PresenceRegistry;

/// Where one client event goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every member of a role room
    Room(Room),
    /// The account's live connection, if any
    Account(String),
    /// Every connection
    All,
}

/// The fixed routing table: domain event → (target, client event) list.
///
/// Pure function so the table is testable without any live connection.
pub fn routes_for(event: &OrderEvent) -> Vec<(Target, ClientEvent)> {
    let order_id = event.order_id.clone();
    let customer = event.customer_account.clone().map(Target::Account);
    let mut routes: Vec<(Target, ClientEvent)> = Vec::new();

    match &event.payload {
        EventPayload::OrderCreated { order } => {
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderCreated {
                    order: order.clone(),
                    play_sound: true,
                    show_popup: true,
                },
            ));
            routes.push((
                Target::Room(Room::Kitchen),
                ClientEvent::OrderIncoming {
                    order_id: order_id.clone(),
                    item_count: order.items.len(),
                },
            ));
            if let Some(customer) = customer {
                routes.push((
                    customer,
                    ClientEvent::OrderSubmitted {
                        order_id,
                        order_number: event.order_number.clone(),
                        shortcode: event.shortcode.clone(),
                    },
                ));
            }
        }

        EventPayload::OrderConfirmed { order } => {
            routes.push((
                Target::Room(Room::Kitchen),
                ClientEvent::NewKitchenOrder { order: order.clone(), play_sound: true },
            ));
            if let Some(customer) = customer {
                routes.push((
                    customer,
                    ClientEvent::OrderStatusUpdate {
                        order_id: order_id.clone(),
                        status: OrderStatus::Confirmed,
                        message: "Your order is confirmed and heading to the kitchen".into(),
                        estimated_ready_at: order.estimated_ready_at,
                        play_sound: false,
                        show_confetti: false,
                    },
                ));
            }
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderUpdated {
                    order_id,
                    status: Some(OrderStatus::Confirmed),
                    payment_status: None,
                },
            ));
        }

        EventPayload::CookingStarted {} => {
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderUpdated {
                    order_id: order_id.clone(),
                    status: Some(OrderStatus::Cooking),
                    payment_status: None,
                },
            ));
            if let Some(customer) = customer {
                routes.push((
                    customer,
                    ClientEvent::OrderStatusUpdate {
                        order_id,
                        status: OrderStatus::Cooking,
                        message: "The kitchen is preparing your order".into(),
                        estimated_ready_at: None,
                        play_sound: false,
                        show_confetti: false,
                    },
                ));
            }
        }

        EventPayload::ItemStatusChanged { item_index, status } => {
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::KitchenUpdate {
                    order_id,
                    item_index: *item_index,
                    status: *status,
                },
            ));
        }

        EventPayload::OrderReady {
            order_type,
            delivery_location,
            table_number,
            customer_name,
            customer_phone,
        } => {
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderReady {
                    order_id: order_id.clone(),
                    order_number: event.order_number.clone(),
                    shortcode: event.shortcode.clone(),
                    order_type: *order_type,
                    play_sound: true,
                },
            ));
            match order_type {
                OrderType::Delivery => routes.push((
                    Target::Room(Room::Shipper),
                    ClientEvent::OrderReadyForPickup {
                        order_id: order_id.clone(),
                        order_number: event.order_number.clone(),
                        shortcode: event.shortcode.clone(),
                        delivery_location: delivery_location.clone(),
                        customer_name: customer_name.clone(),
                        customer_phone: customer_phone.clone(),
                        play_sound: true,
                    },
                )),
                OrderType::DineIn => routes.push((
                    Target::Room(Room::Pass),
                    ClientEvent::OrderReadyForPass {
                        order_id: order_id.clone(),
                        shortcode: event.shortcode.clone(),
                        table_number: table_number.clone(),
                    },
                )),
                OrderType::Pickup => {}
            }
            if let Some(customer) = customer {
                let message = match order_type {
                    OrderType::Delivery => {
                        "Your order is ready! A shipper will pick it up shortly"
                    }
                    _ => "Your order is ready! Please come to the counter",
                };
                routes.push((
                    customer,
                    ClientEvent::OrderStatusUpdate {
                        order_id,
                        status: OrderStatus::Ready,
                        message: message.into(),
                        estimated_ready_at: None,
                        play_sound: true,
                        show_confetti: true,
                    },
                ));
            }
        }

        EventPayload::ShipperAssigned { shipper_name, .. } => {
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderAssignedToShipper {
                    order_id: order_id.clone(),
                    shipper_name: shipper_name.clone(),
                },
            ));
            routes.push((
                Target::Room(Room::Shipper),
                ClientEvent::OrderTaken { order_id, taken_by: shipper_name.clone() },
            ));
        }

        EventPayload::DeliveryStarted {} => {
            if let Some(customer) = customer {
                routes.push((
                    customer,
                    ClientEvent::OrderStatusUpdate {
                        order_id: order_id.clone(),
                        status: OrderStatus::Delivering,
                        message: "The shipper is on the way with your order".into(),
                        estimated_ready_at: None,
                        play_sound: false,
                        show_confetti: false,
                    },
                ));
            }
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderUpdated {
                    order_id,
                    status: Some(OrderStatus::Delivering),
                    payment_status: None,
                },
            ));
        }

        EventPayload::DeliveryAttemptLogged { outcome, note } => {
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::DeliveryAttempt {
                    order_id,
                    outcome: *outcome,
                    note: note.clone(),
                },
            ));
        }

        EventPayload::OrderCompleted { payment_collected, .. } => {
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderCompleted {
                    order_id: order_id.clone(),
                    payment_collected: *payment_collected,
                },
            ));
            if let Some(customer) = customer {
                routes.push((
                    customer,
                    ClientEvent::OrderStatusUpdate {
                        order_id,
                        status: OrderStatus::Completed,
                        message: "Order complete - thank you!".into(),
                        estimated_ready_at: None,
                        play_sound: false,
                        show_confetti: true,
                    },
                ));
            }
        }

        EventPayload::OrderCancelled { reason } => {
            for room in [Room::Cashier, Room::Kitchen] {
                routes.push((
                    Target::Room(room),
                    ClientEvent::OrderCancelled {
                        order_id: order_id.clone(),
                        reason: Some(reason.clone()),
                    },
                ));
            }
            if let Some(customer) = customer {
                routes.push((
                    customer,
                    ClientEvent::OrderStatusUpdate {
                        order_id,
                        status: OrderStatus::Cancelled,
                        message: format!("Your order was cancelled: {reason}"),
                        estimated_ready_at: None,
                        play_sound: false,
                        show_confetti: false,
                    },
                ));
            }
        }

        EventPayload::PaymentClaimed { amount, customer_phone, claimed_at } => {
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::PaymentClaimReceived {
                    order_id,
                    order_number: event.order_number.clone(),
                    shortcode: event.shortcode.clone(),
                    customer_phone: customer_phone.clone(),
                    amount: *amount,
                    claimed_at: *claimed_at,
                    play_sound: true,
                },
            ));
        }

        EventPayload::PaymentConfirmed {} => {
            if let Some(customer) = customer {
                routes.push((
                    customer,
                    ClientEvent::PaymentStatusUpdate {
                        order_id: order_id.clone(),
                        status: PaymentStatus::Confirmed,
                        message: "Payment confirmed".into(),
                        show_confetti: true,
                    },
                ));
            }
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderUpdated {
                    order_id: order_id.clone(),
                    status: None,
                    payment_status: Some(PaymentStatus::Confirmed),
                },
            ));
            routes.push((
                Target::Room(Room::Kitchen),
                ClientEvent::OrderPaymentConfirmed { order_id },
            ));
        }

        EventPayload::PaymentFailed { reason } => {
            if let Some(customer) = customer {
                let message = match reason {
                    Some(r) => format!("Payment could not be verified: {r}"),
                    None => "Payment could not be verified".into(),
                };
                routes.push((
                    customer,
                    ClientEvent::PaymentStatusUpdate {
                        order_id: order_id.clone(),
                        status: PaymentStatus::Failed,
                        message,
                        show_confetti: false,
                    },
                ));
            }
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderUpdated {
                    order_id,
                    status: None,
                    payment_status: Some(PaymentStatus::Failed),
                },
            ));
        }

        EventPayload::PaymentRefunded {} => {
            if let Some(customer) = customer {
                routes.push((
                    customer,
                    ClientEvent::PaymentStatusUpdate {
                        order_id: order_id.clone(),
                        status: PaymentStatus::Refunded,
                        message: "Your payment has been refunded".into(),
                        show_confetti: false,
                    },
                ));
            }
            routes.push((
                Target::Room(Room::Cashier),
                ClientEvent::OrderUpdated {
                    order_id,
                    status: None,
                    payment_status: Some(PaymentStatus::Refunded),
                },
            ));
        }
    }

    routes
}

/// Fan-out router task
pub struct FanoutRouter {
    presence: Arc<PresenceRegistry>,
    hub: Arc<ConnectionHub>,
}

impl FanoutRouter {
    pub fn new(presence: Arc<PresenceRegistry>, hub: Arc<ConnectionHub>) -> Self {
        Self { presence, hub }
    }

    /// Consume the manager's broadcast until it closes
    pub async fn run(self, mut source: broadcast::Receiver<OrderEvent>) {
        tracing::info!("Fan-out router started");
        loop {
            match source.recv().await {
                Ok(event) => self.dispatch(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Realtime-only data: clients re-pull over HTTP, so lag
                    // costs notifications, not state
                    tracing::warn!(skipped, "Fan-out router lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Source channel closed, fan-out router stopping");
                    break;
                }
            }
        }
    }

    /// Resolve targets and queue client events. Never fails.
    pub fn dispatch(&self, event: &OrderEvent) {
        for (target, client_event) in routes_for(event) {
            match target {
                Target::Room(room) => {
                    for connection_id in self.presence.members_of(room) {
                        self.hub.send_to(&connection_id, client_event.clone());
                    }
                }
                Target::Account(account_id) => {
                    match self.presence.connection_for(&account_id) {
                        Some(connection_id) => {
                            self.hub.send_to(&connection_id, client_event.clone())
                        }
                        None => tracing::debug!(
                            account_id,
                            event = client_event.name(),
                            "Customer offline, event skipped"
                        ),
                    }
                }
                Target::All => {
                    for connection_id in self.presence.all_connections() {
                        self.hub.send_to(&connection_id, client_event.clone());
                    }
                }
            }
        }
    }
}
