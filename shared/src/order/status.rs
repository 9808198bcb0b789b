//! Order and payment state machines
//!
//! 订单状态机 - 所有状态迁移的唯一真实来源。
//!
//! The transition tables below are the single source of truth for which
//! status edges exist and which roles may drive them. Everything else
//! (manager actions, HTTP handlers, clients) consults these tables; nothing
//! is allowed to mutate a status outside of them.

use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 待确认 - awaiting cashier approval
    #[default]
    Pending,
    /// 已确认 - confirmed, visible to kitchen
    Confirmed,
    /// 制作中 - kitchen is preparing
    Cooking,
    /// 已完成制作 - ready for pickup/delivery
    Ready,
    /// 配送中 - shipper on the way
    Delivering,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl OrderStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Confirmed => write!(f, "CONFIRMED"),
            OrderStatus::Cooking => write!(f, "COOKING"),
            OrderStatus::Ready => write!(f, "READY"),
            OrderStatus::Delivering => write!(f, "DELIVERING"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Payment status - a second state machine, loosely coupled to the order
/// status (an order can be READY while payment is still PROCESSING).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    /// Customer claimed the transfer was made, awaiting staff verification
    Processing,
    Confirmed,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Processing => write!(f, "PROCESSING"),
            PaymentStatus::Confirmed => write!(f, "CONFIRMED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
            PaymentStatus::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Role of the actor driving a transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Cashier,
    Kitchen,
    Shipper,
    Admin,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRole::Customer => write!(f, "customer"),
            ActorRole::Cashier => write!(f, "cashier"),
            ActorRole::Kitchen => write!(f, "kitchen"),
            ActorRole::Shipper => write!(f, "shipper"),
            ActorRole::Admin => write!(f, "admin"),
        }
    }
}

/// Roles allowed to drive a status edge. An empty slice means the edge does
/// not exist in the transition table at all.
///
/// Policy notes:
/// - customers may only cancel while PENDING; cashier/admin may cancel any
///   non-terminal order
/// - READY → DELIVERING is shipper-driven (delivery orders only; the
///   assigned-shipper requirement is enforced by the action, not the table)
/// - READY → COMPLETED is the dine-in/pickup hand-over at the counter
pub fn allowed_roles(from: OrderStatus, to: OrderStatus) -> &'static [ActorRole] {
    use ActorRole::*;
    use OrderStatus::*;
    match (from, to) {
        (Pending, Confirmed) => &[Cashier, Admin],
        (Pending, Cancelled) => &[Customer, Cashier, Admin],
        (Confirmed, Cooking) => &[Kitchen, Admin],
        (Cooking, Ready) => &[Kitchen, Admin],
        (Ready, Delivering) => &[Shipper, Admin],
        (Ready, Completed) => &[Cashier, Admin],
        (Delivering, Completed) => &[Shipper, Admin],
        (Confirmed | Cooking | Ready | Delivering, Cancelled) => &[Cashier, Admin],
        _ => &[],
    }
}

/// Whether the status edge exists at all (for any role)
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    !allowed_roles(from, to).is_empty()
}

/// Whether a payment status edge exists
pub fn payment_can_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    matches!(
        (from, to),
        (Pending, Processing)
            | (Pending, Confirmed)
            | (Processing, Confirmed)
            | (Processing, Failed)
            | (Confirmed, Refunded)
    )
}
