//! Order component types - item snapshots, customer info, payment, shipper

use super::status::{ActorRole, PaymentStatus};
use crate::models::product::KitchenZone;
use crate::models::voucher::DiscountKind;
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Classification
// ============================================================================

/// How the order reaches the customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    DineIn,
    #[default]
    Delivery,
    Pickup,
}

/// Per-item kitchen progress
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenStatus {
    #[default]
    Pending,
    Cooking,
    Done,
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    BankTransfer,
    Cash,
    Free,
}

// ============================================================================
// Item Snapshot Types
// ============================================================================

/// Selected size, snapshotted with its price modifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizeChoice {
    pub name: String,
    #[serde(default)]
    pub price_modifier: i64,
}

/// Selected topping, snapshotted with its price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToppingChoice {
    pub name: String,
    #[serde(default)]
    pub price: i64,
}

/// Selected required single-choice option (e.g. sauce type)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionChoice {
    pub group_name: String,
    pub option_name: String,
    #[serde(default)]
    pub price_modifier: i64,
}

/// Line item - immutable snapshot taken at order time.
///
/// Product name and price are copied so historical orders display correctly
/// even after the catalog changes. `item_total` is computed by the pricing
/// engine at creation and never recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    /// Base catalog price at order time (before modifiers)
    pub product_price: i64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ice_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toppings: Vec<ToppingChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_option: Option<OptionChoice>,
    /// Free-text note, truncated at intake
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Preparation station, copied from the product
    pub kitchen_zone: KitchenZone,
    #[serde(default)]
    pub kitchen_status: KitchenStatus,
    /// (unit price + toppings) × quantity
    pub item_total: i64,
}

/// Item as submitted by the client. Only names are accepted; price modifiers
/// are resolved server-side against the catalog so clients cannot set prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ice_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toppings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ============================================================================
// Customer / Priority
// ============================================================================

/// Customer snapshot on the order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    /// Class/group tag, e.g. "12A6"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_tag: Option<String>,
    /// Weak reference to a registered account; absent for guests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// Priority flags and the derived score (sort ordering only, never
/// transition legality).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Priority {
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub is_teacher: bool,
    #[serde(default)]
    pub score: i32,
}

// ============================================================================
// Pricing
// ============================================================================

/// Voucher discount snapshot. The order keeps only this frozen copy; later
/// voucher edits never retroactively change historical orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedVoucher {
    pub code: String,
    pub discount: i64,
    pub kind: DiscountKind,
}

/// Additional fee line (e.g. packaging fee)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeLine {
    pub name: String,
    pub amount: i64,
}

/// Manual staff discount, always with a reason and approver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualDiscount {
    pub amount: i64,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

/// Pricing block. Invariant: `total == subtotal - voucher - discount + Σfees`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Pricing {
    pub subtotal: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher: Option<AppliedVoucher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_fees: Vec<FeeLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<ManualDiscount>,
    pub total: i64,
}

impl Pricing {
    /// Total implied by the components; must equal `total` at all times
    pub fn expected_total(&self) -> i64 {
        let voucher = self.voucher.as_ref().map(|v| v.discount).unwrap_or(0);
        let discount = self.discount.as_ref().map(|d| d.amount).unwrap_or(0);
        let fees: i64 = self.additional_fees.iter().map(|f| f.amount).sum();
        self.subtotal - voucher - discount + fees
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.expected_total()
    }
}

// ============================================================================
// Payment
// ============================================================================

/// Payment record - tracks the independent payment state machine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PaymentInfo {
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
    /// Customer pressed "I have paid" on the tracking page
    #[serde(default)]
    pub customer_claimed_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
    /// Audited bypass of the cash-collected requirement
    #[serde(default)]
    pub force_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_completed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_completed_reason: Option<String>,
}

// ============================================================================
// Shipper
// ============================================================================

/// Outcome of a failed delivery attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryFailure {
    NoAnswer,
    WrongLocation,
    CustomerUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryAttempt {
    pub attempted_at: i64,
    pub outcome: DeliveryFailure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Shipper sub-record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShipperInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Shipper display name snapshot for the cashier console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(default)]
    pub payment_collected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_collected_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delivery_attempts: Vec<DeliveryAttempt>,
}

// ============================================================================
// Audit / Cancellation
// ============================================================================

/// Audit log entry. The audit log is append-only; entries are never mutated
/// or truncated. Every status or payment transition appends exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_role: Option<ActorRole>,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Refund progress after a cancellation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    #[default]
    None,
    Pending,
    Completed,
}

/// Present only on cancelled orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cancellation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    pub role: ActorRole,
    pub cancelled_at: i64,
    pub reason: String,
    #[serde(default)]
    pub refund_status: RefundStatus,
}

/// Internal staff note about the order/customer (not customer-visible)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InternalNote {
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: i64,
}

// ============================================================================
// Actor
// ============================================================================

/// The identity driving an operation, as resolved by the session layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActorRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: ActorRole,
}

impl ActorRef {
    pub fn customer() -> Self {
        Self { id: None, name: None, role: ActorRole::Customer }
    }

    pub fn staff(id: impl Into<String>, role: ActorRole) -> Self {
        Self { id: Some(id.into()), name: None, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_invariant() {
        let pricing = Pricing {
            subtotal: 100_000,
            voucher: Some(AppliedVoucher {
                code: "SALE10".into(),
                discount: 5_000,
                kind: DiscountKind::Percentage,
            }),
            additional_fees: vec![FeeLine { name: "Phí hộp".into(), amount: 2_000 }],
            discount: Some(ManualDiscount {
                amount: 1_000,
                reason: "loyal customer".into(),
                approved_by: None,
            }),
            total: 96_000,
        };
        assert_eq!(pricing.expected_total(), 96_000);
        assert!(pricing.is_consistent());

        let broken = Pricing { total: 95_000, ..pricing };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&OrderType::DineIn).unwrap();
        assert_eq!(json, "\"DINE_IN\"");
        let back: OrderType = serde_json::from_str("\"PICKUP\"").unwrap();
        assert_eq!(back, OrderType::Pickup);
    }
}
