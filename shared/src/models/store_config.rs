//! Store configuration consulted at order-creation time

use serde::{Deserialize, Serialize};

/// Order intake limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderSettings {
    pub max_items_per_order: usize,
    pub max_quantity_per_item: u32,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self { max_items_per_order: 20, max_quantity_per_item: 50 }
    }
}

/// Operational switches (the cashier's panic button lives here)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operations {
    pub is_open: bool,
    /// When set, order creation is rejected with STORE_CLOSED
    pub stop_online_orders: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl Default for Operations {
    fn default() -> Self {
        Self { is_open: true, stop_online_orders: false, stop_reason: None }
    }
}

/// Bank transfer reference info returned with a created order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentSettings {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    /// Prefix for the transfer note; the order number is appended
    pub transfer_template: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            bank_name: "MB Bank".into(),
            account_number: "0000000000".into(),
            account_name: "ORDER PLATFORM".into(),
            transfer_template: "ORDER".into(),
        }
    }
}

/// Full store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub order_settings: OrderSettings,
    #[serde(default)]
    pub operations: Operations,
    #[serde(default)]
    pub payment: PaymentSettings,
    /// Added on top of the ready estimate for delivery orders
    #[serde(default = "default_delivery_buffer")]
    pub delivery_buffer_minutes: u32,
}

fn default_delivery_buffer() -> u32 {
    15
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            order_settings: OrderSettings::default(),
            operations: Operations::default(),
            payment: PaymentSettings::default(),
            delivery_buffer_minutes: default_delivery_buffer(),
        }
    }
}
