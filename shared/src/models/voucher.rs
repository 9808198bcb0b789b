//! Voucher model and discount rules

use serde::{Deserialize, Serialize};

/// Discount shape
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal, optionally capped
    Percentage,
    /// `value` is a fixed amount
    Fixed,
}

/// Usage caps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageLimit {
    /// Total uses allowed; `None` = unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    /// Uses per customer (matched by account id or phone)
    pub per_user: u32,
}

impl Default for UsageLimit {
    fn default() -> Self {
        Self { total: None, per_user: 1 }
    }
}

/// One recorded redemption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoucherUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub used_at: i64,
}

/// Flash-sale window: outside it the voucher is not redeemable at all
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashSale {
    pub start: i64,
    pub end: i64,
}

/// Reasons a voucher cannot be used right now
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoucherRejection {
    #[error("voucher is no longer active")]
    Inactive,
    #[error("voucher is not yet valid")]
    NotYetValid,
    #[error("voucher has expired")]
    Expired,
    #[error("voucher usage limit reached")]
    Exhausted,
    #[error("voucher already used by this customer")]
    AlreadyUsed,
    #[error("flash sale window is closed")]
    FlashSaleClosed,
}

/// Promo voucher
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Voucher {
    /// Stored uppercase
    pub code: String,
    pub name: String,
    pub kind: DiscountKind,
    /// Percentage (0-100) or fixed amount, per `kind`
    pub value: i64,
    /// Cap for percentage discounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<i64>,
    #[serde(default)]
    pub min_order_value: i64,
    #[serde(default)]
    pub usage_limit: UsageLimit,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub used_by: Vec<VoucherUsage>,
    pub valid_from: i64,
    pub valid_until: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_sale: Option<FlashSale>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Voucher {
    /// Check whether this customer may redeem the voucher at `now`.
    /// Checks are ordered cheapest-first; the first failure wins.
    pub fn eligibility(
        &self,
        account_id: Option<&str>,
        phone: &str,
        now: i64,
    ) -> Result<(), VoucherRejection> {
        if !self.is_active {
            return Err(VoucherRejection::Inactive);
        }
        if now < self.valid_from {
            return Err(VoucherRejection::NotYetValid);
        }
        if now > self.valid_until {
            return Err(VoucherRejection::Expired);
        }
        if let Some(total) = self.usage_limit.total
            && self.used_count >= total
        {
            return Err(VoucherRejection::Exhausted);
        }
        let user_uses = self
            .used_by
            .iter()
            .filter(|u| {
                account_id.is_some_and(|id| u.account_id.as_deref() == Some(id))
                    || u.phone.as_deref() == Some(phone)
            })
            .count();
        if user_uses >= self.usage_limit.per_user as usize {
            return Err(VoucherRejection::AlreadyUsed);
        }
        if let Some(flash) = &self.flash_sale
            && !(flash.start..=flash.end).contains(&now)
        {
            return Err(VoucherRejection::FlashSaleClosed);
        }
        Ok(())
    }

    /// Discount amount for the given subtotal. Returns 0 below the minimum
    /// order value. Percentage discounts are capped by `max_discount` and
    /// every discount is capped by the subtotal itself.
    pub fn discount_for(&self, subtotal: i64) -> i64 {
        if subtotal < self.min_order_value {
            return 0;
        }
        let raw = match self.kind {
            // round half-up to the nearest đồng
            DiscountKind::Percentage => {
                let capped = (subtotal * self.value + 50) / 100;
                match self.max_discount {
                    Some(max) => capped.min(max),
                    None => capped,
                }
            }
            DiscountKind::Fixed => self.value,
        };
        raw.min(subtotal).max(0)
    }
}
