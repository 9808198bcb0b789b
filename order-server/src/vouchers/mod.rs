//! Voucher service - lookup, eligibility, atomic redemption
//!
//! Redemption (eligibility check + discount computation + usage recording)
//! runs under the voucher's entry lock, so two concurrent orders cannot both
//! consume the last use of a capped voucher. The order keeps only the frozen
//! [`AppliedVoucher`] snapshot.

use dashmap::DashMap;
use shared::models::voucher::Voucher;
use shared::models::voucher::VoucherUsage;
use shared::order::types::AppliedVoucher;
use shared::util::now_millis;

use crate::orders::{OrderError, OrderResult};

#[derive(Debug, Default)]
pub struct VoucherService {
    vouchers: DashMap<String, Voucher>,
}

impl VoucherService {
    pub fn new() -> Self {
        Self { vouchers: DashMap::new() }
    }

    pub fn upsert(&self, voucher: Voucher) {
        self.vouchers.insert(voucher.code.to_uppercase(), voucher);
    }

    pub fn find_by_code(&self, code: &str) -> Option<Voucher> {
        self.vouchers.get(&code.to_uppercase()).map(|v| v.clone())
    }

    /// Atomically redeem a voucher against `subtotal`.
    ///
    /// On success the usage is recorded and the frozen discount snapshot is
    /// returned. A zero-discount outcome (subtotal below the minimum) is a
    /// validation error rather than a silent no-op, matching the intake rule
    /// that a supplied voucher must actually apply.
    pub fn redeem(
        &self,
        code: &str,
        account_id: Option<&str>,
        phone: &str,
        subtotal: i64,
    ) -> OrderResult<AppliedVoucher> {
        let mut entry = self
            .vouchers
            .get_mut(&code.to_uppercase())
            .ok_or_else(|| OrderError::VoucherNotFound(code.to_string()))?;
        let voucher = entry.value_mut();
        let now = now_millis();

        voucher
            .eligibility(account_id, phone, now)
            .map_err(|rejection| OrderError::Conflict(rejection.to_string()))?;

        let discount = voucher.discount_for(subtotal);
        if discount == 0 {
            return Err(OrderError::Validation(format!(
                "Voucher {} requires a minimum order of {}",
                voucher.code, voucher.min_order_value
            )));
        }

        voucher.used_count += 1;
        voucher.used_by.push(VoucherUsage {
            account_id: account_id.map(str::to_string),
            phone: Some(phone.to_string()),
            used_at: now,
        });

        Ok(AppliedVoucher {
            code: voucher.code.clone(),
            discount,
            kind: voucher.kind,
        })
    }

    /// Roll back a redemption recorded by [`redeem`](Self::redeem). Called
    /// when the surrounding order creation fails after the voucher step.
    pub fn release(&self, code: &str, account_id: Option<&str>, phone: &str) {
        let Some(mut entry) = self.vouchers.get_mut(&code.to_uppercase()) else {
            return;
        };
        let voucher = entry.value_mut();
        voucher.used_count = voucher.used_count.saturating_sub(1);
        let matches_user = |u: &VoucherUsage| {
            u.phone.as_deref() == Some(phone)
                && u.account_id.as_deref() == account_id
        };
        if let Some(pos) = voucher.used_by.iter().rposition(matches_user) {
            voucher.used_by.remove(pos);
        }
    }
}
