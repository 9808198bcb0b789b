//! Price calculation - pure functions over snapshots
//!
//! Everything here is a pure function of the inputs; the wall clock enters
//! only as an explicit `NaiveTime` so happy-hour behavior is testable.

use chrono::NaiveTime;
use shared::models::product::Product;
use shared::order::types::{FeeLine, OrderItem, ToppingChoice};

/// Unit price = base or happy-hour price + size modifier + required-option
/// modifier. Toppings are per-unit but added at item level.
pub fn unit_price(
    product: &Product,
    size_modifier: i64,
    option_modifier: i64,
    at: NaiveTime,
) -> i64 {
    product.current_price(at) + size_modifier + option_modifier
}

/// Item total = (unit price + topping sum) × quantity
pub fn item_total(unit_price: i64, toppings: &[ToppingChoice], quantity: u32) -> i64 {
    let toppings_sum: i64 = toppings.iter().map(|t| t.price).sum();
    (unit_price + toppings_sum) * quantity as i64
}

/// Computed order-level amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub voucher_discount: i64,
    pub total: i64,
}

/// Order totals from priced items plus the discount/fee lines.
///
/// `total = subtotal - voucher_discount - discount + Σfees`
pub fn compute_order_totals(
    items: &[OrderItem],
    voucher_discount: i64,
    fees: &[FeeLine],
    discount: i64,
) -> OrderTotals {
    let subtotal: i64 = items.iter().map(|i| i.item_total).sum();
    let fee_sum: i64 = fees.iter().map(|f| f.amount).sum();
    OrderTotals {
        subtotal,
        voucher_discount,
        total: subtotal - voucher_discount - discount + fee_sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::product::{HappyHour, Inventory, KitchenZone};
    use shared::order::types::KitchenStatus;

    fn tea() -> Product {
        Product {
            id: "p1".into(),
            name: "Trà sữa".into(),
            price: 25_000,
            happy_hour: Some(HappyHour {
                price: 20_000,
                start: "10:00".into(),
                end: "12:00".into(),
                is_active: true,
            }),
            sizes: vec![],
            sugar_levels: vec![],
            ice_levels: vec![],
            toppings: vec![],
            required_options: vec![],
            kitchen_zone: KitchenZone::Beverage,
            prep_time_minutes: 5,
            inventory: Inventory::default(),
        }
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn item(total: i64) -> OrderItem {
        OrderItem {
            product_id: "p1".into(),
            product_name: "Trà sữa".into(),
            product_price: 25_000,
            quantity: 1,
            size: None,
            sugar_level: None,
            ice_level: None,
            toppings: vec![],
            required_option: None,
            note: None,
            kitchen_zone: KitchenZone::Beverage,
            kitchen_status: KitchenStatus::Pending,
            item_total: total,
        }
    }

    #[test]
    fn test_unit_price_with_modifiers() {
        let p = tea();
        // Outside happy hour: 25k base + 5k size + 2k option
        assert_eq!(unit_price(&p, 5_000, 2_000, t(14, 0)), 32_000);
        // Inside happy hour the base drops to 20k
        assert_eq!(unit_price(&p, 5_000, 2_000, t(11, 0)), 27_000);
    }

    #[test]
    fn test_item_total_multiplies_toppings_per_unit() {
        let toppings = vec![
            ToppingChoice { name: "Trân châu".into(), price: 5_000 },
            ToppingChoice { name: "Pudding".into(), price: 7_000 },
        ];
        // (25_000 + 12_000) × 3
        assert_eq!(item_total(25_000, &toppings, 3), 111_000);
    }

    #[test]
    fn test_order_totals_formula() {
        let items = vec![item(60_000), item(40_000)];
        let fees = vec![FeeLine { name: "Phí hộp".into(), amount: 3_000 }];
        let totals = compute_order_totals(&items, 5_000, &fees, 2_000);
        assert_eq!(totals.subtotal, 100_000);
        assert_eq!(totals.total, 96_000);
    }

    #[test]
    fn test_voucher_scenario_sale10() {
        // SALE10: 10% capped at 5_000 against subtotal 100_000 → total 95_000
        let items = vec![item(100_000)];
        let totals = compute_order_totals(&items, 5_000, &[], 0);
        assert_eq!(totals.total, 95_000);
    }
}
