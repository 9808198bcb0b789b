//! CreateOrder - validation pipeline, optimistic stock reservation, pricing
//!
//! Validation short-circuits on the first failure, in intake order: customer
//! info, blacklist, cart shape, then per item availability/stock/quantity.
//! Stock is reserved item by item during validation; any later failure in
//! the same creation (voucher rejection, zero total, persistence) restores
//! every reservation already made, so a failed creation is a no-op on the
//! catalog (round-trip law).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use shared::models::store_config::StoreConfig;
use shared::order::status::ActorRole;
use shared::order::types::{
    CustomerInfo, OptionChoice, OrderItem, OrderItemInput, OrderType, PaymentInfo, PaymentMethod,
    Pricing, Priority, ShipperInfo, SizeChoice, ToppingChoice,
};
use shared::order::{Order, OrderStatus};
use shared::util;

use crate::accounts::AccountService;
use crate::catalog::CatalogService;
use crate::orders::priority::{estimate_delivery_time, estimate_ready_time, priority_score};
use crate::orders::{OrderError, OrderResult};
use crate::pricing;
use crate::utils::validation::{
    MAX_ITEM_NOTE_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_customer, validate_optional_text,
};
use crate::vouchers::VoucherService;

/// Customer block of the creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// Order creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer: CustomerInput,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_urgent: bool,
}

/// Services and clock inputs for the creation pipeline
pub struct CreateOrderContext<'a> {
    pub catalog: &'a CatalogService,
    pub vouchers: &'a VoucherService,
    pub accounts: &'a AccountService,
    pub store: &'a StoreConfig,
    /// Store-local wall clock, for happy-hour pricing
    pub local_time: NaiveTime,
    pub now: i64,
}

/// Fully validated order, not yet persisted. Holds enough information to
/// roll back its side effects (stock reservations, voucher usage) if the
/// surrounding creation fails after this point.
#[derive(Debug)]
pub struct OrderDraft {
    pub customer: CustomerInfo,
    pub items: Vec<OrderItem>,
    pub order_type: OrderType,
    pub delivery_location: Option<String>,
    pub table_number: Option<String>,
    pub is_gift: bool,
    pub gift_message: Option<String>,
    pub hide_gift_sender: bool,
    pub pricing: Pricing,
    pub priority: Priority,
    pub payment_method: PaymentMethod,
    pub estimated_ready_at: i64,
    pub estimated_delivery_at: Option<i64>,
    reservations: Vec<(String, u32)>,
    voucher_rollback: Option<(String, Option<String>, String)>,
}

impl OrderDraft {
    /// Undo every side effect this draft performed
    pub fn rollback(&self, catalog: &CatalogService, vouchers: &VoucherService) {
        for (product_id, quantity) in &self.reservations {
            catalog.restore_stock(product_id, *quantity);
        }
        if let Some((code, account_id, phone)) = &self.voucher_rollback {
            vouchers.release(code, account_id.as_deref(), phone);
        }
    }

    /// Assemble the final order once its identity is allocated
    pub fn into_order(self, id: String, order_number: String, shortcode: String, now: i64) -> Order {
        let mut order = Order {
            id,
            order_number,
            shortcode,
            customer: self.customer,
            items: self.items,
            order_type: self.order_type,
            delivery_location: self.delivery_location,
            table_number: self.table_number,
            is_gift: self.is_gift,
            gift_message: self.gift_message,
            hide_gift_sender: self.hide_gift_sender,
            status: OrderStatus::Pending,
            priority: self.priority,
            payment: PaymentInfo { method: self.payment_method, ..Default::default() },
            pricing: self.pricing,
            shipper: ShipperInfo::default(),
            audit_log: vec![],
            cancellation: None,
            internal_notes: vec![],
            processed_by: None,
            processed_at: None,
            estimated_ready_at: Some(self.estimated_ready_at),
            estimated_delivery_at: self.estimated_delivery_at,
            created_at: now,
            updated_at: now,
        };
        order.push_audit(
            "created",
            None,
            Some(ActorRole::Customer),
            now,
            None,
            Some(OrderStatus::Pending.to_string()),
            Some("Order placed online".into()),
        );
        order
    }
}

/// Run the validation pipeline and produce a draft with stock reserved and
/// the voucher (if any) redeemed.
pub fn execute(ctx: &CreateOrderContext<'_>, req: CreateOrderRequest) -> OrderResult<OrderDraft> {
    // 1. Customer info
    validate_customer(&req.customer.name, &req.customer.phone)?;
    let phone = util::normalize_phone(&req.customer.phone);
    validate_optional_text(&req.customer.class_tag, "customer.class_tag", MAX_SHORT_TEXT_LEN)?;

    // 2. Blacklist
    if ctx.accounts.is_phone_blacklisted(&phone) {
        return Err(OrderError::Forbidden(
            "This phone number is restricted from ordering".into(),
        ));
    }

    // 3. Cart shape
    if req.items.is_empty() {
        return Err(OrderError::Validation("Cart is empty".into()));
    }
    let max_items = ctx.store.order_settings.max_items_per_order;
    if req.items.len() > max_items {
        return Err(OrderError::Validation(format!(
            "At most {max_items} items per order"
        )));
    }

    // 4. Type-dependent destination
    match req.order_type {
        OrderType::Delivery => {
            if req.delivery_location.as_deref().unwrap_or("").trim().is_empty() {
                return Err(OrderError::Validation(
                    "Delivery orders need a delivery location".into(),
                ));
            }
        }
        OrderType::DineIn => {
            if req.table_number.as_deref().unwrap_or("").trim().is_empty() {
                return Err(OrderError::Validation("Dine-in orders need a table number".into()));
            }
        }
        OrderType::Pickup => {}
    }
    validate_optional_text(&req.delivery_location, "delivery_location", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.table_number, "table_number", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.gift_message, "gift_message", MAX_NOTE_LEN)?;

    // 5. Items: validate + reserve, rolling back on the first failure
    let mut reservations: Vec<(String, u32)> = Vec::new();
    let mut prep_lines: Vec<(u32, u32)> = Vec::new();
    let built = build_items(ctx, &req.items, &mut reservations, &mut prep_lines);
    let items = match built {
        Ok(items) => items,
        Err(err) => {
            for (product_id, quantity) in &reservations {
                ctx.catalog.restore_stock(product_id, *quantity);
            }
            return Err(err);
        }
    };

    let subtotal: i64 = items.iter().map(|i| i.item_total).sum();

    // 6. Voucher - atomic check+record; rolls back reservations on rejection
    let mut voucher_rollback = None;
    let applied_voucher = match &req.voucher_code {
        Some(code) if !code.trim().is_empty() => {
            let account_id = req.customer.account_id.as_deref();
            match ctx.vouchers.redeem(code, account_id, &phone, subtotal) {
                Ok(applied) => {
                    voucher_rollback =
                        Some((applied.code.clone(), account_id.map(str::to_string), phone.clone()));
                    Some(applied)
                }
                Err(err) => {
                    for (product_id, quantity) in &reservations {
                        ctx.catalog.restore_stock(product_id, *quantity);
                    }
                    return Err(err);
                }
            }
        }
        _ => None,
    };

    // 7. Totals + the gift exception
    let voucher_discount = applied_voucher.as_ref().map(|v| v.discount).unwrap_or(0);
    let totals = pricing::compute_order_totals(&items, voucher_discount, &[], 0);
    if totals.total <= 0 && !req.is_gift {
        for (product_id, quantity) in &reservations {
            ctx.catalog.restore_stock(product_id, *quantity);
        }
        if let Some((code, account_id, phone)) = &voucher_rollback {
            ctx.vouchers.release(code, account_id.as_deref(), phone);
        }
        return Err(OrderError::Validation("Order total must be positive".into()));
    }

    // 8. Priority + timing
    let (is_vip, is_teacher) = req
        .customer
        .account_id
        .as_deref()
        .map(|id| ctx.accounts.priority_flags(id))
        .unwrap_or((false, false));
    let priority = Priority {
        is_urgent: req.is_urgent,
        is_vip,
        is_teacher,
        score: priority_score(req.is_urgent, is_vip, is_teacher),
    };

    let estimated_ready_at = estimate_ready_time(ctx.now, &prep_lines);
    let estimated_delivery_at = (req.order_type == OrderType::Delivery)
        .then(|| estimate_delivery_time(estimated_ready_at, ctx.store.delivery_buffer_minutes));

    Ok(OrderDraft {
        customer: CustomerInfo {
            name: util::capitalize_words(&req.customer.name),
            phone,
            class_tag: req.customer.class_tag,
            account_id: req.customer.account_id,
        },
        items,
        order_type: req.order_type,
        delivery_location: req.delivery_location,
        table_number: req.table_number,
        is_gift: req.is_gift,
        gift_message: req.gift_message,
        hide_gift_sender: req.hide_gift_sender,
        pricing: Pricing {
            subtotal: totals.subtotal,
            voucher: applied_voucher,
            additional_fees: vec![],
            discount: None,
            total: totals.total,
        },
        priority,
        payment_method: req.payment_method,
        estimated_ready_at,
        estimated_delivery_at,
        reservations,
        voucher_rollback,
    })
}

/// Validate and price each item, reserving stock as it goes. Reservations
/// made before a failure are left in `reservations` for the caller to undo.
fn build_items(
    ctx: &CreateOrderContext<'_>,
    inputs: &[OrderItemInput],
    reservations: &mut Vec<(String, u32)>,
    prep_lines: &mut Vec<(u32, u32)>,
) -> OrderResult<Vec<OrderItem>> {
    let max_quantity = ctx.store.order_settings.max_quantity_per_item;
    let mut items = Vec::with_capacity(inputs.len());

    for input in inputs {
        if input.quantity == 0 {
            return Err(OrderError::Validation("Item quantity must be at least 1".into()));
        }
        if input.quantity > max_quantity {
            return Err(OrderError::Validation(format!(
                "At most {max_quantity} of each item"
            )));
        }

        let product = ctx
            .catalog
            .get(&input.product_id)
            .ok_or_else(|| OrderError::ProductNotFound(input.product_id.clone()))?;

        // Size / toppings / required option resolve against the catalog so
        // the snapshot carries server-side prices only
        let size = match &input.size {
            Some(name) => Some(
                product
                    .size(name)
                    .map(|s| SizeChoice { name: s.name.clone(), price_modifier: s.price_modifier })
                    .ok_or_else(|| {
                        OrderError::Validation(format!(
                            "\"{}\" has no size \"{name}\"",
                            product.name
                        ))
                    })?,
            ),
            None => None,
        };

        let mut toppings = Vec::new();
        for name in &input.toppings {
            let topping = product.topping(name).ok_or_else(|| {
                OrderError::Validation(format!("\"{}\" has no topping \"{name}\"", product.name))
            })?;
            if !topping.is_available {
                return Err(OrderError::Conflict(format!(
                    "Topping \"{name}\" is sold out"
                )));
            }
            toppings.push(ToppingChoice { name: topping.name.clone(), price: topping.price });
        }

        let required_option = match (&input.required_option, product.required_options.is_empty()) {
            (Some(name), false) => {
                let (group, option) = product.required_option(name).ok_or_else(|| {
                    OrderError::Validation(format!(
                        "\"{}\" has no option \"{name}\"",
                        product.name
                    ))
                })?;
                Some(OptionChoice {
                    group_name: group.group_name.clone(),
                    option_name: option.name.clone(),
                    price_modifier: option.price_modifier,
                })
            }
            (None, false) => {
                return Err(OrderError::Validation(format!(
                    "\"{}\" requires choosing {}",
                    product.name, product.required_options[0].group_name
                )));
            }
            (Some(_), true) => {
                return Err(OrderError::Validation(format!(
                    "\"{}\" has no required options",
                    product.name
                )));
            }
            (None, true) => None,
        };

        validate_level(&input.sugar_level, &product.sugar_levels, &product.name, "sugar level")?;
        validate_level(&input.ice_level, &product.ice_levels, &product.name, "ice level")?;

        // Reservation is the validation step's side effect: stock comes out
        // here, not in a separate phase
        ctx.catalog.reserve_stock(&product.id, input.quantity)?;
        reservations.push((product.id.clone(), input.quantity));
        prep_lines.push((product.prep_time_minutes, input.quantity));

        let size_modifier = size.as_ref().map(|s| s.price_modifier).unwrap_or(0);
        let option_modifier = required_option.as_ref().map(|o| o.price_modifier).unwrap_or(0);
        let unit_price = pricing::unit_price(&product, size_modifier, option_modifier, ctx.local_time);
        let item_total = pricing::item_total(unit_price, &toppings, input.quantity);

        items.push(OrderItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_price: product.price,
            quantity: input.quantity,
            size,
            sugar_level: input.sugar_level.clone(),
            ice_level: input.ice_level.clone(),
            toppings,
            required_option,
            note: input.note.as_deref().map(|n| util::truncate_chars(n, MAX_ITEM_NOTE_LEN)),
            kitchen_zone: product.kitchen_zone,
            kitchen_status: Default::default(),
            item_total,
        });
    }

    Ok(items)
}

fn validate_level(
    value: &Option<String>,
    allowed: &[String],
    product_name: &str,
    what: &str,
) -> OrderResult<()> {
    if let Some(v) = value
        && !allowed.is_empty()
        && !allowed.iter().any(|a| a == v)
    {
        return Err(OrderError::Validation(format!(
            "\"{product_name}\" has no {what} \"{v}\""
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::product::{Inventory, KitchenZone, Product, SizeOption, ToppingOption};
    use shared::models::voucher::{DiscountKind, UsageLimit, Voucher};

    fn product(id: &str, price: i64, stock: u32, prep: u32) -> Product {
        Product {
            id: id.into(),
            name: format!("Món {id}"),
            price,
            happy_hour: None,
            sizes: vec![SizeOption { name: "L".into(), price_modifier: 5_000, is_default: false }],
            sugar_levels: vec![],
            ice_levels: vec![],
            toppings: vec![ToppingOption { name: "Trân châu".into(), price: 5_000, is_available: true }],
            required_options: vec![],
            kitchen_zone: KitchenZone::HotKitchen,
            prep_time_minutes: prep,
            inventory: Inventory { current_stock: stock, ..Default::default() },
        }
    }

    struct Fixture {
        catalog: CatalogService,
        vouchers: VoucherService,
        accounts: AccountService,
        store: StoreConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = CatalogService::new();
            catalog.upsert(product("p1", 30_000, 10, 5));
            catalog.upsert(product("p2", 40_000, 10, 8));
            Self {
                catalog,
                vouchers: VoucherService::new(),
                accounts: AccountService::new(),
                store: StoreConfig::default(),
            }
        }

        fn ctx(&self) -> CreateOrderContext<'_> {
            CreateOrderContext {
                catalog: &self.catalog,
                vouchers: &self.vouchers,
                accounts: &self.accounts,
                store: &self.store,
                local_time: chrono::NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                now: 1_000_000,
            }
        }
    }

    fn item_input(product_id: &str, quantity: u32) -> OrderItemInput {
        OrderItemInput {
            product_id: product_id.into(),
            quantity,
            size: None,
            sugar_level: None,
            ice_level: None,
            toppings: vec![],
            required_option: None,
            note: None,
        }
    }

    fn request(items: Vec<OrderItemInput>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer: CustomerInput {
                name: "nguyen van a".into(),
                phone: "0912345678".into(),
                class_tag: Some("12A6".into()),
                account_id: None,
            },
            items,
            order_type: OrderType::Delivery,
            delivery_location: Some("12A6".into()),
            table_number: None,
            is_gift: false,
            gift_message: None,
            hide_gift_sender: false,
            voucher_code: None,
            payment_method: PaymentMethod::BankTransfer,
            is_urgent: false,
        }
    }

    #[test]
    fn test_creation_reserves_stock_and_estimates_ready_time() {
        let fx = Fixture::new();
        // qty 2 × prep 5 = 10min, qty 1 × prep 8 = 8min → max 10min
        let draft = execute(
            &fx.ctx(),
            request(vec![item_input("p1", 2), item_input("p2", 1)]),
        )
        .unwrap();

        assert_eq!(fx.catalog.current_stock("p1"), Some(8));
        assert_eq!(fx.catalog.current_stock("p2"), Some(9));
        assert_eq!(draft.estimated_ready_at, 1_000_000 + 10 * 60_000);
        // Delivery adds the configured buffer
        assert_eq!(
            draft.estimated_delivery_at,
            Some(1_000_000 + 25 * 60_000)
        );
        assert_eq!(draft.pricing.subtotal, 100_000);
        assert_eq!(draft.pricing.total, 100_000);
        assert_eq!(draft.customer.name, "Nguyen Van A");
    }

    #[test]
    fn test_invalid_phone_rejected_before_any_reservation() {
        let fx = Fixture::new();
        let mut req = request(vec![item_input("p1", 1)]);
        req.customer.phone = "123456".into();
        let err = execute(&fx.ctx(), req).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(fx.catalog.current_stock("p1"), Some(10));
    }

    #[test]
    fn test_blacklisted_phone_forbidden() {
        let fx = Fixture::new();
        let mut acc =
            shared::models::Account::new("u1", "Blocked", ActorRole::Customer);
        acc.phone = Some("0912345678".into());
        acc.is_blacklisted = true;
        fx.accounts.upsert(acc);

        let err = execute(&fx.ctx(), request(vec![item_input("p1", 1)])).unwrap_err();
        assert!(matches!(err, OrderError::Forbidden(_)));
    }

    #[test]
    fn test_empty_cart_and_item_caps() {
        let fx = Fixture::new();
        assert!(matches!(
            execute(&fx.ctx(), request(vec![])),
            Err(OrderError::Validation(_))
        ));

        let err = execute(&fx.ctx(), request(vec![item_input("p1", 51)])).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_failed_later_item_restores_earlier_reservations() {
        let fx = Fixture::new();
        // p1 reserves fine, p2 wants more than stock → whole creation fails
        let err = execute(
            &fx.ctx(),
            request(vec![item_input("p1", 2), item_input("p2", 11)]),
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::Conflict(_)));
        assert_eq!(fx.catalog.current_stock("p1"), Some(10));
        assert_eq!(fx.catalog.current_stock("p2"), Some(10));
    }

    #[test]
    fn test_voucher_applied_and_snapshotted() {
        let fx = Fixture::new();
        fx.vouchers.upsert(Voucher {
            code: "SALE10".into(),
            name: "Giảm 10%".into(),
            kind: DiscountKind::Percentage,
            value: 10,
            max_discount: Some(5_000),
            min_order_value: 20_000,
            usage_limit: UsageLimit::default(),
            used_count: 0,
            used_by: vec![],
            valid_from: 0,
            valid_until: i64::MAX,
            flash_sale: None,
            is_active: true,
        });

        let mut req = request(vec![item_input("p1", 2), item_input("p2", 1)]);
        req.voucher_code = Some("sale10".into());
        let draft = execute(&fx.ctx(), req).unwrap();

        // 10% of 100_000 capped at 5_000
        assert_eq!(draft.pricing.total, 95_000);
        let applied = draft.pricing.voucher.as_ref().unwrap();
        assert_eq!(applied.code, "SALE10");
        assert_eq!(applied.discount, 5_000);
        assert_eq!(fx.vouchers.find_by_code("SALE10").unwrap().used_count, 1);
    }

    #[test]
    fn test_rejected_voucher_rolls_back_reservations() {
        let fx = Fixture::new();
        let mut req = request(vec![item_input("p1", 2)]);
        req.voucher_code = Some("GHOST".into());
        let err = execute(&fx.ctx(), req).unwrap_err();
        assert!(matches!(err, OrderError::VoucherNotFound(_)));
        assert_eq!(fx.catalog.current_stock("p1"), Some(10));
    }

    #[test]
    fn test_zero_total_rejected_unless_gift() {
        let fx = Fixture::new();
        fx.catalog.upsert(product("free", 0, 10, 1));

        let err = execute(&fx.ctx(), request(vec![item_input("free", 1)])).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(fx.catalog.current_stock("free"), Some(10));

        let mut req = request(vec![item_input("free", 1)]);
        req.is_gift = true;
        req.gift_message = Some("Chúc mừng sinh nhật!".into());
        let draft = execute(&fx.ctx(), req).unwrap();
        assert_eq!(draft.pricing.total, 0);
        assert_eq!(fx.catalog.current_stock("free"), Some(9));
    }

    #[test]
    fn test_size_and_topping_pricing() {
        let fx = Fixture::new();
        let mut input = item_input("p1", 2);
        input.size = Some("L".into());
        input.toppings = vec!["Trân châu".into()];
        let draft = execute(&fx.ctx(), request(vec![input])).unwrap();

        // (30_000 + 5_000 size + 5_000 topping) × 2
        assert_eq!(draft.items[0].item_total, 80_000);
        assert_eq!(draft.pricing.subtotal, 80_000);
    }

    #[test]
    fn test_unknown_size_is_validation_error_with_rollback() {
        let fx = Fixture::new();
        let mut input = item_input("p1", 1);
        input.size = Some("XXL".into());
        let err = execute(&fx.ctx(), request(vec![input])).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(fx.catalog.current_stock("p1"), Some(10));
    }

    #[test]
    fn test_item_note_truncated() {
        let fx = Fixture::new();
        let mut input = item_input("p1", 1);
        input.note = Some("x".repeat(500));
        let draft = execute(&fx.ctx(), request(vec![input])).unwrap();
        assert_eq!(draft.items[0].note.as_ref().unwrap().len(), MAX_ITEM_NOTE_LEN);
    }

    #[test]
    fn test_delivery_requires_location() {
        let fx = Fixture::new();
        let mut req = request(vec![item_input("p1", 1)]);
        req.delivery_location = None;
        assert!(matches!(
            execute(&fx.ctx(), req),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn test_rollback_undoes_draft_side_effects() {
        let fx = Fixture::new();
        let draft = execute(&fx.ctx(), request(vec![item_input("p1", 3)])).unwrap();
        assert_eq!(fx.catalog.current_stock("p1"), Some(7));

        draft.rollback(&fx.catalog, &fx.vouchers);
        assert_eq!(fx.catalog.current_stock("p1"), Some(10));
    }
}
