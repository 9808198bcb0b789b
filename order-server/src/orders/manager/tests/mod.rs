//! OrdersManager test suite
//!
//! - **test_core**: creation, identity, queries, store switch
//! - **test_flows**: full lifecycle flows, races, payment machine

mod test_flows;

use std::sync::Arc;

use parking_lot::RwLock;
use shared::models::product::{Inventory, KitchenZone, Product};
use shared::models::store_config::StoreConfig;
use shared::models::voucher::{DiscountKind, UsageLimit, Voucher};
use shared::order::types::{OrderItemInput, OrderType, PaymentMethod};

use crate::accounts::AccountService;
use crate::catalog::CatalogService;
use crate::orders::actions::create_order::{CreateOrderRequest, CustomerInput};
use crate::orders::storage::OrderStorage;
use crate::orders::OrdersManager;
use crate::vouchers::VoucherService;

pub(super) struct TestEnv {
    pub manager: OrdersManager,
    pub catalog: Arc<CatalogService>,
    pub vouchers: Arc<VoucherService>,
    pub accounts: Arc<AccountService>,
    pub store_config: Arc<RwLock<StoreConfig>>,
}

pub(super) fn test_env() -> TestEnv {
    let catalog = Arc::new(CatalogService::new());
    catalog.upsert(test_product("com-ga", "Cơm gà", 35_000, 10, 5, KitchenZone::HotKitchen));
    catalog.upsert(test_product("tra-sua", "Trà sữa", 25_000, 10, 8, KitchenZone::Beverage));

    let vouchers = Arc::new(VoucherService::new());
    vouchers.upsert(Voucher {
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

    let accounts = Arc::new(AccountService::new());
    let store_config = Arc::new(RwLock::new(StoreConfig::default()));

    let manager = OrdersManager::new(
        OrderStorage::open_in_memory().unwrap(),
        Arc::clone(&catalog),
        Arc::clone(&vouchers),
        Arc::clone(&accounts),
        Arc::clone(&store_config),
        chrono_tz::Asia::Ho_Chi_Minh,
    );

    TestEnv { manager, catalog, vouchers, accounts, store_config }
}

pub(super) fn test_product(
    id: &str,
    name: &str,
    price: i64,
    stock: u32,
    prep: u32,
    zone: KitchenZone,
) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        price,
        happy_hour: None,
        sizes: vec![],
        sugar_levels: vec![],
        ice_levels: vec![],
        toppings: vec![],
        required_options: vec![],
        kitchen_zone: zone,
        prep_time_minutes: prep,
        inventory: Inventory { current_stock: stock, ..Default::default() },
    }
}

pub(super) fn item_input(product_id: &str, quantity: u32) -> OrderItemInput {
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

pub(super) fn delivery_request(items: Vec<OrderItemInput>) -> CreateOrderRequest {
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
