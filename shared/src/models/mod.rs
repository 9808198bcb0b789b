//! Collaborator models consumed by the order core

pub mod account;
pub mod product;
pub mod store_config;
pub mod voucher;

pub use account::Account;
pub use product::{Inventory, KitchenZone, Product};
pub use store_config::StoreConfig;
pub use voucher::{DiscountKind, Voucher, VoucherRejection};
