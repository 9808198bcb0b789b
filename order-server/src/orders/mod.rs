//! Order management for the order server
//!
//! - **manager**: serialized command processing and event broadcast
//! - **actions**: one module per operation (validate + mutate + audit)
//! - **storage**: redb persistence (orders, shortcode index, daily counter)
//! - **priority**: priority scoring and ready/delivery time estimation
//! - **kitchen**: pure zone aggregation for the kitchen display

pub mod actions;
pub mod error;
pub mod kitchen;
pub mod manager;
pub mod priority;
pub mod storage;

pub use actions::create_order::{CreateOrderRequest, CustomerInput};
pub use error::{OrderError, OrderResult};
pub use kitchen::{AggregatedItem, ItemRef};
pub use manager::OrdersManager;
pub use storage::{OrderStorage, StorageError};
