//! Shared types for the order platform
//!
//! These types are shared between `order-server` and its clients (cashier
//! console, kitchen display, shipper app, customer tracking page):
//!
//! - **order**: the order aggregate, status/payment state machines, domain events
//! - **models**: collaborator models (product, voucher, account, store config)
//! - **message**: realtime rooms and the client event wire format
//! - **util**: small helpers (time, text normalization)

pub mod message;
pub mod models;
pub mod order;
pub mod util;
