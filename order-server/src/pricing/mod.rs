//! Pricing & discount engine

pub mod calculator;

pub use calculator::{OrderTotals, compute_order_totals, item_total, unit_price};
