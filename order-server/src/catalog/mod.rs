//! Catalog service - product lookup and atomic stock movements
//!
//! Stock is reserved optimistically at order-creation time, item by item,
//! and restored when a reservation is rolled back or a pending order is
//! cancelled. Each movement is a read-modify-write under the product's
//! DashMap entry lock, so concurrent orders competing for the same product
//! never lose updates.

use dashmap::DashMap;
use shared::models::product::Product;

use crate::orders::{OrderError, OrderResult};

/// In-memory product catalog
#[derive(Debug, Default)]
pub struct CatalogService {
    products: DashMap<String, Product>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self { products: DashMap::new() }
    }

    /// Insert or replace a product
    pub fn upsert(&self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Fetch a product snapshot by id
    pub fn get(&self, id: &str) -> Option<Product> {
        self.products.get(id).map(|p| p.clone())
    }

    /// Current stock level (test/report helper)
    pub fn current_stock(&self, id: &str) -> Option<u32> {
        self.products.get(id).map(|p| p.inventory.current_stock)
    }

    /// Atomically reserve `quantity` units: checks availability and stock,
    /// decrements stock, bumps the sold counter, and flags limited stock
    /// when the threshold is crossed.
    pub fn reserve_stock(&self, id: &str, quantity: u32) -> OrderResult<()> {
        let mut entry = self
            .products
            .get_mut(id)
            .ok_or_else(|| OrderError::ProductNotFound(id.to_string()))?;
        let product = entry.value_mut();

        if !product.inventory.is_available {
            return Err(OrderError::Conflict(format!(
                "\"{}\" is sold out",
                product.name
            )));
        }
        if product.inventory.current_stock < quantity {
            return Err(OrderError::Conflict(format!(
                "\"{}\" has only {} left",
                product.name, product.inventory.current_stock
            )));
        }

        product.inventory.current_stock -= quantity;
        product.inventory.sold_count += quantity as u64;
        if product.inventory.current_stock <= product.inventory.low_stock_threshold {
            product.inventory.is_limited_stock = true;
        }
        Ok(())
    }

    /// Atomically restore a prior reservation. Counterpart of
    /// [`reserve_stock`](Self::reserve_stock); a cancelled pending order
    /// must restore exactly the quantities it reserved.
    pub fn restore_stock(&self, id: &str, quantity: u32) {
        let Some(mut entry) = self.products.get_mut(id) else {
            // Product removed from catalog after the order was taken; the
            // reservation has nothing to return to.
            tracing::warn!(product_id = %id, quantity, "Restore for unknown product, skipping");
            return;
        };
        let product = entry.value_mut();
        product.inventory.current_stock += quantity;
        product.inventory.sold_count = product.inventory.sold_count.saturating_sub(quantity as u64);
        if product.inventory.current_stock > product.inventory.low_stock_threshold {
            product.inventory.is_limited_stock = false;
        }
    }

    /// Toggle availability (kitchen 86's an item)
    pub fn set_availability(&self, id: &str, is_available: bool) -> OrderResult<()> {
        let mut entry = self
            .products
            .get_mut(id)
            .ok_or_else(|| OrderError::ProductNotFound(id.to_string()))?;
        entry.value_mut().inventory.is_available = is_available;
        Ok(())
    }
}
