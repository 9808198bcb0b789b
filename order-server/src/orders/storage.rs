//! redb-based storage layer for orders
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` (JSON) | Canonical order state incl. audit log |
//! | `shortcodes` | `"YYYYMMDD/CODE"` | `order_id` | Daily shortcode lookup |
//! | `active_orders` | `order_id` | `()` | Non-terminal order index |
//! | `counters` | key | `u64` | Daily order counter + date |
//!
//! # Atomicity
//!
//! A status change and its audit entry live inside the same `Order` value,
//! so a single `insert` inside one write transaction persists them together
//! or not at all. redb commits with immediate durability; the database file
//! is always in a consistent state even across power loss.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::order::Order;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Canonical order state: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Daily shortcode index: key = "YYYYMMDD/CODE", value = order_id
const SHORTCODE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("shortcodes");

/// Active (non-terminal) order index: key = order_id, value = ()
const ACTIVE_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("active_orders");

/// Counters: key = "order_date" | "order_count", value = u64
const COUNTER_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const ORDER_DATE_KEY: &str = "order_date";
const ORDER_COUNT_KEY: &str = "order_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(SHORTCODE_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(COUNTER_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Identity ==========

    /// Allocate the next `(order_number, shortcode)` pair, crash-safe.
    ///
    /// The counter resets when the stored business date differs from
    /// `today` (store timezone, `YYYYMMDD` numeric). Allocation commits its
    /// own transaction, so a later failure in order creation burns the
    /// number rather than reusing it - numbers stay strictly increasing.
    pub fn next_order_identity(&self, today: u64) -> StorageResult<(String, String)> {
        let txn = self.db.begin_write()?;
        let count = {
            let mut table = txn.open_table(COUNTER_TABLE)?;
            let stored_date = table.get(ORDER_DATE_KEY)?.map(|g| g.value()).unwrap_or(0);
            let current = if stored_date == today {
                table.get(ORDER_COUNT_KEY)?.map(|g| g.value()).unwrap_or(0)
            } else {
                table.insert(ORDER_DATE_KEY, today)?;
                0
            };
            let next = current + 1;
            table.insert(ORDER_COUNT_KEY, next)?;
            next
        };
        txn.commit()?;

        let order_number = format!("ORD-{today}-{count:04}");
        let shortcode = shortcode_for_index(count - 1);
        Ok((order_number, shortcode))
    }

    // ========== Order Operations ==========

    /// Persist an order (insert or replace) within a transaction
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Index the daily shortcode of a freshly created order
    pub fn index_shortcode(
        &self,
        txn: &WriteTransaction,
        today: u64,
        shortcode: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SHORTCODE_TABLE)?;
        let key = format!("{today}/{shortcode}");
        table.insert(key.as_str(), order_id)?;
        Ok(())
    }

    /// Mark an order as active (non-terminal)
    pub fn mark_order_active(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        table.insert(order_id, ())?;
        Ok(())
    }

    /// Remove an order from the active index (terminal status reached)
    pub fn mark_order_inactive(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Load an order by id
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Resolve today's shortcode to an order id
    pub fn find_by_shortcode(&self, today: u64, shortcode: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHORTCODE_TABLE)?;
        let key = format!("{today}/{shortcode}");
        Ok(table.get(key.as_str())?.map(|g| g.value().to_string()))
    }

    /// Ids of all active orders
    pub fn get_active_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let mut ids = Vec::new();
        for result in table.iter()? {
            let (key, _) = result?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }

    /// Load all active orders
    pub fn get_active_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in active.iter()? {
            let (key, _) = result?;
            if let Some(guard) = orders_table.get(key.value())? {
                orders.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(orders)
    }

    /// Full scan of every stored order (bounded-list queries filter on top)
    pub fn all_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }
}

/// Display shortcode for the Nth order of the day (0-based).
///
/// Cycles `A01..A99, B01..Z99`, then `AA01..ZZ99`. The numeric suffix runs
/// 01..99 (never 00), matching what staff shout across the counter.
pub fn shortcode_for_index(index: u64) -> String {
    let suffix = index % 99 + 1;
    let block = index / 99;
    if block < 26 {
        let letter = (b'A' + block as u8) as char;
        format!("{letter}{suffix:02}")
    } else {
        let block = (block - 26) % (26 * 26);
        let first = (b'A' + (block / 26) as u8) as char;
        let second = (b'A' + (block % 26) as u8) as char;
        format!("{first}{second}{suffix:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcode_cycle() {
        assert_eq!(shortcode_for_index(0), "A01");
        assert_eq!(shortcode_for_index(98), "A99");
        assert_eq!(shortcode_for_index(99), "B01");
        assert_eq!(shortcode_for_index(25 * 99), "Z01");
        assert_eq!(shortcode_for_index(26 * 99 - 1), "Z99");
        // Past Z99 the prefix doubles up
        assert_eq!(shortcode_for_index(26 * 99), "AA01");
        assert_eq!(shortcode_for_index(27 * 99), "AB01");
    }

    #[test]
    fn test_shortcodes_unique_within_a_day() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..26 * 99 {
            assert!(seen.insert(shortcode_for_index(i)), "collision at {i}");
        }
    }

    #[test]
    fn test_order_numbers_strictly_increasing_and_reset_daily() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let (n1, s1) = storage.next_order_identity(20260805).unwrap();
        let (n2, s2) = storage.next_order_identity(20260805).unwrap();
        assert_eq!(n1, "ORD-20260805-0001");
        assert_eq!(n2, "ORD-20260805-0002");
        assert_eq!(s1, "A01");
        assert_eq!(s2, "A02");

        // New business day resets both sequences
        let (n3, s3) = storage.next_order_identity(20260806).unwrap();
        assert_eq!(n3, "ORD-20260806-0001");
        assert_eq!(s3, "A01");
    }

    #[test]
    fn test_identity_survives_failed_creation() {
        // A burned number is never reused
        let storage = OrderStorage::open_in_memory().unwrap();
        let _ = storage.next_order_identity(20260805).unwrap();
        let (n2, _) = storage.next_order_identity(20260805).unwrap();
        assert_eq!(n2, "ORD-20260805-0002");
    }
}
