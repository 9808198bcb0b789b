//! OrdersManager - 订单核心：串行化每单的变更并广播事件
//!
//! # Mutation Flow
//!
//! ```text
//! operation(order_id, ...)
//!     ├─ 1. Acquire the per-order lock (serializes racing operations)
//!     ├─ 2. Load the order from redb
//!     ├─ 3. Run the action (validate + mutate + audit, in memory)
//!     ├─ 4. Persist order (status + audit commit together, or neither)
//!     ├─ 5. Post-commit side effects (stock restore on cancel)
//!     └─ 6. Broadcast event(s) - fire-and-forget
//! ```
//!
//! Operations on one order are serialized by the lock in step 1, so a
//! cashier-confirm racing a customer-cancel resolves to exactly one winner;
//! the loser sees the committed state and gets `InvalidTransition`.
//! Operations on distinct orders proceed fully in parallel.

use std::sync::Arc;

use chrono_tz::Tz;
use dashmap::DashMap;
use parking_lot::RwLock;
use shared::models::product::KitchenZone;
use shared::models::store_config::StoreConfig;
use shared::order::types::{ActorRef, DeliveryFailure, InternalNote, KitchenStatus};
use shared::order::{EventPayload, Order, OrderEvent, OrderEventType, OrderStatus};
use shared::util::now_millis;
use tokio::sync::broadcast;

use super::actions::{
    self, assign_shipper, cancel_order, complete_delivery, complete_order, confirm_order,
    create_order::{CreateOrderContext, CreateOrderRequest},
    delivery_attempt, kitchen_progress, payment,
};
use super::kitchen::{AggregatedItem, aggregate_pending_items};
use super::storage::OrderStorage;
use super::{OrderError, OrderResult};
use crate::accounts::AccountService;
use crate::catalog::CatalogService;
use crate::utils::time;
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use crate::vouchers::VoucherService;

/// Event broadcast channel capacity (一个高峰日 ≈ 数千事件)
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Cap applied to list queries
const LIST_LIMIT: usize = 100;

/// Orders returned for customer history lookups
const HISTORY_LIMIT: usize = 20;

/// Result of one mutation: the committed order plus what to do after commit
struct MutationOutput {
    events: Vec<OrderEvent>,
    stock_restores: Vec<(String, u32)>,
}

impl MutationOutput {
    fn events(events: Vec<OrderEvent>) -> Self {
        Self { events, stock_restores: vec![] }
    }
}

/// Core order manager
pub struct OrdersManager {
    storage: OrderStorage,
    catalog: Arc<CatalogService>,
    vouchers: Arc<VoucherService>,
    accounts: Arc<AccountService>,
    store_config: Arc<RwLock<StoreConfig>>,
    event_tx: broadcast::Sender<OrderEvent>,
    /// Per-order mutation locks; entries are dropped at terminal status
    locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    /// 业务时区
    tz: Tz,
}

impl OrdersManager {
    pub fn new(
        storage: OrderStorage,
        catalog: Arc<CatalogService>,
        vouchers: Arc<VoucherService>,
        accounts: Arc<AccountService>,
        store_config: Arc<RwLock<StoreConfig>>,
        tz: Tz,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            catalog,
            vouchers,
            accounts,
            store_config,
            event_tx,
            locks: DashMap::new(),
            tz,
        }
    }

    /// Subscribe to domain event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast after commit. A send error only means nobody is listening.
    fn broadcast(&self, events: Vec<OrderEvent>) {
        for event in events {
            if self.event_tx.send(event).is_err() {
                tracing::debug!("Event broadcast skipped: no active receivers");
                break;
            }
        }
    }

    // ========== Creation ==========

    /// Create an order: validation pipeline, stock reservation, voucher
    /// redemption, identity allocation, persist, broadcast.
    pub fn create_order(&self, req: CreateOrderRequest) -> OrderResult<Order> {
        // Store switch checked before anything else
        let store = self.store_config.read().clone();
        if store.operations.stop_online_orders || !store.operations.is_open {
            let reason = store
                .operations
                .stop_reason
                .clone()
                .unwrap_or_else(|| "The store is temporarily not taking online orders".into());
            return Err(OrderError::StoreClosed(reason));
        }

        let now = now_millis();
        let ctx = CreateOrderContext {
            catalog: &self.catalog,
            vouchers: &self.vouchers,
            accounts: &self.accounts,
            store: &store,
            local_time: time::local_time(self.tz),
            now,
        };
        let draft = actions::create_order::execute(&ctx, req)?;

        // Identity is allocated only after validation succeeded, so failed
        // requests never burn order numbers
        let today = time::today_numeric(self.tz);
        let (order_number, shortcode) = match self.storage.next_order_identity(today) {
            Ok(identity) => identity,
            Err(err) => {
                draft.rollback(&self.catalog, &self.vouchers);
                return Err(err.into());
            }
        };
        let order_id = uuid::Uuid::new_v4().to_string();
        let order = draft_to_persisted(self, draft, order_id, order_number, shortcode, today, now)?;

        let event = OrderEvent::for_order(
            &order,
            None,
            Some(shared::order::ActorRole::Customer),
            OrderEventType::OrderCreated,
            EventPayload::OrderCreated { order: Box::new(order.clone()) },
        );
        self.broadcast(vec![event]);

        tracing::info!(
            order_number = %order.order_number,
            shortcode = %order.shortcode,
            total = order.pricing.total,
            "Order created"
        );
        Ok(order)
    }

    // ========== Generic Mutation Path ==========

    /// Serialize, load, act, persist, then run post-commit effects.
    async fn mutate<F>(&self, order_id: &str, f: F) -> OrderResult<Order>
    where
        F: FnOnce(&mut Order) -> OrderResult<MutationOutput>,
    {
        let lock = self
            .locks
            .entry(order_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut order = self
            .storage
            .get_order(order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

        let output = f(&mut order)?;

        let txn = self.storage.begin_write()?;
        self.storage.store_order(&txn, &order)?;
        if order.is_terminal() {
            self.storage.mark_order_inactive(&txn, &order.id)?;
        }
        txn.commit().map_err(super::storage::StorageError::from)?;

        // Stock restoration runs after the cancelled state is durable; the
        // in-memory catalog cannot fail here
        for (product_id, quantity) in &output.stock_restores {
            self.catalog.restore_stock(product_id, *quantity);
        }

        if order.is_terminal() {
            self.locks.remove(order_id);
        }

        self.broadcast(output.events);
        Ok(order)
    }

    // ========== Transitions ==========

    /// Staff transition operation parameterized by target status. Specific
    /// flows (shipper assignment, payment) have their own operations below.
    pub async fn transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        actor: ActorRef,
        note: Option<String>,
    ) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            let events = match target {
                OrderStatus::Confirmed => confirm_order::execute(order, &actor, note, now)?,
                OrderStatus::Cooking => kitchen_progress::start_cooking(order, &actor, note, now)?,
                OrderStatus::Ready => kitchen_progress::mark_order_ready(order, &actor, note, now)?,
                OrderStatus::Delivering => start_delivery_events(order, &actor, now)?,
                OrderStatus::Completed => complete_events(order, &actor, note, now)?,
                OrderStatus::Cancelled => {
                    let (events, restores) = cancel_order::execute(order, &actor, note, now)?;
                    return Ok(MutationOutput { events, stock_restores: restores });
                }
                OrderStatus::Pending => {
                    return Err(OrderError::InvalidTransition {
                        from: order.status,
                        to: OrderStatus::Pending,
                    });
                }
            };
            Ok(MutationOutput::events(events))
        })
        .await
    }

    /// Cancel an order (customer while pending; staff until terminal)
    pub async fn cancel_order(
        &self,
        order_id: &str,
        actor: ActorRef,
        reason: Option<String>,
    ) -> OrderResult<Order> {
        self.transition(order_id, OrderStatus::Cancelled, actor, reason).await
    }

    /// Kitchen updates one item's status; aggregate status cascades
    pub async fn set_item_status(
        &self,
        order_id: &str,
        item_index: usize,
        status: KitchenStatus,
        actor: ActorRef,
    ) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            kitchen_progress::set_item_status(order, item_index, status, &actor, now)
                .map(MutationOutput::events)
        })
        .await
    }

    /// A shipper grabs a ready delivery order
    pub async fn assign_shipper(&self, order_id: &str, actor: ActorRef) -> OrderResult<Order> {
        let shipper_name = actor
            .id
            .as_deref()
            .and_then(|id| self.accounts.display_name(id))
            .or_else(|| actor.name.clone())
            .unwrap_or_else(|| "shipper".to_string());
        let now = now_millis();
        self.mutate(order_id, move |order| {
            assign_shipper::execute(order, &actor, shipper_name, now).map(MutationOutput::events)
        })
        .await
    }

    /// The assigned shipper departs
    pub async fn start_delivery(&self, order_id: &str, actor: ActorRef) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            actions::start_delivery::execute(order, &actor, now).map(MutationOutput::events)
        })
        .await
    }

    /// Log a failed delivery attempt
    pub async fn log_delivery_attempt(
        &self,
        order_id: &str,
        actor: ActorRef,
        outcome: DeliveryFailure,
        note: Option<String>,
    ) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            delivery_attempt::execute(order, &actor, outcome, note, now)
                .map(MutationOutput::events)
        })
        .await
    }

    /// Shipper completes the delivery (cash rule / force override inside)
    pub async fn complete_delivery(
        &self,
        order_id: &str,
        actor: ActorRef,
        payment_collected: bool,
        force_reason: Option<String>,
        note: Option<String>,
    ) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            complete_delivery::execute(order, &actor, payment_collected, force_reason, note, now)
                .map(MutationOutput::events)
        })
        .await
    }

    // ========== Payment Operations ==========

    /// Customer claims the bank transfer was made
    pub async fn claim_payment(&self, order_id: &str) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            payment::claim(order, now).map(MutationOutput::events)
        })
        .await
    }

    /// Staff confirms the payment
    pub async fn confirm_payment(
        &self,
        order_id: &str,
        actor: ActorRef,
        transaction_ref: Option<String>,
        note: Option<String>,
    ) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            payment::confirm(order, &actor, transaction_ref, note, now)
                .map(MutationOutput::events)
        })
        .await
    }

    /// Staff rejects a claimed payment
    pub async fn fail_payment(
        &self,
        order_id: &str,
        actor: ActorRef,
        reason: Option<String>,
    ) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            payment::fail(order, &actor, reason, now).map(MutationOutput::events)
        })
        .await
    }

    /// Staff refunds a confirmed payment on a cancelled order
    pub async fn refund_payment(&self, order_id: &str, actor: ActorRef) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            payment::refund(order, &actor, now).map(MutationOutput::events)
        })
        .await
    }

    /// Append an internal staff note (no event, audit only)
    pub async fn add_internal_note(
        &self,
        order_id: &str,
        actor: ActorRef,
        note: String,
    ) -> OrderResult<Order> {
        let now = now_millis();
        self.mutate(order_id, move |order| {
            validate_required_text(&note, "note", MAX_NOTE_LEN)?;
            order.internal_notes.push(InternalNote {
                note: note.clone(),
                created_by: actor.id.clone(),
                created_at: now,
            });
            order.push_audit(
                "internal_note_added",
                actor.id.clone(),
                Some(actor.role),
                now,
                None,
                None,
                Some(note),
            );
            Ok(MutationOutput::events(vec![]))
        })
        .await
    }

    // ========== Queries ==========

    /// Resolve an order by id or by today's shortcode
    pub fn get_order(&self, id_or_shortcode: &str) -> OrderResult<Order> {
        if let Some(order) = self.storage.get_order(id_or_shortcode)? {
            return Ok(order);
        }
        let today = time::today_numeric(self.tz);
        let code = id_or_shortcode.to_uppercase();
        if let Some(order_id) = self.storage.find_by_shortcode(today, &code)? {
            if let Some(order) = self.storage.get_order(&order_id)? {
                return Ok(order);
            }
        }
        Err(OrderError::OrderNotFound(id_or_shortcode.to_string()))
    }

    /// Orders filtered by status, sorted `(priority desc, created_at asc,
    /// order_number asc)`, capped at 100
    pub fn list_by_status(&self, status: Option<OrderStatus>) -> OrderResult<Vec<Order>> {
        let mut orders = match status {
            // Active statuses come off the active index; terminal ones need
            // the full scan
            Some(s) if !s.is_terminal() => self.storage.get_active_orders()?,
            _ => self.storage.all_orders()?,
        };
        if let Some(s) = status {
            orders.retain(|o| o.status == s);
        }
        orders.sort_by_key(|o| o.queue_key());
        orders.truncate(LIST_LIMIT);
        Ok(orders)
    }

    /// Kitchen queue: CONFIRMED and COOKING orders plus the zone-aggregated
    /// item lines
    pub fn kitchen_orders(
        &self,
        zone: Option<KitchenZone>,
    ) -> OrderResult<(Vec<Order>, Vec<AggregatedItem>)> {
        let mut orders = self.storage.get_active_orders()?;
        orders.retain(|o| matches!(o.status, OrderStatus::Confirmed | OrderStatus::Cooking));
        orders.sort_by_key(|o| o.queue_key());
        let aggregated = aggregate_pending_items(orders.iter(), zone);
        Ok((orders, aggregated))
    }

    /// Shipper console: unassigned ready deliveries + this rider's own load
    pub fn shipper_orders(&self, shipper_id: &str) -> OrderResult<(Vec<Order>, Vec<Order>)> {
        let orders = self.storage.get_active_orders()?;
        let mut available: Vec<Order> = orders
            .iter()
            .filter(|o| {
                o.status == OrderStatus::Ready
                    && o.order_type == shared::order::OrderType::Delivery
                    && o.shipper.assigned_to.is_none()
            })
            .cloned()
            .collect();
        available.sort_by_key(|o| o.queue_key());

        let mut mine: Vec<Order> = orders
            .iter()
            .filter(|o| o.shipper.assigned_to.as_deref() == Some(shipper_id))
            .cloned()
            .collect();
        mine.sort_by_key(|o| o.shipper.assigned_at.unwrap_or(i64::MAX));

        Ok((available, mine))
    }

    /// Customer history by phone, newest first
    pub fn customer_history(&self, phone: &str) -> OrderResult<Vec<Order>> {
        let normalized = shared::util::normalize_phone(phone);
        let mut orders = self.storage.all_orders()?;
        orders.retain(|o| o.customer.phone == normalized);
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        orders.truncate(HISTORY_LIMIT);
        Ok(orders)
    }

    /// Store config handle (handlers flip the stop-orders switch through it)
    pub fn store_config(&self) -> &Arc<RwLock<StoreConfig>> {
        &self.store_config
    }
}

/// Dispatch READY → DELIVERING through the delivery action
fn start_delivery_events(
    order: &mut Order,
    actor: &ActorRef,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    actions::start_delivery::execute(order, actor, now)
}

/// Generic COMPLETED target: counter hand-over from READY, shipper flow
/// (without collection flags) from DELIVERING.
fn complete_events(
    order: &mut Order,
    actor: &ActorRef,
    note: Option<String>,
    now: i64,
) -> OrderResult<Vec<OrderEvent>> {
    match order.status {
        OrderStatus::Delivering => {
            complete_delivery::execute(order, actor, false, None, note, now)
        }
        _ => complete_order::execute(order, actor, note, now),
    }
}

/// Persist a validated draft, rolling back its side effects on failure
fn draft_to_persisted(
    manager: &OrdersManager,
    draft: actions::create_order::OrderDraft,
    order_id: String,
    order_number: String,
    shortcode: String,
    today: u64,
    now: i64,
) -> OrderResult<Order> {
    // Keep rollback info before the draft is consumed
    let persist = |order: &Order| -> OrderResult<()> {
        let txn = manager.storage.begin_write()?;
        manager.storage.store_order(&txn, order)?;
        manager.storage.index_shortcode(&txn, today, &order.shortcode, &order.id)?;
        manager.storage.mark_order_active(&txn, &order.id)?;
        txn.commit().map_err(super::storage::StorageError::from)?;
        Ok(())
    };

    let rollback_stock: Vec<(String, u32)> = draft
        .items
        .iter()
        .map(|i| (i.product_id.clone(), i.quantity))
        .collect();
    let rollback_voucher = draft.pricing.voucher.as_ref().map(|v| {
        (
            v.code.clone(),
            draft.customer.account_id.clone(),
            draft.customer.phone.clone(),
        )
    });

    let order = draft.into_order(order_id, order_number, shortcode, now);
    match persist(&order) {
        Ok(()) => Ok(order),
        Err(err) => {
            // The whole creation is one logical transaction: a failed save
            // returns the stock and the voucher use
            for (product_id, quantity) in &rollback_stock {
                manager.catalog.restore_stock(product_id, *quantity);
            }
            if let Some((code, account_id, phone)) = &rollback_voucher {
                manager.vouchers.release(code, account_id.as_deref(), phone);
            }
            tracing::error!(error = %err, "Order persistence failed, creation rolled back");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests;
