//! Order API handlers
//!
//! Thin adapters: decode the request, call the manager, wrap the result in
//! the response envelope. Actor identity arrives resolved by the (external)
//! session layer; this surface only carries it through.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use shared::models::product::KitchenZone;
use shared::order::types::{ActorRef, DeliveryFailure, KitchenStatus};
use shared::order::{Order, OrderStatus, PaymentStatus};

use crate::core::ServerState;
use crate::orders::{AggregatedItem, CreateOrderRequest};
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

// ========== Request / Response Shapes ==========

/// Bank transfer reference returned with a created order
#[derive(Debug, Serialize)]
pub struct PaymentRef {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    /// What the customer should put in the transfer note
    pub transfer_note: String,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub payment: PaymentRef,
}

/// Compact tracking view for the customer page
#[derive(Debug, Serialize)]
pub struct OrderStatusView {
    pub order_number: String,
    pub shortcode: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper_name: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct KitchenQuery {
    #[serde(default)]
    pub zone: Option<KitchenZone>,
}

#[derive(Debug, Serialize)]
pub struct KitchenView {
    pub orders: Vec<Order>,
    pub aggregated_items: Vec<AggregatedItem>,
}

#[derive(Debug, Serialize)]
pub struct ShipperView {
    pub available: Vec<Order>,
    pub my_orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub target: OrderStatus,
    pub actor: ActorRef,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub actor: ActorRef,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemStatusRequest {
    pub status: KitchenStatus,
    pub actor: ActorRef,
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: ActorRef,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    pub actor: ActorRef,
    pub outcome: DeliveryFailure,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteDeliveryRequest {
    pub actor: ActorRef,
    #[serde(default)]
    pub payment_collected: bool,
    #[serde(default)]
    pub force_reason: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub actor: ActorRef,
    #[serde(default)]
    pub transaction_ref: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FailPaymentRequest {
    pub actor: ActorRef,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub actor: ActorRef,
    pub note: String,
}

// ========== Handlers ==========

/// Create an order; returns the full order plus the transfer reference
pub async fn create(
    State(state): State<ServerState>,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<Json<AppResponse<CreatedOrder>>> {
    let order = state.manager.create_order(req)?;

    let payment_settings = state.store_config.read().payment.clone();
    let payment = PaymentRef {
        bank_name: payment_settings.bank_name,
        account_number: payment_settings.account_number,
        account_name: payment_settings.account_name,
        transfer_note: format!("{} {}", payment_settings.transfer_template, order.order_number),
        amount: order.pricing.total,
    };

    Ok(ok_with_message(
        CreatedOrder { order, payment },
        "Order placed successfully",
    ))
}

/// List orders by status, queue-sorted
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    Ok(ok(state.manager.list_by_status(query.status)?))
}

/// Full order by id or today's shortcode
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    Ok(ok(state.manager.get_order(&id)?))
}

/// Tracking view
pub async fn get_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<OrderStatusView>>> {
    let order = state.manager.get_order(&id)?;
    Ok(ok(OrderStatusView {
        order_number: order.order_number,
        shortcode: order.shortcode,
        status: order.status,
        payment_status: order.payment.status,
        estimated_ready_at: order.estimated_ready_at,
        estimated_delivery_at: order.estimated_delivery_at,
        shipper_name: order.shipper.assigned_name,
        created_at: order.created_at,
    }))
}

/// Kitchen queue with zone aggregation
pub async fn kitchen(
    State(state): State<ServerState>,
    Query(query): Query<KitchenQuery>,
) -> AppResult<Json<AppResponse<KitchenView>>> {
    let (orders, aggregated_items) = state.manager.kitchen_orders(query.zone)?;
    Ok(ok(KitchenView { orders, aggregated_items }))
}

/// Shipper console lists
pub async fn shipper_orders(
    State(state): State<ServerState>,
    Path(shipper_id): Path<String>,
) -> AppResult<Json<AppResponse<ShipperView>>> {
    let (available, my_orders) = state.manager.shipper_orders(&shipper_id)?;
    Ok(ok(ShipperView { available, my_orders }))
}

/// Customer order history by phone
pub async fn history(
    State(state): State<ServerState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    Ok(ok(state.manager.customer_history(&query.phone)?))
}

/// Staff transition parameterized by target status
pub async fn transition(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .manager
        .transition(&id, req.target, req.actor, req.note)
        .await?;
    Ok(ok_with_message(order, "Status updated"))
}

/// Cancel (customer while pending, staff until terminal)
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.manager.cancel_order(&id, req.actor, req.reason).await?;
    Ok(ok_with_message(order, "Order cancelled"))
}

/// Kitchen updates one item's status
pub async fn set_item_status(
    State(state): State<ServerState>,
    Path((id, index)): Path<(String, usize)>,
    Json(req): Json<ItemStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .manager
        .set_item_status(&id, index, req.status, req.actor)
        .await?;
    Ok(ok(order))
}

/// Whole-order done override
pub async fn mark_ready(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .manager
        .transition(&id, OrderStatus::Ready, req.actor, req.note)
        .await?;
    Ok(ok(order))
}

/// Shipper grabs the order
pub async fn assign_shipper(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.manager.assign_shipper(&id, req.actor).await?;
    Ok(ok_with_message(order, "Order assigned"))
}

/// Assigned shipper departs
pub async fn depart(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.manager.start_delivery(&id, req.actor).await?;
    Ok(ok(order))
}

/// Log a failed delivery attempt
pub async fn log_attempt(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<AttemptRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .manager
        .log_delivery_attempt(&id, req.actor, req.outcome, req.note)
        .await?;
    Ok(ok(order))
}

/// Shipper completes the delivery
pub async fn complete_delivery(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<CompleteDeliveryRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .manager
        .complete_delivery(&id, req.actor, req.payment_collected, req.force_reason, req.note)
        .await?;
    Ok(ok_with_message(order, "Delivery completed"))
}

/// Customer claims the bank transfer was made
pub async fn claim_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.manager.claim_payment(&id).await?;
    Ok(ok_with_message(order, "Claim received - awaiting verification"))
}

/// Staff confirms the payment
pub async fn confirm_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .manager
        .confirm_payment(&id, req.actor, req.transaction_ref, req.note)
        .await?;
    Ok(ok_with_message(order, "Payment confirmed"))
}

/// Staff rejects a claimed payment
pub async fn fail_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<FailPaymentRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.manager.fail_payment(&id, req.actor, req.reason).await?;
    Ok(ok(order))
}

/// Staff refunds a cancelled order's confirmed payment
pub async fn refund_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.manager.refund_payment(&id, req.actor).await?;
    Ok(ok(order))
}

/// Append an internal staff note
pub async fn add_note(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<NoteRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.manager.add_internal_note(&id, req.actor, req.note).await?;
    Ok(ok(order))
}
