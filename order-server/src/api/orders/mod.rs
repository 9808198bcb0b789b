//! Order API Module
//!
//! All mutations go through the OrdersManager; reads are queue-sorted
//! queries over the same storage.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        // Role-scoped views
        .route("/history", get(handler::history))
        .route("/kitchen", get(handler::kitchen))
        .route("/shipper/{shipper_id}", get(handler::shipper_orders))
        // Single order
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", get(handler::get_status))
        // Transitions
        .route("/{id}/transition", post(handler::transition))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/ready", post(handler::mark_ready))
        .route("/{id}/items/{index}/status", post(handler::set_item_status))
        // Shipper flow
        .route("/{id}/shipper/assign", post(handler::assign_shipper))
        .route("/{id}/shipper/depart", post(handler::depart))
        .route("/{id}/shipper/attempt", post(handler::log_attempt))
        .route("/{id}/shipper/complete", post(handler::complete_delivery))
        // Payment machine
        .route("/{id}/payment/claim", post(handler::claim_payment))
        .route("/{id}/payment/confirm", post(handler::confirm_payment))
        .route("/{id}/payment/fail", post(handler::fail_payment))
        .route("/{id}/payment/refund", post(handler::refund_payment))
        // Internal notes
        .route("/{id}/notes", post(handler::add_note))
}
