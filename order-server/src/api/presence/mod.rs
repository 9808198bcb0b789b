//! Online-presence snapshot endpoint

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use shared::message::RoleCounts;

use crate::core::ServerState;
use crate::utils::{AppResponse, ok};

#[derive(Debug, Serialize)]
pub struct OnlineSnapshot {
    pub total: usize,
    pub by_role: RoleCounts,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/presence/online", get(online))
}

async fn online(State(state): State<ServerState>) -> Json<AppResponse<OnlineSnapshot>> {
    let (total, by_role) = state.presence.online_counts();
    ok(OnlineSnapshot { total, by_role })
}
