//! Health check endpoint

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{AppResponse, ok};

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub environment: String,
    pub connections: usize,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health(State(state): State<ServerState>) -> Json<AppResponse<HealthInfo>> {
    ok(HealthInfo {
        status: "ok",
        environment: state.config.environment.clone(),
        connections: state.hub.connection_count(),
    })
}
