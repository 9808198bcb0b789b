//! HTTP/WebSocket server assembly and lifecycle

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::core::ServerState;
use crate::realtime::FanoutRouter;
use crate::realtime::ws::ws_handler;

/// Build the application router
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .merge(api::orders::router())
        .merge(api::health::router())
        .merge(api::presence::router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the server until shutdown is requested.
///
/// Spawns the fan-out router alongside the HTTP listener; the router's
/// broadcast subscription is taken before serving so no event between
/// startup and the first request is lost.
pub async fn run(state: ServerState, shutdown: CancellationToken) -> anyhow::Result<()> {
    let events = state.manager.subscribe();
    let fanout = FanoutRouter::new(state.presence.clone(), state.hub.clone());
    let fanout_task = tokio::spawn(fanout.run(events));

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = %state.config.environment, "Order server listening");

    let app = build_router(state);
    let shutdown_signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown_signal.cancelled().await })
        .await?;

    fanout_task.abort();
    tracing::info!("Order server stopped");
    Ok(())
}
