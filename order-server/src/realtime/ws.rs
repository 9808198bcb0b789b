//! WebSocket endpoint - one event stream per connection
//!
//! A client connects with `GET /ws?role=kitchen[&account_id=...]` and is
//! subscribed into exactly one role room for its lifetime. Outbound frames
//! are JSON-serialized [`ClientEvent`] values; inbound frames are ignored
//! (all mutations go through the HTTP API).

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use shared::message::{ClientEvent, Room};

use crate::core::ServerState;
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    pub role: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Upgrade handler: validates the role before accepting the socket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<JoinQuery>,
    State(state): State<ServerState>,
) -> Response {
    let Some(room) = Room::parse(&query.role) else {
        return AppError::validation(format!("Unknown role: {}", query.role)).into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, room, query.account_id))
}

async fn handle_socket(
    mut socket: WebSocket,
    state: ServerState,
    room: Room,
    account_id: Option<String>,
) {
    let connection_id = uuid::Uuid::new_v4().to_string();
    let mut outbox = state.hub.register(&connection_id);
    state.presence.join(&connection_id, room, account_id);
    tracing::info!(%connection_id, room = %room, "WebSocket connected");

    state.hub.send_to(
        &connection_id,
        ClientEvent::JoinedRoom { room, connection_id: connection_id.clone() },
    );
    broadcast_online_counts(&state);

    loop {
        tokio::select! {
            event = outbox.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else {
                    tracing::warn!(event = event.name(), "Failed to serialize client event");
                    continue;
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Mutations ride the HTTP API; inbound frames are noise
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.presence.leave(&connection_id);
    state.hub.unregister(&connection_id);
    broadcast_online_counts(&state);
    tracing::info!(%connection_id, "WebSocket disconnected");
}

/// Push fresh counts to every connection (join/leave ripple)
pub fn broadcast_online_counts(state: &ServerState) {
    let (total, by_role) = state.presence.online_counts();
    let event = ClientEvent::OnlineCount { total, by_role };
    for connection_id in state.presence.all_connections() {
        state.hub.send_to(&connection_id, event.clone());
    }
}
