//! Connection hub - bounded per-connection outboxes
//!
//! Delivery is best-effort, at-most-once: `try_send` into a bounded queue,
//! drop and log when a client cannot keep up, never block the sender. A
//! reconnecting client re-pulls current state over HTTP instead of relying
//! on replay.

use dashmap::DashMap;
use shared::message::ClientEvent;
use tokio::sync::mpsc;

/// Queue depth per connection; slow consumers drop, they do not backpressure
const OUTBOX_CAPACITY: usize = 64;

/// Registry of per-connection senders
#[derive(Debug, Default)]
pub struct ConnectionHub {
    senders: DashMap<String, mpsc::Sender<ClientEvent>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self { senders: DashMap::new() }
    }

    /// Register a connection and get the receiving end of its outbox
    pub fn register(&self, connection_id: &str) -> mpsc::Receiver<ClientEvent> {
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        self.senders.insert(connection_id.to_string(), tx);
        rx
    }

    /// Remove a connection's outbox (idempotent)
    pub fn unregister(&self, connection_id: &str) {
        self.senders.remove(connection_id);
    }

    /// Queue an event for one connection. A missing or gone connection is
    /// not an error; a full outbox drops the event with a warning.
    pub fn send_to(&self, connection_id: &str, event: ClientEvent) {
        let Some(sender) = self.senders.get(connection_id) else {
            tracing::debug!(connection_id, event = event.name(), "Target offline, event skipped");
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    connection_id,
                    event = event.name(),
                    "Outbox full, event dropped"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(connection_id, "Outbox closed, event skipped");
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{RoleCounts, Room};

    fn ping() -> ClientEvent {
        ClientEvent::OnlineCount { total: 1, by_role: RoleCounts::default() }
    }

    #[tokio::test]
    async fn test_send_reaches_registered_connection() {
        let hub = ConnectionHub::new();
        let mut rx = hub.register("c1");

        hub.send_to("c1", ping());
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "online_count");
    }

    #[tokio::test]
    async fn test_send_to_offline_connection_is_silent() {
        let hub = ConnectionHub::new();
        // Never registered - must not panic or error
        hub.send_to("ghost", ping());

        let _rx = hub.register("c1");
        hub.unregister("c1");
        hub.send_to("c1", ping());
    }

    #[tokio::test]
    async fn test_full_outbox_drops_not_blocks() {
        let hub = ConnectionHub::new();
        let mut rx = hub.register("slow");

        // Overfill: must return immediately every time
        for _ in 0..OUTBOX_CAPACITY * 2 {
            hub.send_to("slow", ping());
        }

        // The consumer still drains at most OUTBOX_CAPACITY events
        let mut drained = 0;
        while rx.try_recv().is_ok() {
            drained += 1;
        }
        assert_eq!(drained, OUTBOX_CAPACITY);
    }

    #[tokio::test]
    async fn test_joined_room_event_roundtrip() {
        let hub = ConnectionHub::new();
        let mut rx = hub.register("c1");
        hub.send_to(
            "c1",
            ClientEvent::JoinedRoom { room: Room::Kitchen, connection_id: "c1".into() },
        );
        match rx.recv().await.unwrap() {
            ClientEvent::JoinedRoom { room, .. } => assert_eq!(room, Room::Kitchen),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
