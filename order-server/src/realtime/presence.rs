//! Presence & room registry
//!
//! 在线状态登记 - 谁在线、在哪个房间、哪个账号。
//!
//! Tracks every live connection's room, optional linked account, and join
//! time, plus the inverse room → members index. All state lives behind this
//! registry object; it is created at process start and dropped at shutdown,
//! never global. `online_counts` reads per-room set sizes, O(#roles), not a
//! scan of connections.

use dashmap::DashMap;
use shared::message::{RoleCounts, Room};
use shared::util::now_millis;
use std::collections::HashSet;

/// One live connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: String,
    pub room: Room,
    pub account_id: Option<String>,
    pub joined_at: i64,
}

/// Connection/room registry
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    connections: DashMap<String, ConnectionInfo>,
    rooms: DashMap<Room, HashSet<String>>,
    /// account id → connection id; at most one live connection per account
    by_account: DashMap<String, String>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
            by_account: DashMap::new(),
        }
    }

    /// Register a connection in its role room. A second join for the same
    /// account supersedes the previous mapping (last-writer-wins); the older
    /// connection stays in its room but is no longer the account's address.
    pub fn join(&self, connection_id: &str, room: Room, account_id: Option<String>) {
        self.connections.insert(
            connection_id.to_string(),
            ConnectionInfo {
                id: connection_id.to_string(),
                room,
                account_id: account_id.clone(),
                joined_at: now_millis(),
            },
        );
        self.rooms
            .entry(room)
            .or_default()
            .insert(connection_id.to_string());
        if let Some(account) = account_id {
            self.by_account.insert(account, connection_id.to_string());
        }
        tracing::debug!(connection_id, room = %room, "Connection joined room");
    }

    /// Remove a connection. Idempotent: a second leave is a no-op. Clears
    /// the account mapping only if this connection still owns it.
    pub fn leave(&self, connection_id: &str) {
        let Some((_, info)) = self.connections.remove(connection_id) else {
            return;
        };
        if let Some(mut members) = self.rooms.get_mut(&info.room) {
            members.remove(connection_id);
        }
        if let Some(account) = &info.account_id {
            self.by_account
                .remove_if(account, |_, mapped| mapped == connection_id);
        }
        tracing::debug!(connection_id, room = %info.room, "Connection left room");
    }

    /// Members of a role room
    pub fn members_of(&self, room: Room) -> Vec<String> {
        self.rooms
            .get(&room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The account's current connection, if reachable
    pub fn connection_for(&self, account_id: &str) -> Option<String> {
        self.by_account.get(account_id).map(|c| c.clone())
    }

    /// All live connection ids (for broadcast-to-all)
    pub fn all_connections(&self) -> Vec<String> {
        self.connections.iter().map(|c| c.key().clone()).collect()
    }

    /// Counts snapshot, O(number of roles)
    pub fn online_counts(&self) -> (usize, RoleCounts) {
        let count = |room: Room| self.rooms.get(&room).map(|m| m.len()).unwrap_or(0);
        let by_role = RoleCounts {
            customer: count(Room::Customer),
            cashier: count(Room::Cashier),
            kitchen: count(Room::Kitchen),
            shipper: count(Room::Shipper),
            pass: count(Room::Pass),
            admin: count(Room::Admin),
        };
        (self.connections.len(), by_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_counts() {
        let registry = PresenceRegistry::new();
        registry.join("c1", Room::Cashier, None);
        registry.join("c2", Room::Kitchen, None);
        registry.join("c3", Room::Kitchen, None);

        let (total, by_role) = registry.online_counts();
        assert_eq!(total, 3);
        assert_eq!(by_role.cashier, 1);
        assert_eq!(by_role.kitchen, 2);
        assert_eq!(by_role.shipper, 0);

        let mut kitchen = registry.members_of(Room::Kitchen);
        kitchen.sort();
        assert_eq!(kitchen, vec!["c2", "c3"]);
    }

    #[test]
    fn test_leave_is_idempotent() {
        let registry = PresenceRegistry::new();
        registry.join("c1", Room::Customer, Some("u1".into()));

        registry.leave("c1");
        registry.leave("c1");

        let (total, _) = registry.online_counts();
        assert_eq!(total, 0);
        assert_eq!(registry.connection_for("u1"), None);
    }

    #[test]
    fn test_account_remapping_last_writer_wins() {
        let registry = PresenceRegistry::new();
        registry.join("old", Room::Customer, Some("u1".into()));
        registry.join("new", Room::Customer, Some("u1".into()));

        assert_eq!(registry.connection_for("u1").as_deref(), Some("new"));

        // The superseded connection leaving must not clear the new mapping
        registry.leave("old");
        assert_eq!(registry.connection_for("u1").as_deref(), Some("new"));

        registry.leave("new");
        assert_eq!(registry.connection_for("u1"), None);
    }

    #[test]
    fn test_unknown_account_is_unreachable() {
        let registry = PresenceRegistry::new();
        assert_eq!(registry.connection_for("ghost"), None);
    }
}
