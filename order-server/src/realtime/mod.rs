//! Realtime layer - presence, fan-out routing, per-connection delivery

pub mod hub;
pub mod presence;
pub mod router;
pub mod ws;

pub use hub::ConnectionHub;
pub use presence::{ConnectionInfo, PresenceRegistry};
pub use router::{FanoutRouter, Target, routes_for};
