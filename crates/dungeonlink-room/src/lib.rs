//! Room management for Dungeonlink.
//!
//! This crate owns the lobby lifecycle on the client side:
//!
//! - [`RoomManager`] — creates, joins, and leaves rooms, and holds the
//!   one room the local player is currently in.
//! - [`RoomError`] — what can go wrong at this level.
//!
//! The server is authoritative for room membership. The manager's job
//! is to validate requests before they go out, keep a single current
//! [`Room`](dungeonlink_protocol::Room) replaced wholesale from server
//! responses, and publish every change.

mod error;
mod manager;

pub use error::RoomError;
pub use manager::RoomManager;
