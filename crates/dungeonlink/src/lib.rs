//! # Dungeonlink
//!
//! Client core for a multiplayer turn-based dungeon board game.
//!
//! Dungeonlink keeps a client authenticated, inside a room, and in live
//! sync with the server's game state. The presentation layer talks to
//! one object, [`DungeonClient`], and observes state through
//! `tokio::sync::watch` channels instead of polling.
//!
//! The layers underneath are published as their own crates and
//! re-exported here:
//!
//! - `dungeonlink-transport` — request/response and push transports.
//! - `dungeonlink-protocol` — wire types and the frame codec.
//! - `dungeonlink-session` — the authenticated identity.
//! - `dungeonlink-room` — lobby membership.
//! - `dungeonlink-channel` — the realtime channel and its reconnects.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dungeonlink::prelude::*;
//!
//! # async fn run() -> Result<(), DungeonlinkError> {
//! let api = Arc::new(HttpApi::new("https://game.example/api"));
//! let push = Arc::new(WebSocketPush);
//! let client = DungeonClient::new(
//!     api,
//!     push,
//!     Box::new(MemoryCredentialStore::default()),
//!     "wss://game.example/events",
//!     ChannelConfig::default(),
//! );
//!
//! client.login("ada", "hunter2").await?;
//! let room = client.create_room(RoomSettings::named("goblin pit")).await?;
//! println!("waiting in {}", room.name);
//! # Ok(())
//! # }
//! ```

mod client;
mod engine;
mod error;
mod orchestrator;

pub use client::DungeonClient;
pub use engine::ReconciliationEngine;
pub use error::DungeonlinkError;
pub use orchestrator::SyncOrchestrator;

pub use dungeonlink_channel::{
    ChannelAdapter, ChannelConfig, ChannelError, ChannelEvent,
    ConnectionStatus,
};
pub use dungeonlink_protocol::{
    AuthResponse, CharacterSelection, ClassInfo, ClientMessage, Codec,
    GameState, GameStatus, JsonCodec, Player, PlayerId, ProtocolError,
    RaceInfo, Room, RoomId, RoomSettings, ServerEvent, TileInfo,
};
pub use dungeonlink_room::{RoomError, RoomManager};
pub use dungeonlink_session::{
    CredentialStore, MemoryCredentialStore, Session, SessionError,
    SessionManager,
};
pub use dungeonlink_transport::{
    ApiTransport, Method, PushLink, PushTransport, TransportError,
};
#[cfg(feature = "http")]
pub use dungeonlink_transport::HttpApi;
#[cfg(feature = "websocket")]
pub use dungeonlink_transport::WebSocketPush;

/// Everything a typical caller needs, in one `use`.
pub mod prelude {
    pub use crate::{
        ChannelConfig, ConnectionStatus, DungeonClient, DungeonlinkError,
        GameState, GameStatus, MemoryCredentialStore, Player, PlayerId,
        Room, RoomId, RoomSettings, ServerEvent, Session,
    };
    #[cfg(feature = "http")]
    pub use crate::HttpApi;
    #[cfg(feature = "websocket")]
    pub use crate::WebSocketPush;
}
