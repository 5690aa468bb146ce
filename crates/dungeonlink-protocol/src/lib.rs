//! Wire protocol for Dungeonlink.
//!
//! This crate defines the "language" spoken between the client core and the
//! game server:
//!
//! - **Types** ([`GameState`], [`Player`], [`Room`], etc.) — the JSON
//!   structures returned by the request/response endpoints.
//! - **Events** ([`ServerEvent`], [`ClientMessage`]) — the tagged unions that
//!   travel over the push channel.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits below everything else. It doesn't know about
//! sessions, rooms, or connections — it only knows how to describe and
//! (de)serialize messages.
//!
//! ```text
//! Transport (bytes/JSON) → Protocol (typed messages) → Managers (state)
//! ```

mod codec;
mod error;
mod event;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{ClientMessage, ServerEvent};
pub use types::{
    AuthResponse, CharacterSelection, ClassInfo, GameState, GameStatus,
    Player, PlayerId, RaceInfo, Room, RoomId, RoomSettings, TileInfo,
};
