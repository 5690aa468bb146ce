//! The push-channel vocabulary: what the server pushes and what the client
//! emits.
//!
//! Both directions use internally tagged JSON with a `type` field, e.g.
//! `{ "type": "DICE_ROLLED", "playerId": 1, "roll": 4 }`. Modeling the
//! vocabulary as Rust enums means dispatching on an event is an exhaustive
//! `match` — adding a new event kind is a compile-time-checked change, not
//! a string-keyed lookup that silently misses.

use serde::{Deserialize, Serialize};

use crate::types::{GameState, PlayerId, RoomId};

// ---------------------------------------------------------------------------
// ServerEvent — pushed by the server
// ---------------------------------------------------------------------------

/// A server-initiated push event.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
///   `{ "type": "GAME_OVER", "winnerId": 2 }`
/// rather than the externally tagged default. Variant names are renamed to
/// SCREAMING_SNAKE and payload fields to camelCase to match the wire.
///
/// Only two variants carry authoritative state: [`ServerEvent::GameState`]
/// (a full snapshot) and [`ServerEvent::GameOver`] (the winner id). The
/// rest are informational — the server follows them with a full snapshot
/// when anything material changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// A full authoritative snapshot. Replaces local game state wholesale.
    GameState { game_state: GameState },

    /// Someone joined the room.
    PlayerJoined {
        player_id: PlayerId,
        username: String,
    },

    /// Someone left the room.
    PlayerLeft { player_id: PlayerId },

    /// The host started the game.
    GameStarted,

    /// A die was rolled.
    DiceRolled { player_id: PlayerId, roll: u32 },

    /// A player moved to a new tile.
    PlayerMoved { player_id: PlayerId, position: u32 },

    /// A combat round resolved.
    CombatResult { player_id: PlayerId, victory: bool },

    /// A player found treasure.
    TreasureFound { player_id: PlayerId, amount: u32 },

    /// A player stepped on a trap.
    TrapTriggered { player_id: PlayerId, damage: u32 },

    /// An event card was drawn.
    EventCard { description: String },

    /// The game ended. Carries only the winner; the final snapshot arrives
    /// separately as a `GAME_STATE` frame.
    GameOver { winner_id: PlayerId },

    /// A server-side failure the client should surface but not apply.
    Error { message: String },
}

impl ServerEvent {
    /// Returns `true` for events that carry no authoritative state of their
    /// own — everything except full snapshots, game-over, and errors.
    pub fn is_informational(&self) -> bool {
        !matches!(
            self,
            Self::GameState { .. } | Self::GameOver { .. } | Self::Error { .. }
        )
    }

    /// A short human-readable description, used as the transient
    /// "last event" note on the local game state.
    pub fn describe(&self) -> Option<String> {
        match self {
            Self::PlayerJoined { username, .. } => {
                Some(format!("{username} joined the room"))
            }
            Self::PlayerLeft { player_id } => {
                Some(format!("{player_id} left the room"))
            }
            Self::GameStarted => Some("the game has started".into()),
            Self::DiceRolled { player_id, roll } => {
                Some(format!("{player_id} rolled a {roll}"))
            }
            Self::PlayerMoved {
                player_id,
                position,
            } => Some(format!("{player_id} moved to tile {position}")),
            Self::CombatResult { player_id, victory } => Some(if *victory {
                format!("{player_id} won the fight")
            } else {
                format!("{player_id} lost the fight")
            }),
            Self::TreasureFound { player_id, amount } => {
                Some(format!("{player_id} found {amount} gold"))
            }
            Self::TrapTriggered { player_id, damage } => {
                Some(format!("{player_id} took {damage} trap damage"))
            }
            Self::EventCard { description } => Some(description.clone()),
            Self::GameState { .. } | Self::GameOver { .. } | Self::Error { .. } => {
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ClientMessage — emitted by the client
// ---------------------------------------------------------------------------

/// A client-initiated message on the push channel.
///
/// The push channel is almost entirely server → client; the client only
/// speaks to manage its room subscription. Game commands go over the
/// request/response channel, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Subscribe to a room's event stream. Sent right after the channel
    /// connects, and again after every reconnect.
    JoinRoom { room_id: RoomId },

    /// Unsubscribe from a room's event stream.
    LeaveRoom { room_id: RoomId },
}

// =========================================================================
// Tests
// =========================================================================
