//! Core data types shared by the request/response and push channels.
//!
//! Every struct here mirrors a JSON shape the server produces or consumes.
//! The server speaks camelCase, so most structs carry
//! `#[serde(rename_all = "camelCase")]` — the Rust side stays snake_case
//! while the wire stays camelCase.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// This is a "newtype wrapper" — a plain `u64` wrapped in a named struct.
/// Why bother?
///
/// 1. **Type safety**: You can't accidentally pass a `RoomId` where a
///    `PlayerId` is expected.
/// 2. **Readability**: `fn kick(player: PlayerId)` is clearer than
///    `fn kick(player: u64)`.
///
/// `#[serde(transparent)]` tells serde to serialize this as just the inner
/// `u64`, not as `{ "0": 42 }`. So a PlayerId(42) becomes just `42` in JSON,
/// which is exactly what the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// Display lets us use `{}` in format strings and logging.
/// `tracing::info!("player {} joined", player_id)` prints "player P-42 joined".
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one lobby / one match).
///
/// Same newtype pattern as `PlayerId`, but the server assigns rooms opaque
/// string ids, so the inner type is `String` and the type is `Clone` but
/// not `Copy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Convenience constructor so call sites can write `RoomId::new("abc")`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id, for building endpoint paths.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Response body from the login/register/me endpoints.
///
/// `token` is the opaque bearer credential used for every subsequent
/// authenticated call. The session layer owns it from here on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub id: PlayerId,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Game status
// ---------------------------------------------------------------------------

/// The lifecycle status of a room's game, as reported by the server.
///
/// Wire format is SCREAMING_SNAKE: `"WAITING"`, `"IN_PROGRESS"`,
/// `"FINISHED"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Lobby open, waiting for players. The default for a fresh room.
    #[default]
    Waiting,

    /// Game running. Snapshots and push events are meaningful.
    InProgress,

    /// Game over. The final state remains readable.
    Finished,
}

impl GameStatus {
    /// Returns `true` if a game snapshot is worth fetching.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Player and board tiles
// ---------------------------------------------------------------------------

/// One player's public record inside a [`GameState`] or [`Room`].
///
/// Identity is the `id` field — a player's position in the `players` vector
/// may shift between snapshots, so never compare by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    #[serde(default)]
    pub is_bot: bool,
    /// Chosen class name, absent until character selection.
    #[serde(default)]
    pub player_class: Option<String>,
    /// Chosen race name, absent until character selection.
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub gold: i32,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub current_hp: i32,
    #[serde(default)]
    pub max_hp: i32,
    #[serde(default = "default_true")]
    pub is_alive: bool,
}

fn default_true() -> bool {
    true
}

/// A board tile summary carried in game snapshots.
///
/// The server calls the tile kind `type`, which is a Rust keyword, so the
/// field is renamed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileInfo {
    pub position: u32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// GameState — the authoritative snapshot
// ---------------------------------------------------------------------------

/// The full game state as the server sees it.
///
/// This is the payload of the snapshot endpoint and of `GAME_STATE` push
/// frames. The reconciliation layer owns the single in-memory copy; nothing
/// else mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub room_id: RoomId,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub tiles: Vec<TileInfo>,
    /// Index into `players` of whoever acts next. The server computes this
    /// modulo the player count; the reconciliation layer re-clamps on ingest
    /// so a stale index can never go out of bounds.
    #[serde(default)]
    pub current_player_index: usize,
    #[serde(default)]
    pub current_round: u32,
    #[serde(default)]
    pub max_rounds: u32,
    /// Human-readable description of the most recent game event.
    #[serde(default)]
    pub last_event: Option<String>,
    #[serde(default)]
    pub waiting_for_roll: bool,
    /// Set once when the game ends, never cleared within the same game.
    #[serde(default)]
    pub winner_id: Option<PlayerId>,
}

// ---------------------------------------------------------------------------
// Room — lobby-level metadata
// ---------------------------------------------------------------------------

/// Lobby-level metadata for one room.
///
/// Replaced wholesale on every successful room-returning call — no field
/// is ever patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: RoomId,
    pub name: String,
    pub host_id: PlayerId,
    pub max_players: usize,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub current_round: u32,
    #[serde(default)]
    pub max_rounds: u32,
    #[serde(default)]
    pub current_player_index: usize,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of the create-room call.
///
/// The server enforces the same bounds (name 3–30 chars, 2–4 players);
/// the room layer checks them client-side first so an obviously bad
/// request never leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub name: String,
    pub max_players: usize,
    pub is_private: bool,
    pub bot_count: u32,
}

impl RoomSettings {
    /// Minimum allowed room name length.
    pub const NAME_MIN: usize = 3;
    /// Maximum allowed room name length.
    pub const NAME_MAX: usize = 30;
    /// Minimum allowed player cap.
    pub const PLAYERS_MIN: usize = 2;
    /// Maximum allowed player cap.
    pub const PLAYERS_MAX: usize = 4;

    /// A public room with the given name and server-default limits.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            max_players: 4,
            is_private: false,
            bot_count: 0,
        }
    }
}

/// Body of the character-selection call. Ids come from the class/race
/// catalogs below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSelection {
    pub class_id: u32,
    pub race_id: u32,
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// One playable class from the class catalog endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub base_hp: i32,
    #[serde(default)]
    pub base_attack: i32,
    #[serde(default)]
    pub base_defense: i32,
}

/// One playable race from the race catalog endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceInfo {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub movement_bonus: i32,
    #[serde(default)]
    pub attack_bonus: i32,
    #[serde(default)]
    pub gold_bonus: i32,
    #[serde(default)]
    pub roll_bonus: i32,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Tests for the data types and their JSON serialization.
    //!
    //! The server defines exact JSON shapes. These tests verify that our
    //! serde attributes produce the correct format, because a mismatch
    //! means the client core can't parse server responses.

    use super::*;

    // =====================================================================
    // Identity types: PlayerId, RoomId
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        // `#[serde(transparent)]` means PlayerId(42) → `42`, not `{"0":42}`.
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_deserializes_from_plain_number() {
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::new("abc-123")).unwrap();
        assert_eq!(json, "\"abc-123\"");
    }

    #[test]
    fn test_room_id_display_is_raw_id() {
        assert_eq!(RoomId::new("r9").to_string(), "r9");
    }

    // =====================================================================
    // GameStatus
    // =====================================================================

    #[test]
    fn test_game_status_serializes_as_screaming_snake() {
        let json = serde_json::to_string(&GameStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");

        let json = serde_json::to_string(&GameStatus::Waiting).unwrap();
        assert_eq!(json, "\"WAITING\"");
    }

    #[test]
    fn test_game_status_default_is_waiting() {
        assert_eq!(GameStatus::default(), GameStatus::Waiting);
    }

    #[test]
    fn test_game_status_is_in_progress() {
        assert!(GameStatus::InProgress.is_in_progress());
        assert!(!GameStatus::Waiting.is_in_progress());
        assert!(!GameStatus::Finished.is_in_progress());
    }

    // =====================================================================
    // Player — camelCase wire format
    // =====================================================================

    #[test]
    fn test_player_json_uses_camel_case_fields() {
        let player = Player {
            id: PlayerId(1),
            username: "ada".into(),
            is_bot: false,
            player_class: Some("Mage".into()),
            race: Some("Elf".into()),
            position: 4,
            gold: 12,
            score: 3,
            current_hp: 70,
            max_hp: 80,
            is_alive: true,
        };
        let json: serde_json::Value = serde_json::to_value(&player).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["isBot"], false);
        assert_eq!(json["playerClass"], "Mage");
        assert_eq!(json["currentHp"], 70);
        assert_eq!(json["maxHp"], 80);
        assert_eq!(json["isAlive"], true);
    }

    #[test]
    fn test_player_deserializes_with_missing_optionals() {
        // A lobby-stage player record carries only identity fields.
        let json = r#"{"id": 5, "username": "bot-1", "isBot": true}"#;
        let player: Player = serde_json::from_str(json).unwrap();

        assert_eq!(player.id, PlayerId(5));
        assert!(player.is_bot);
        assert!(player.player_class.is_none());
        assert_eq!(player.position, 0);
        assert!(player.is_alive);
    }

    // =====================================================================
    // TileInfo
    // =====================================================================

    #[test]
    fn test_tile_info_kind_renames_to_type() {
        let tile = TileInfo {
            position: 3,
            kind: "TRAP".into(),
            description: "spikes".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&tile).unwrap();

        assert_eq!(json["type"], "TRAP");
        assert!(json.get("kind").is_none());
    }

    // =====================================================================
    // GameState
    // =====================================================================

    fn sample_player(id: u64, name: &str) -> Player {
        Player {
            id: PlayerId(id),
            username: name.into(),
            is_bot: false,
            player_class: None,
            race: None,
            position: 0,
            gold: 0,
            score: 0,
            current_hp: 100,
            max_hp: 100,
            is_alive: true,
        }
    }

    #[test]
    fn test_game_state_round_trip() {
        let state = GameState {
            room_id: RoomId::new("r1"),
            status: GameStatus::InProgress,
            players: vec![sample_player(1, "ada"), sample_player(2, "bob")],
            tiles: vec![],
            current_player_index: 1,
            current_round: 2,
            max_rounds: 10,
            last_event: Some("ada rolled a 4".into()),
            waiting_for_roll: true,
            winner_id: None,
        };
        let bytes = serde_json::to_vec(&state).unwrap();
        let decoded: GameState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(state, decoded);
    }

    #[test]
    fn test_game_state_json_uses_camel_case_fields() {
        let state = GameState {
            room_id: RoomId::new("r1"),
            status: GameStatus::Finished,
            players: vec![],
            tiles: vec![],
            current_player_index: 0,
            current_round: 10,
            max_rounds: 10,
            last_event: None,
            waiting_for_roll: false,
            winner_id: Some(PlayerId(2)),
        };
        let json: serde_json::Value = serde_json::to_value(&state).unwrap();

        assert_eq!(json["roomId"], "r1");
        assert_eq!(json["status"], "FINISHED");
        assert_eq!(json["currentPlayerIndex"], 0);
        assert_eq!(json["waitingForRoll"], false);
        assert_eq!(json["winnerId"], 2);
    }

    #[test]
    fn test_game_state_deserializes_with_sparse_fields() {
        // The server omits fields that are zero/absent at lobby stage.
        let json = r#"{"roomId": "r1", "status": "WAITING"}"#;
        let state: GameState = serde_json::from_str(json).unwrap();

        assert_eq!(state.room_id, RoomId::new("r1"));
        assert!(state.players.is_empty());
        assert!(state.winner_id.is_none());
        assert!(!state.waiting_for_roll);
    }

    // =====================================================================
    // Room
    // =====================================================================

    #[test]
    fn test_room_round_trip() {
        let room = Room {
            room_id: RoomId::new("abc"),
            name: "dungeon night".into(),
            host_id: PlayerId(1),
            max_players: 4,
            is_private: false,
            status: GameStatus::Waiting,
            players: vec![sample_player(1, "ada")],
            current_round: 0,
            max_rounds: 10,
            current_player_index: 0,
        };
        let bytes = serde_json::to_vec(&room).unwrap();
        let decoded: Room = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(room, decoded);
    }

    #[test]
    fn test_room_json_uses_camel_case_fields() {
        let room = Room {
            room_id: RoomId::new("abc"),
            name: "dungeon night".into(),
            host_id: PlayerId(1),
            max_players: 4,
            is_private: true,
            status: GameStatus::Waiting,
            players: vec![],
            current_round: 0,
            max_rounds: 10,
            current_player_index: 0,
        };
        let json: serde_json::Value = serde_json::to_value(&room).unwrap();

        assert_eq!(json["roomId"], "abc");
        assert_eq!(json["hostId"], 1);
        assert_eq!(json["maxPlayers"], 4);
        assert_eq!(json["isPrivate"], true);
    }

    // =====================================================================
    // Request DTOs
    // =====================================================================

    #[test]
    fn test_room_settings_default_matches_server_defaults() {
        let settings = RoomSettings::default();
        assert_eq!(settings.max_players, 4);
        assert!(!settings.is_private);
        assert_eq!(settings.bot_count, 0);
    }

    #[test]
    fn test_room_settings_named_sets_only_the_name() {
        let settings = RoomSettings::named("goblin pit");
        assert_eq!(settings.name, "goblin pit");
        assert_eq!(settings.max_players, 4);
    }

    #[test]
    fn test_character_selection_json_format() {
        let sel = CharacterSelection {
            class_id: 2,
            race_id: 5,
        };
        let json: serde_json::Value = serde_json::to_value(sel).unwrap();

        assert_eq!(json["classId"], 2);
        assert_eq!(json["raceId"], 5);
    }

    // =====================================================================
    // Auth
    // =====================================================================

    #[test]
    fn test_auth_response_deserializes() {
        let json = r#"{"token": "tok-xyz", "id": 9, "username": "ada"}"#;
        let auth: AuthResponse = serde_json::from_str(json).unwrap();

        assert_eq!(auth.token, "tok-xyz");
        assert_eq!(auth.id, PlayerId(9));
        assert_eq!(auth.username, "ada");
    }

    // =====================================================================
    // Catalogs
    // =====================================================================

    #[test]
    fn test_class_info_deserializes_camel_case() {
        let json = r#"{
            "id": 1, "name": "Warrior", "description": "front line",
            "baseHp": 100, "baseAttack": 15, "baseDefense": 10
        }"#;
        let class: ClassInfo = serde_json::from_str(json).unwrap();

        assert_eq!(class.id, 1);
        assert_eq!(class.base_hp, 100);
        assert_eq!(class.base_defense, 10);
    }

    #[test]
    fn test_race_info_deserializes_camel_case() {
        let json = r#"{
            "id": 3, "name": "Dwarf", "description": "stout",
            "movementBonus": 0, "attackBonus": 0,
            "goldBonus": 2, "rollBonus": 0
        }"#;
        let race: RaceInfo = serde_json::from_str(json).unwrap();

        assert_eq!(race.id, 3);
        assert_eq!(race.gold_bonus, 2);
    }
}
