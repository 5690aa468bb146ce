//! The reconciliation engine: the single in-memory copy of the game.
//!
//! Two inputs feed it, and they compose safely because both are
//! whole-value operations:
//!
//! - **Snapshots** (from the snapshot endpoint or `GAME_STATE` pushes)
//!   replace the state wholesale. A snapshot is authoritative; applying
//!   the same one twice is a no-op in effect.
//! - **Events** merge at most one field. Only `GAME_OVER` mutates game
//!   data (`winner_id`); informational events leave a human-readable
//!   note in `last_event` and touch nothing else.
//!
//! There is no rollback and no patching of individual fields from
//! events — when push and snapshot disagree, the snapshot that lands
//! last wins.

use tokio::sync::watch;

use dungeonlink_protocol::{GameState, Player, PlayerId, ServerEvent};

/// Owns the local [`GameState`] and publishes every change.
pub struct ReconciliationEngine {
    state: watch::Sender<Option<GameState>>,
}

impl ReconciliationEngine {
    /// Creates an engine with no game state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    /// Replaces the local state with an authoritative snapshot.
    ///
    /// `current_player_index` is re-clamped modulo the player count on
    /// ingest, so a stale index from the server can never send an
    /// observer out of bounds.
    pub fn apply_snapshot(&self, mut snapshot: GameState) {
        if snapshot.players.is_empty() {
            snapshot.current_player_index = 0;
        } else {
            snapshot.current_player_index %= snapshot.players.len();
        }
        tracing::debug!(
            room_id = %snapshot.room_id,
            round = snapshot.current_round,
            players = snapshot.players.len(),
            "snapshot applied"
        );
        self.state.send_replace(Some(snapshot));
    }

    /// Applies one push event.
    ///
    /// Events other than `GAME_STATE` never arrive before the first
    /// snapshot in a well-behaved stream; if one does, it is dropped —
    /// there is nothing to annotate or merge into.
    pub fn apply_event(&self, event: &ServerEvent) {
        match event {
            ServerEvent::GameState { game_state } => {
                self.apply_snapshot(game_state.clone());
            }
            ServerEvent::GameOver { winner_id } => {
                let merged = self.state.send_if_modified(|state| {
                    match state.as_mut() {
                        Some(state) => {
                            state.winner_id = Some(*winner_id);
                            true
                        }
                        None => false,
                    }
                });
                if merged {
                    tracing::info!(%winner_id, "game over");
                }
            }
            ServerEvent::Error { message } => {
                tracing::warn!(error = %message, "server reported an error");
            }
            informational => {
                let Some(note) = informational.describe() else {
                    return;
                };
                self.state.send_if_modified(|state| match state.as_mut() {
                    Some(state) => {
                        state.last_event = Some(note.clone());
                        true
                    }
                    None => false,
                });
            }
        }
    }

    /// Drops the local state. Called on room exit and logout.
    pub fn reset(&self) {
        if self.state.send_replace(None).is_some() {
            tracing::debug!("game state cleared");
        }
    }

    /// The current state, if a game is loaded.
    pub fn current(&self) -> Option<GameState> {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn watch(&self) -> watch::Receiver<Option<GameState>> {
        self.state.subscribe()
    }

    /// `true` iff it is `local`'s turn. Recomputed from the live state
    /// on every call, never cached.
    pub fn is_local_turn(&self, local: PlayerId) -> bool {
        self.state
            .borrow()
            .as_ref()
            .and_then(|s| s.players.get(s.current_player_index))
            .is_some_and(|p| p.id == local)
    }

    /// The local player's record in the current state, if present.
    pub fn local_player(&self, local: PlayerId) -> Option<Player> {
        self.state
            .borrow()
            .as_ref()
            .and_then(|s| s.players.iter().find(|p| p.id == local))
            .cloned()
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
