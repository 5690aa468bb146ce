//! The client facade: one object that owns every layer.
//!
//! [`DungeonClient`] composes the session manager, room manager, channel
//! adapter, reconciliation engine, and sync orchestrator, and exposes
//! the operations a presentation layer actually calls. The sub-crate
//! types stay reachable for anything not covered here.
//!
//! Cross-layer policy lives in this file and nowhere else:
//!
//! - a `401` from any authenticated call clears the session, the room,
//!   and the game state in one sweep (the credential is dead, so
//!   everything downstream of it is too);
//! - logout leaves the room before dropping the session, so the server
//!   sees an orderly exit whenever the network allows one.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use tokio::sync::watch;

use dungeonlink_channel::{ChannelAdapter, ChannelConfig, ConnectionStatus};
use dungeonlink_protocol::{
    CharacterSelection, ClassInfo, GameState, Player, RaceInfo, Room, RoomId,
    RoomSettings,
};
use dungeonlink_room::RoomManager;
use dungeonlink_session::{CredentialStore, Session, SessionManager};
use dungeonlink_transport::{
    ApiTransport, Method, PushTransport, TransportError,
};

use crate::{DungeonlinkError, ReconciliationEngine, SyncOrchestrator};

/// The assembled Dungeonlink client core.
///
/// Generic over both transports so the whole stack runs against
/// in-memory fakes in tests; production code plugs in
/// [`HttpApi`](dungeonlink_transport::HttpApi) and
/// [`WebSocketPush`](dungeonlink_transport::WebSocketPush).
pub struct DungeonClient<T: ApiTransport, P: PushTransport> {
    api: Arc<T>,
    session: SessionManager<T>,
    rooms: Arc<RoomManager<T>>,
    channel: Arc<ChannelAdapter<P>>,
    engine: Arc<ReconciliationEngine>,
    orchestrator: SyncOrchestrator<T, P>,
}

impl<T: ApiTransport, P: PushTransport> DungeonClient<T, P> {
    /// Assembles a client over the given transports.
    ///
    /// `events_url` is the push endpoint used whenever a room is
    /// entered. The credential store decides whether sessions survive
    /// a restart.
    pub fn new(
        api: Arc<T>,
        push: Arc<P>,
        store: Box<dyn CredentialStore>,
        events_url: impl Into<String>,
        channel_config: ChannelConfig,
    ) -> Self {
        let session = SessionManager::new(api.clone(), store);
        let rooms = Arc::new(RoomManager::new(api.clone()));
        let channel = Arc::new(ChannelAdapter::new(push, channel_config));
        let engine = Arc::new(ReconciliationEngine::new());
        let orchestrator = SyncOrchestrator::new(
            rooms.clone(),
            channel.clone(),
            engine.clone(),
            events_url,
        );
        Self {
            api,
            session,
            rooms,
            channel,
            engine,
            orchestrator,
        }
    }

    // -- Session ----------------------------------------------------------

    /// Logs in and installs the session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, DungeonlinkError> {
        Ok(self.session.login(username, password).await?)
    }

    /// Registers an account and installs the session.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, DungeonlinkError> {
        Ok(self.session.register(username, password).await?)
    }

    /// Restores a session from the credential store, if one is there
    /// and the server still honors it.
    pub async fn restore(
        &self,
    ) -> Result<Option<Session>, DungeonlinkError> {
        Ok(self.session.restore().await?)
    }

    /// Logs out: room first, then the session. Every local trace of the
    /// identity is gone afterwards, whatever the server said.
    pub async fn logout(&self) {
        self.orchestrator.exit_room().await;
        self.session.logout().await;
    }

    /// `true` iff a session is live.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    /// Subscribes to session changes.
    pub fn watch_session(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    // -- Rooms ------------------------------------------------------------

    /// Creates a room and brings live sync up around it.
    pub async fn create_room(
        &self,
        settings: RoomSettings,
    ) -> Result<Room, DungeonlinkError> {
        let room = self
            .rooms
            .create(settings)
            .await
            .map_err(|e| self.flag_unauthorized(e.into()))?;
        self.orchestrator
            .enter_room(&room.room_id)
            .await
            .map_err(|e| self.flag_unauthorized(e.into()))
    }

    /// Joins a room and brings live sync up around it.
    pub async fn join_room(
        &self,
        room_id: &RoomId,
    ) -> Result<Room, DungeonlinkError> {
        self.orchestrator
            .enter_room(room_id)
            .await
            .map_err(|e| self.flag_unauthorized(e.into()))
    }

    /// Leaves the current room and tears live sync down. Safe to call
    /// with no room entered.
    pub async fn leave_room(&self) {
        self.orchestrator.exit_room().await;
    }

    /// Lists the rooms currently open on the server.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, DungeonlinkError> {
        self.rooms
            .list()
            .await
            .map_err(|e| self.flag_unauthorized(e.into()))
    }

    /// Adds a bot to the current room.
    pub async fn add_bot(&self) -> Result<Room, DungeonlinkError> {
        self.rooms
            .add_bot()
            .await
            .map_err(|e| self.flag_unauthorized(e.into()))
    }

    /// The current room, if any.
    pub fn current_room(&self) -> Option<Room> {
        self.rooms.current()
    }

    /// Subscribes to room changes.
    pub fn watch_room(&self) -> watch::Receiver<Option<Room>> {
        self.rooms.subscribe()
    }

    // -- Game -------------------------------------------------------------

    /// Starts the game in the current room (host only) and primes the
    /// engine with the opening snapshot.
    pub async fn start_game(&self) -> Result<GameState, DungeonlinkError> {
        let state = self
            .rooms
            .start_game()
            .await
            .map_err(|e| self.flag_unauthorized(e.into()))?;
        self.engine.apply_snapshot(state.clone());
        Ok(state)
    }

    /// Rolls the dice for the local player's turn. The resulting state
    /// arrives over the push channel.
    pub async fn roll_dice(&self) -> Result<(), DungeonlinkError> {
        let room_id = self.rooms.current_room_id()?;
        let endpoint = format!("/game/{}/roll", room_id.as_str());
        self.game_call::<serde_json::Value>(Method::Post, &endpoint, None)
            .await?;
        Ok(())
    }

    /// Spends the local player's reroll, when their race grants one.
    pub async fn reroll(&self) -> Result<(), DungeonlinkError> {
        let room_id = self.rooms.current_room_id()?;
        let endpoint = format!("/game/{}/reroll", room_id.as_str());
        self.game_call::<serde_json::Value>(Method::Post, &endpoint, None)
            .await?;
        Ok(())
    }

    /// Picks the local player's class and race, then refreshes the
    /// snapshot so the choice shows up without waiting for a push.
    pub async fn select_character(
        &self,
        selection: CharacterSelection,
    ) -> Result<(), DungeonlinkError> {
        let room_id = self.rooms.current_room_id()?;
        let endpoint = format!("/game/{}/character", room_id.as_str());
        let body = serde_json::to_value(selection)
            .map_err(TransportError::InvalidBody)?;
        self.game_call::<serde_json::Value>(
            Method::Post,
            &endpoint,
            Some(body),
        )
        .await?;
        self.refresh_snapshot().await;
        Ok(())
    }

    /// Triggers the local player's class ability, then refreshes the
    /// snapshot.
    pub async fn use_ability(&self) -> Result<(), DungeonlinkError> {
        let room_id = self.rooms.current_room_id()?;
        let endpoint = format!("/game/{}/ability", room_id.as_str());
        self.game_call::<serde_json::Value>(Method::Post, &endpoint, None)
            .await?;
        self.refresh_snapshot().await;
        Ok(())
    }

    /// The class catalog for character selection.
    pub async fn classes(&self) -> Result<Vec<ClassInfo>, DungeonlinkError> {
        self.game_call(Method::Get, "/game/classes", None).await
    }

    /// The race catalog for character selection.
    pub async fn races(&self) -> Result<Vec<RaceInfo>, DungeonlinkError> {
        self.game_call(Method::Get, "/game/races", None).await
    }

    /// The current game state, if a game is loaded.
    pub fn game_state(&self) -> Option<GameState> {
        self.engine.current()
    }

    /// Subscribes to game state changes.
    pub fn watch_game(&self) -> watch::Receiver<Option<GameState>> {
        self.engine.watch()
    }

    /// `true` iff the local player acts next.
    pub fn is_my_turn(&self) -> bool {
        self.session
            .current()
            .is_some_and(|s| self.engine.is_local_turn(s.user_id))
    }

    /// The local player's record in the current game, if present.
    pub fn local_player(&self) -> Option<Player> {
        let session = self.session.current()?;
        self.engine.local_player(session.user_id)
    }

    // -- Connectivity -----------------------------------------------------

    /// The push channel's connection status.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.channel.status()
    }

    /// Subscribes to connection status changes.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.channel.watch_status()
    }

    // -- Internals --------------------------------------------------------

    async fn game_call<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<R, DungeonlinkError> {
        let value = self
            .api
            .call(method, endpoint, body)
            .await
            .map_err(|e| self.flag_unauthorized(e.into()))?;
        Ok(serde_json::from_value(value)
            .map_err(TransportError::InvalidBody)?)
    }

    /// Best-effort snapshot refresh; the push stream covers a failure.
    async fn refresh_snapshot(&self) {
        match self.rooms.game_state().await {
            Ok(state) => self.engine.apply_snapshot(state),
            Err(e) => {
                tracing::debug!(error = %e, "snapshot refresh failed");
            }
        }
    }

    /// When the server answered 401, the credential is dead: clear the
    /// session and everything downstream of it before surfacing the
    /// error.
    fn flag_unauthorized(&self, err: DungeonlinkError) -> DungeonlinkError {
        if err.is_unauthorized() {
            tracing::warn!(
                "server rejected the credential, clearing local session"
            );
            self.session.clear();
            self.rooms.clear_local();
            self.engine.reset();
        }
        err
    }
}
