//! The room manager: owns the lobby the local player is in.
//!
//! Every operation here is a thin request/response call plus a state
//! update. The server is authoritative for all room membership; the
//! manager never edits a [`Room`] field by field — each successful
//! room-returning call replaces the whole record.
//!
//! # Observability
//!
//! The current room is published over a `tokio::sync::watch` channel,
//! mirroring how the session layer publishes the session. `None` means
//! the local player is in no room.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;

use dungeonlink_protocol::{GameState, Room, RoomId, RoomSettings};
use dungeonlink_transport::{ApiTransport, Method, TransportError};

use crate::RoomError;

/// Owns the [`Room`] the local player is in, if any.
///
/// ## Lifecycle
///
/// ```text
/// create()/join() ──→ [Room current] ──→ leave() ──→ [absent]
///                          │
///                          └─ session cleared → clear_local() → [absent]
/// ```
///
/// Teardown is local-first: `leave` clears the local room before the
/// server call completes, and keeps it cleared even if that call fails.
/// The player's intent to leave never depends on network success.
pub struct RoomManager<T> {
    api: Arc<T>,
    room: watch::Sender<Option<Room>>,
}

impl<T: ApiTransport> RoomManager<T> {
    /// Creates a manager with no current room.
    pub fn new(api: Arc<T>) -> Self {
        let (room, _) = watch::channel(None);
        Self { api, room }
    }

    /// Creates a room on the server and makes it the current room.
    /// The creator is implicitly its host and first member.
    ///
    /// # Errors
    /// - [`RoomError::InvalidSettings`] — bounds check failed locally;
    ///   no request was sent.
    /// - [`RoomError::Rejected`] — the server declined.
    pub async fn create(
        &self,
        settings: RoomSettings,
    ) -> Result<Room, RoomError> {
        validate(&settings)?;
        let body = serde_json::to_value(&settings)
            .map_err(TransportError::InvalidBody)?;
        let room: Room = self
            .request(Method::Post, "/room/create", Some(body))
            .await?;
        tracing::info!(room_id = %room.room_id, "room created");
        self.publish(room.clone());
        Ok(room)
    }

    /// Joins an existing room and makes it the current room.
    ///
    /// # Errors
    /// [`RoomError::Rejected`] when the server declines (room full,
    /// game already started, unknown id).
    pub async fn join(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        let endpoint = format!("/room/{}/join", room_id.as_str());
        let room: Room = self.request(Method::Post, &endpoint, None).await?;
        tracing::info!(room_id = %room.room_id, "joined room");
        self.publish(room.clone());
        Ok(room)
    }

    /// Leaves the current room: local clear first, then best-effort
    /// server notification.
    ///
    /// # Errors
    /// [`RoomError::NotJoined`] when there is no current room. The
    /// server call failing is NOT an error — the local room is already
    /// gone by then.
    pub async fn leave(&self) -> Result<(), RoomError> {
        let room_id = self.current_room_id()?;
        self.clear_local();

        let endpoint = format!("/room/{}/leave", room_id.as_str());
        if let Err(e) = self.api.call(Method::Post, &endpoint, None).await {
            tracing::warn!(
                %room_id,
                error = %e,
                "server leave failed, local room already cleared"
            );
        }
        Ok(())
    }

    /// Re-fetches the current room from the server and replaces the
    /// local copy wholesale.
    pub async fn refresh(&self) -> Result<Room, RoomError> {
        let room_id = self.current_room_id()?;
        let room = self.fetch(&room_id).await?;
        self.publish(room.clone());
        Ok(room)
    }

    /// Fetches any room by id without touching the current room.
    pub async fn fetch(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        let endpoint = format!("/room/{}", room_id.as_str());
        self.request(Method::Get, &endpoint, None).await
    }

    /// Lists the rooms currently open on the server.
    pub async fn list(&self) -> Result<Vec<Room>, RoomError> {
        self.request(Method::Get, "/room/list", None).await
    }

    /// Asks the server to add a bot to the current room.
    ///
    /// The server answers with the updated room, which replaces the
    /// local copy.
    pub async fn add_bot(&self) -> Result<Room, RoomError> {
        let room_id = self.current_room_id()?;
        let endpoint = format!("/room/{}/add-bot", room_id.as_str());
        let room: Room = self.request(Method::Post, &endpoint, None).await?;
        self.publish(room.clone());
        Ok(room)
    }

    /// Starts the game in the current room (host only) and returns the
    /// opening snapshot.
    ///
    /// # Errors
    /// [`RoomError::Rejected`] when the caller isn't the host or the
    /// room isn't ready.
    pub async fn start_game(&self) -> Result<GameState, RoomError> {
        let room_id = self.current_room_id()?;
        let endpoint = format!("/room/{}/start", room_id.as_str());
        let state: GameState =
            self.request(Method::Post, &endpoint, None).await?;
        tracing::info!(%room_id, "game started");
        Ok(state)
    }

    /// Fetches the authoritative game snapshot for the current room.
    pub async fn game_state(&self) -> Result<GameState, RoomError> {
        let room_id = self.current_room_id()?;
        let endpoint = format!("/room/{}/state", room_id.as_str());
        self.request(Method::Get, &endpoint, None).await
    }

    /// The current room, if any.
    pub fn current(&self) -> Option<Room> {
        self.room.borrow().clone()
    }

    /// The current room's id, or [`RoomError::NotJoined`].
    pub fn current_room_id(&self) -> Result<RoomId, RoomError> {
        self.room
            .borrow()
            .as_ref()
            .map(|r| r.room_id.clone())
            .ok_or(RoomError::NotJoined)
    }

    /// Drops the local room without telling the server. Called when the
    /// session goes away — the server forgets us on its own.
    pub fn clear_local(&self) {
        if self.room.send_replace(None).is_some() {
            tracing::info!("room cleared");
        }
    }

    /// Subscribes to room changes. The receiver sees `None` whenever
    /// the room becomes absent.
    pub fn subscribe(&self) -> watch::Receiver<Option<Room>> {
        self.room.subscribe()
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<R, RoomError> {
        let value = self
            .api
            .call(method, endpoint, body)
            .await
            .map_err(RoomError::from_room_call)?;
        Ok(serde_json::from_value(value)
            .map_err(TransportError::InvalidBody)?)
    }

    fn publish(&self, room: Room) {
        self.room.send_replace(Some(room));
    }
}

/// Client-side bounds check, mirroring the server's own validation.
fn validate(settings: &RoomSettings) -> Result<(), RoomError> {
    let name_len = settings.name.chars().count();
    if !(RoomSettings::NAME_MIN..=RoomSettings::NAME_MAX)
        .contains(&name_len)
    {
        return Err(RoomError::InvalidSettings(format!(
            "room name must be {}-{} characters, got {}",
            RoomSettings::NAME_MIN,
            RoomSettings::NAME_MAX,
            name_len
        )));
    }
    if !(RoomSettings::PLAYERS_MIN..=RoomSettings::PLAYERS_MAX)
        .contains(&settings.max_players)
    {
        return Err(RoomError::InvalidSettings(format!(
            "max players must be {}-{}, got {}",
            RoomSettings::PLAYERS_MIN,
            RoomSettings::PLAYERS_MAX,
            settings.max_players
        )));
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `RoomManager`, following the naming convention
    //!   `test_{function}_{scenario}_{expected}`
    //!
    //! `MockApi` routes endpoints to canned responses and records every
    //! call, so tests can assert both the local state transitions and
    //! the exact traffic the manager produced.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;

    // -- Helpers ----------------------------------------------------------

    #[derive(Default)]
    struct MockApi {
        routes: Mutex<HashMap<String, Result<Value, (u16, String)>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockApi {
        fn respond(&self, endpoint: &str, value: Value) {
            self.routes
                .lock()
                .unwrap()
                .insert(endpoint.into(), Ok(value));
        }

        fn fail(&self, endpoint: &str, code: u16, message: &str) {
            self.routes
                .lock()
                .unwrap()
                .insert(endpoint.into(), Err((code, message.into())));
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ApiTransport for MockApi {
        async fn call(
            &self,
            _method: Method,
            endpoint: &str,
            _body: Option<Value>,
        ) -> Result<Value, TransportError> {
            self.calls.lock().unwrap().push(endpoint.to_string());
            match self.routes.lock().unwrap().get(endpoint) {
                Some(Ok(value)) => Ok(value.clone()),
                Some(Err((code, message))) => Err(TransportError::Status {
                    code: *code,
                    message: message.clone(),
                }),
                None => Err(TransportError::Status {
                    code: 404,
                    message: format!("no route for {endpoint}"),
                }),
            }
        }

        fn set_credential(&self, _credential: Option<String>) {}
    }

    fn manager() -> (Arc<MockApi>, RoomManager<MockApi>) {
        let api = Arc::new(MockApi::default());
        let mgr = RoomManager::new(api.clone());
        (api, mgr)
    }

    fn room_json(id: &str, name: &str) -> Value {
        json!({
            "roomId": id,
            "name": name,
            "hostId": 1,
            "maxPlayers": 4,
            "status": "WAITING",
            "players": [{"id": 1, "username": "ada"}],
        })
    }

    fn state_json(id: &str) -> Value {
        json!({
            "roomId": id,
            "status": "IN_PROGRESS",
            "players": [{"id": 1, "username": "ada"}],
            "currentPlayerIndex": 0,
            "currentRound": 1,
            "maxRounds": 10,
            "waitingForRoll": true,
        })
    }

    async fn joined(api: &MockApi, mgr: &RoomManager<MockApi>) -> Room {
        api.respond("/room/r1/join", room_json("r1", "goblin pit"));
        mgr.join(&RoomId::new("r1")).await.unwrap()
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[tokio::test]
    async fn test_create_success_publishes_room() {
        let (api, mgr) = manager();
        api.respond("/room/create", room_json("r1", "goblin pit"));

        let room = mgr
            .create(RoomSettings::named("goblin pit"))
            .await
            .expect("should succeed");

        assert_eq!(room.room_id, RoomId::new("r1"));
        assert_eq!(mgr.current(), Some(room));
    }

    #[tokio::test]
    async fn test_create_short_name_fails_without_network() {
        let (api, mgr) = manager();

        let result = mgr.create(RoomSettings::named("ab")).await;

        assert!(matches!(result, Err(RoomError::InvalidSettings(_))));
        assert!(api.calls().is_empty(), "bad settings never leave the process");
    }

    #[tokio::test]
    async fn test_create_long_name_fails_locally() {
        let (_, mgr) = manager();
        let name = "x".repeat(31);

        let result = mgr.create(RoomSettings::named(name)).await;

        assert!(matches!(result, Err(RoomError::InvalidSettings(_))));
    }

    #[tokio::test]
    async fn test_create_bad_player_cap_fails_locally() {
        let (_, mgr) = manager();
        let mut settings = RoomSettings::named("goblin pit");
        settings.max_players = 5;

        let result = mgr.create(settings).await;

        assert!(matches!(result, Err(RoomError::InvalidSettings(m))
            if m.contains("max players")));
    }

    #[tokio::test]
    async fn test_create_server_rejection_surfaces_rejected() {
        let (api, mgr) = manager();
        api.fail("/room/create", 400, "too many rooms");

        let result = mgr.create(RoomSettings::named("goblin pit")).await;

        assert!(matches!(result, Err(RoomError::Rejected(m))
            if m == "too many rooms"));
        assert!(mgr.current().is_none());
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[tokio::test]
    async fn test_join_success_publishes_room() {
        let (api, mgr) = manager();

        let room = joined(&api, &mgr).await;

        assert_eq!(room.name, "goblin pit");
        assert_eq!(mgr.current(), Some(room));
        assert_eq!(api.calls(), vec!["/room/r1/join"]);
    }

    #[tokio::test]
    async fn test_join_full_room_surfaces_rejected() {
        let (api, mgr) = manager();
        api.fail("/room/r1/join", 409, "room is full");

        let result = mgr.join(&RoomId::new("r1")).await;

        assert!(matches!(result, Err(RoomError::Rejected(m))
            if m == "room is full"));
        assert!(mgr.current().is_none());
    }

    #[tokio::test]
    async fn test_join_replaces_previous_room() {
        let (api, mgr) = manager();
        joined(&api, &mgr).await;
        api.respond("/room/r2/join", room_json("r2", "troll bridge"));

        mgr.join(&RoomId::new("r2")).await.unwrap();

        assert_eq!(
            mgr.current().map(|r| r.room_id),
            Some(RoomId::new("r2"))
        );
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[tokio::test]
    async fn test_leave_without_room_is_not_joined() {
        let (api, mgr) = manager();

        let result = mgr.leave().await;

        assert!(matches!(result, Err(RoomError::NotJoined)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_leave_clears_locally_even_when_server_fails() {
        let (api, mgr) = manager();
        joined(&api, &mgr).await;
        api.fail("/room/r1/leave", 500, "boom");

        mgr.leave().await.expect("leave is local-first");

        assert!(mgr.current().is_none());
    }

    #[tokio::test]
    async fn test_leave_notifies_server() {
        let (api, mgr) = manager();
        joined(&api, &mgr).await;
        api.respond("/room/r1/leave", Value::Null);

        mgr.leave().await.unwrap();

        assert!(api.calls().contains(&"/room/r1/leave".to_string()));
        assert!(mgr.current().is_none());
    }

    // =====================================================================
    // refresh() / fetch() / list()
    // =====================================================================

    #[tokio::test]
    async fn test_refresh_replaces_room_wholesale() {
        let (api, mgr) = manager();
        joined(&api, &mgr).await;
        let mut updated = room_json("r1", "goblin pit");
        updated["players"] = json!([
            {"id": 1, "username": "ada"},
            {"id": 2, "username": "bob"},
        ]);
        api.respond("/room/r1", updated);

        let room = mgr.refresh().await.unwrap();

        assert_eq!(room.players.len(), 2);
        assert_eq!(mgr.current(), Some(room));
    }

    #[tokio::test]
    async fn test_refresh_without_room_is_not_joined() {
        let (_, mgr) = manager();

        let result = mgr.refresh().await;

        assert!(matches!(result, Err(RoomError::NotJoined)));
    }

    #[tokio::test]
    async fn test_fetch_does_not_touch_current_room() {
        let (api, mgr) = manager();
        api.respond("/room/r9", room_json("r9", "spectating"));

        let room = mgr.fetch(&RoomId::new("r9")).await.unwrap();

        assert_eq!(room.room_id, RoomId::new("r9"));
        assert!(mgr.current().is_none(), "fetch is read-only");
    }

    #[tokio::test]
    async fn test_list_returns_open_rooms() {
        let (api, mgr) = manager();
        api.respond(
            "/room/list",
            json!([room_json("r1", "goblin pit"), room_json("r2", "troll")]),
        );

        let rooms = mgr.list().await.unwrap();

        assert_eq!(rooms.len(), 2);
        assert!(mgr.current().is_none(), "listing never joins");
    }

    #[tokio::test]
    async fn test_list_empty_server_returns_empty_vec() {
        let (api, mgr) = manager();
        api.respond("/room/list", json!([]));

        let rooms = mgr.list().await.unwrap();

        assert!(rooms.is_empty());
    }

    // =====================================================================
    // add_bot()
    // =====================================================================

    #[tokio::test]
    async fn test_add_bot_publishes_updated_room() {
        let (api, mgr) = manager();
        joined(&api, &mgr).await;
        let mut with_bot = room_json("r1", "goblin pit");
        with_bot["players"] = json!([
            {"id": 1, "username": "ada"},
            {"id": 100, "username": "bot-1", "isBot": true},
        ]);
        api.respond("/room/r1/add-bot", with_bot);

        let room = mgr.add_bot().await.unwrap();

        assert_eq!(room.players.len(), 2);
        assert!(room.players[1].is_bot);
        assert_eq!(mgr.current(), Some(room));
    }

    #[tokio::test]
    async fn test_add_bot_without_room_is_not_joined() {
        let (_, mgr) = manager();

        let result = mgr.add_bot().await;

        assert!(matches!(result, Err(RoomError::NotJoined)));
    }

    // =====================================================================
    // start_game() / game_state()
    // =====================================================================

    #[tokio::test]
    async fn test_start_game_returns_opening_snapshot() {
        let (api, mgr) = manager();
        joined(&api, &mgr).await;
        api.respond("/room/r1/start", state_json("r1"));

        let state = mgr.start_game().await.unwrap();

        assert!(state.status.is_in_progress());
        assert_eq!(state.room_id, RoomId::new("r1"));
    }

    #[tokio::test]
    async fn test_start_game_non_host_surfaces_rejected() {
        let (api, mgr) = manager();
        joined(&api, &mgr).await;
        api.fail("/room/r1/start", 403, "only the host can start");

        let result = mgr.start_game().await;

        assert!(matches!(result, Err(RoomError::Rejected(m))
            if m.contains("host")));
    }

    #[tokio::test]
    async fn test_game_state_fetches_snapshot() {
        let (api, mgr) = manager();
        joined(&api, &mgr).await;
        api.respond("/room/r1/state", state_json("r1"));

        let state = mgr.game_state().await.unwrap();

        assert!(state.waiting_for_roll);
        assert!(api.calls().contains(&"/room/r1/state".to_string()));
    }

    #[tokio::test]
    async fn test_game_state_without_room_is_not_joined() {
        let (_, mgr) = manager();

        let result = mgr.game_state().await;

        assert!(matches!(result, Err(RoomError::NotJoined)));
    }

    // =====================================================================
    // Observability
    // =====================================================================

    #[tokio::test]
    async fn test_subscribe_observes_join_and_leave() {
        let (api, mgr) = manager();
        api.respond("/room/r1/leave", Value::Null);
        let mut rx = mgr.subscribe();
        assert!(rx.borrow().is_none());

        joined(&api, &mgr).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());

        mgr.leave().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_clear_local_is_safe_without_room() {
        let (api, mgr) = manager();

        mgr.clear_local();

        assert!(mgr.current().is_none());
        assert!(api.calls().is_empty(), "clear_local never calls the server");
    }
}
