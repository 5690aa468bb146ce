//! The synchronization orchestrator: one entry point per room lifecycle.
//!
//! The room manager, channel adapter, and reconciliation engine each own
//! one concern and know nothing about each other. This layer sequences
//! them:
//!
//! - [`enter_room`](SyncOrchestrator::enter_room) — join (or refresh),
//!   prime the engine with a snapshot if a game is running, attach the
//!   push channel, handshake, and start the event pump.
//! - [`exit_room`](SyncOrchestrator::exit_room) — the reverse, in an
//!   order that never strands a subscription or a stale game state.
//!
//! The pump is the only place push events meet the engine. On
//! `Reconnected` it re-handshakes and refetches the authoritative
//! snapshot, because pushes sent while the link was down are gone for
//! good — the snapshot that lands last wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use dungeonlink_channel::{ChannelAdapter, ChannelEvent};
use dungeonlink_protocol::{ClientMessage, Room, RoomId};
use dungeonlink_room::{RoomError, RoomManager};
use dungeonlink_transport::{ApiTransport, PushTransport};

use crate::ReconciliationEngine;

/// Sequences room membership, the push channel, and the local game
/// state across a room's lifecycle.
pub struct SyncOrchestrator<T: ApiTransport, P: PushTransport> {
    rooms: Arc<RoomManager<T>>,
    channel: Arc<ChannelAdapter<P>>,
    engine: Arc<ReconciliationEngine>,
    events_url: String,
    /// Bumped on every enter/exit. A pump holding a stale epoch must
    /// not touch the engine.
    epoch: Arc<AtomicU64>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<T: ApiTransport, P: PushTransport> SyncOrchestrator<T, P> {
    /// Creates an orchestrator over already-constructed layers.
    ///
    /// `events_url` is the push endpoint every attach targets.
    pub fn new(
        rooms: Arc<RoomManager<T>>,
        channel: Arc<ChannelAdapter<P>>,
        engine: Arc<ReconciliationEngine>,
        events_url: impl Into<String>,
    ) -> Self {
        Self {
            rooms,
            channel,
            engine,
            events_url: events_url.into(),
            epoch: Arc::new(AtomicU64::new(0)),
            pump: Mutex::new(None),
        }
    }

    /// Enters a room and brings live sync up around it.
    ///
    /// Joining the room is the only step that can fail this call. If a
    /// game is already running, the engine is primed with a snapshot
    /// before any push event can arrive. The push channel itself is
    /// best-effort: when the attach fails the room membership stands,
    /// the caller keeps polling state through the room manager, and a
    /// later [`enter_room`](Self::enter_room) tries again.
    ///
    /// Entering the room you are already in is a resync, not an error:
    /// the room is refreshed instead of re-joined and the channel is
    /// re-attached from scratch.
    pub async fn enter_room(
        &self,
        room_id: &RoomId,
    ) -> Result<Room, RoomError> {
        let token = self.invalidate();
        self.stop_pump();

        let already_in = self
            .rooms
            .current_room_id()
            .is_ok_and(|current| current == *room_id);
        let room = if already_in {
            self.rooms.refresh().await?
        } else {
            self.rooms.join(room_id).await?
        };

        if room.status.is_in_progress() {
            match self.rooms.game_state().await {
                Ok(state) => self.engine.apply_snapshot(state),
                // The first GAME_STATE push covers for a failed fetch.
                Err(e) => tracing::warn!(
                    %room_id,
                    error = %e,
                    "initial snapshot fetch failed"
                ),
            }
        }

        if let Err(e) = self.channel.attach(&self.events_url).await {
            tracing::warn!(
                %room_id,
                error = %e,
                "push channel unavailable, room entered without live sync"
            );
            return Ok(room);
        }

        // Subscribe before the handshake so no push can slip past.
        let rx = self.channel.subscribe();
        if let Err(e) = self
            .channel
            .emit(&ClientMessage::JoinRoom {
                room_id: room.room_id.clone(),
            })
            .await
        {
            tracing::warn!(%room_id, error = %e, "room handshake failed");
        }

        let handle = tokio::spawn(pump(
            rx,
            self.rooms.clone(),
            self.channel.clone(),
            self.engine.clone(),
            self.epoch.clone(),
            token,
        ));
        if let Some(prev) = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle)
        {
            prev.abort();
        }

        tracing::info!(%room_id, "room sync established");
        Ok(room)
    }

    /// Leaves the current room and tears live sync down.
    ///
    /// Teardown order: stop the pump, tell the server we are leaving
    /// (best-effort, over the channel while it is still up), detach the
    /// channel, leave the room, and finally drop the game state. Safe
    /// to call with no room entered.
    pub async fn exit_room(&self) {
        self.invalidate();
        self.stop_pump();

        if let Ok(room_id) = self.rooms.current_room_id() {
            if let Err(e) = self
                .channel
                .emit(&ClientMessage::LeaveRoom {
                    room_id: room_id.clone(),
                })
                .await
            {
                tracing::debug!(
                    %room_id,
                    error = %e,
                    "leave notice not sent over channel"
                );
            }
        }
        self.channel.detach().await;

        match self.rooms.leave().await {
            Ok(()) | Err(RoomError::NotJoined) => {}
            Err(e) => tracing::warn!(error = %e, "room leave failed"),
        }
        self.engine.reset();
    }

    fn stop_pump(&self) {
        if let Some(pump) = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pump.abort();
        }
    }

    fn invalidate(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// The event pump: feeds channel events into the engine until the
/// subscription closes, the retries run out, or the epoch moves on.
async fn pump<T: ApiTransport, P: PushTransport>(
    mut rx: mpsc::UnboundedReceiver<ChannelEvent>,
    rooms: Arc<RoomManager<T>>,
    channel: Arc<ChannelAdapter<P>>,
    engine: Arc<ReconciliationEngine>,
    epoch: Arc<AtomicU64>,
    token: u64,
) {
    while let Some(event) = rx.recv().await {
        if epoch.load(Ordering::SeqCst) != token {
            return;
        }
        match event {
            ChannelEvent::Push(event) => engine.apply_event(&event),
            ChannelEvent::Reconnected => {
                resync(&rooms, &channel, &engine, &epoch, token).await;
            }
            ChannelEvent::RetriesExhausted => {
                tracing::warn!(
                    "live sync lost, keeping last known game state"
                );
                return;
            }
        }
    }
}

/// Re-handshakes and refetches the snapshot after a reconnect.
///
/// The server does not replay pushes missed while the link was down,
/// so the refetched snapshot replaces whatever the engine holds.
async fn resync<T: ApiTransport, P: PushTransport>(
    rooms: &Arc<RoomManager<T>>,
    channel: &Arc<ChannelAdapter<P>>,
    engine: &Arc<ReconciliationEngine>,
    epoch: &Arc<AtomicU64>,
    token: u64,
) {
    let Ok(room_id) = rooms.current_room_id() else {
        return;
    };
    if let Err(e) = channel
        .emit(&ClientMessage::JoinRoom {
            room_id: room_id.clone(),
        })
        .await
    {
        tracing::warn!(
            %room_id,
            error = %e,
            "re-handshake failed after reconnect"
        );
    }

    let in_game = engine.current().is_some()
        || rooms.current().is_some_and(|r| r.status.is_in_progress());
    if !in_game {
        return;
    }
    match rooms.game_state().await {
        Ok(state) => {
            if epoch.load(Ordering::SeqCst) == token {
                engine.apply_snapshot(state);
                tracing::info!(%room_id, "game state resynced after reconnect");
            }
        }
        Err(e) => tracing::warn!(
            %room_id,
            error = %e,
            "snapshot refetch failed after reconnect"
        ),
    }
}
