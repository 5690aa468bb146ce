//! Unified error type for the Dungeonlink client core.

use dungeonlink_channel::ChannelError;
use dungeonlink_protocol::ProtocolError;
use dungeonlink_room::RoomError;
use dungeonlink_session::SessionError;
use dungeonlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `dungeonlink` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DungeonlinkError {
    /// A transport-level error (request, connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth failed, not authenticated).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (rejected, invalid settings, not joined).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A channel-level error (not attached, attach failed).
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl DungeonlinkError {
    /// `true` when the server answered 401 anywhere down the chain.
    /// The client reacts by clearing the session.
    pub fn is_unauthorized(&self) -> bool {
        let transport = match self {
            Self::Transport(t) => t,
            Self::Session(SessionError::Transport(t)) => t,
            Self::Room(RoomError::Transport(t)) => t,
            Self::Channel(ChannelError::Transport(t)) => t,
            _ => return false,
        };
        transport.is_unauthorized()
    }
}
