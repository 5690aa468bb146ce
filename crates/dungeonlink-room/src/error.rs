//! Error types for the room layer.

use dungeonlink_transport::TransportError;

/// Errors that can occur in the room layer.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The server declined the operation (room full, already started,
    /// not the host). Carries the server's own message verbatim.
    #[error("room operation rejected: {0}")]
    Rejected(String),

    /// The settings failed client-side validation; the request never
    /// left the process.
    #[error("invalid room settings: {0}")]
    InvalidSettings(String),

    /// An operation that needs a current room was called without one.
    #[error("not in a room")]
    NotJoined,

    /// The request/response transport failed below the room level.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RoomError {
    /// Folds room-level rejections into [`RoomError::Rejected`].
    ///
    /// 401 passes through untouched so the session layer can observe it
    /// and tear the session down.
    pub(crate) fn from_room_call(err: TransportError) -> Self {
        match err {
            TransportError::Status { code, message }
                if (400..=499).contains(&code) && code != 401 =>
            {
                Self::Rejected(message)
            }
            other => Self::Transport(other),
        }
    }
}
