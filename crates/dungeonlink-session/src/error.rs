//! Error types for the session layer.

use dungeonlink_transport::TransportError;

/// Errors that can occur in the session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server rejected the credentials (bad password, expired token).
    ///
    /// Carries the server's own message so the caller can show it
    /// verbatim. Surfacing this error never leaves a half-installed
    /// session behind: either the new session is fully in place, or the
    /// previous state is untouched.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// An operation that needs a live session was called without one.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The request/response transport failed below the auth level.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Folds auth-level rejections into [`SessionError::AuthFailed`] and
    /// passes everything else through as a transport failure.
    pub(crate) fn from_auth_call(err: TransportError) -> Self {
        match err {
            TransportError::Status { code, message }
                if (400..=403).contains(&code) =>
            {
                Self::AuthFailed(message)
            }
            other => Self::Transport(other),
        }
    }
}
