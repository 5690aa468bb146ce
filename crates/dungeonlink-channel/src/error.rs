//! Error types for the channel layer.

use dungeonlink_protocol::ProtocolError;
use dungeonlink_transport::TransportError;

/// Errors that can occur in the channel layer.
///
/// Only calls into the adapter (`attach`, `emit`) surface these; a lost
/// link never propagates as an error — it becomes a
/// [`ConnectionStatus`](crate::ConnectionStatus) transition and a
/// [`ChannelEvent`](crate::ChannelEvent).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// An operation that needs an attached channel was called without one.
    #[error("push channel not attached")]
    NotAttached,

    /// The initial attach could not open a link.
    #[error("failed to attach push channel")]
    AttachFailed(#[source] TransportError),

    /// The reconnect loop gave up; the channel is down until the next
    /// explicit attach.
    #[error("reconnect attempts exhausted")]
    RetriesExhausted,

    /// The push link failed below the channel level.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outgoing message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
