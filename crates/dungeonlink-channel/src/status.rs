//! Connection status of the push channel.

use std::fmt;

/// Lifecycle status of the push channel, owned by the
/// [`ChannelAdapter`](crate::ChannelAdapter).
///
/// ```text
/// Disconnected → Connecting → Connected
///                                 │
///                     link lost   ▼
///               ┌──────────── Degraded ──── retries exhausted ──┐
///               │ reconnect ok    │                             ▼
///               └──→ Connected ◄──┘                       Disconnected
/// ```
///
/// `Degraded` means the last known game state is still readable but no
/// fresh push data is arriving; the adapter is actively retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No link, and nobody is trying to open one.
    #[default]
    Disconnected,

    /// The initial attach is in flight.
    Connecting,

    /// The link is live and delivering events.
    Connected,

    /// The link was lost; the reconnect loop is running.
    Degraded,
}

impl ConnectionStatus {
    /// `true` iff push data is flowing.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// `true` iff the adapter is between a lost link and a verdict.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Degraded => "degraded",
        };
        write!(f, "{s}")
    }
}
