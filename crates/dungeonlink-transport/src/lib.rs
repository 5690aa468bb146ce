//! Transport abstraction layer for Dungeonlink.
//!
//! The core talks to the server over two channels, each behind a narrow
//! trait so tests can swap in in-memory fakes:
//!
//! - [`ApiTransport`] — authenticated request/response calls (HTTP/JSON).
//!   Implemented by [`HttpApi`] via `reqwest`.
//! - [`PushTransport`] / [`PushLink`] — the persistent push channel.
//!   Implemented by [`WebSocketPush`] via `tokio-tungstenite`.
//!
//! All policy (retry, reconnect, credential lifecycle) lives in the layers
//! above; implementations here only move bytes and report failures.
//!
//! # Feature Flags
//!
//! - `http` (default) — HTTP transport via `reqwest`
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpApi;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketLink, WebSocketPush};

use std::fmt;
use std::future::Future;

// ---------------------------------------------------------------------------
// Request/response side
// ---------------------------------------------------------------------------

/// HTTP-style method for a request/response call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// The wire spelling of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issues authenticated request/response calls against the game server.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → a single transport instance is shared by the
///   session, room, and game layers and may be used from spawned tasks.
/// - The `call` future is `+ Send` for the same reason: background tasks
///   (snapshot refetch after a reconnect) await it off the caller's task.
///
/// # Credential handling
///
/// The transport holds the current credential internally and attaches it to
/// every call. Only the session layer writes it, through
/// [`set_credential`](ApiTransport::set_credential); everything else is a
/// passive consumer.
pub trait ApiTransport: Send + Sync + 'static {
    /// Performs one call and returns the parsed JSON body.
    ///
    /// # Errors
    /// - [`TransportError::Status`] for a non-success response, carrying the
    ///   status code and the server's message.
    /// - [`TransportError::Request`] when the request never completed.
    fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> impl Future<Output = Result<serde_json::Value, TransportError>> + Send;

    /// Installs or clears the credential attached to subsequent calls.
    fn set_credential(&self, credential: Option<String>);
}

// ---------------------------------------------------------------------------
// Push side
// ---------------------------------------------------------------------------

/// Opens persistent push links to the game server.
///
/// Separated from [`PushLink`] so the channel layer can reconnect by asking
/// the same transport for a fresh link.
pub trait PushTransport: Send + Sync + 'static {
    /// The link type produced by this transport.
    type Link: PushLink;

    /// Opens a new link to the given endpoint URL.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Link, TransportError>> + Send;
}

/// A single established push link that can send and receive frames.
pub trait PushLink: Send + Sync + 'static {
    /// Sends a frame to the server.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next frame from the server.
    ///
    /// Returns `Ok(None)` when the link is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the link.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
