/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    ///
    /// `message` is extracted from the response body's `message` (or
    /// `error`) field when present, so callers can show the server's own
    /// wording.
    #[error("request failed with status {code}: {message}")]
    Status { code: u16, message: String },

    /// The request never produced a response (DNS, connect, timeout).
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response completed but its body was not valid JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// Opening a push link failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The link was closed.
    #[error("link closed")]
    Closed,
}

impl TransportError {
    /// Returns `true` for an unauthenticated/expired-credential response.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { code: 401, .. })
    }
}
