//! HTTP request/response transport using `reqwest`.

use std::sync::{Mutex, PoisonError};

use crate::{ApiTransport, Method, TransportError};

/// An HTTP-based [`ApiTransport`] speaking JSON with bearer-token auth.
pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
    credential: Mutex<Option<String>>,
}

impl HttpApi {
    /// Creates a transport rooted at the given base URL.
    ///
    /// A trailing slash on `base_url` is trimmed so endpoint paths can
    /// always start with `/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
            credential: Mutex::new(None),
        }
    }

    /// The base URL calls are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn current_credential(&self) -> Option<String> {
        // A poisoned lock still holds a usable credential.
        self.credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ApiTransport for HttpApi {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, TransportError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request = match method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        };

        if let Some(token) = self.current_credential() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        tracing::debug!(%method, endpoint, "issuing API call");

        let response =
            request.send().await.map_err(TransportError::Request)?;

        let status = response.status();
        let text = response.text().await.map_err(TransportError::Request)?;

        if !status.is_success() {
            let message = extract_message(&text);
            tracing::debug!(
                %method,
                endpoint,
                code = status.as_u16(),
                message,
                "API call rejected"
            );
            return Err(TransportError::Status {
                code: status.as_u16(),
                message,
            });
        }

        if text.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(TransportError::InvalidBody)
    }

    fn set_credential(&self, credential: Option<String>) {
        *self
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = credential;
    }
}

/// Pulls the server's human-readable message out of an error body.
///
/// The server wraps failures as `{"message": "..."}` (occasionally
/// `{"error": "..."}`). Falls back to the raw body, then to a placeholder
/// for empty responses.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|m| m.as_str()) {
                return msg.to_string();
            }
        }
    }
    if body.is_empty() {
        "request failed".to_string()
    } else {
        body.to_string()
    }
}
