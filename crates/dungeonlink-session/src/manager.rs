//! The session manager: owns the authenticated identity.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Acquiring a session on login/register
//! - Propagating the credential to the request/response transport
//! - Persisting the credential through the [`CredentialStore`]
//! - Restoring a session from a persisted credential on startup
//! - Clearing everything on logout, unconditionally
//!
//! # Observability
//!
//! Every session change is published over a `tokio::sync::watch` channel.
//! The room and reconciliation layers subscribe and reset their own state
//! whenever the session becomes absent — nobody polls.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::watch;

use dungeonlink_protocol::{AuthResponse, PlayerId};
use dungeonlink_transport::{ApiTransport, Method, TransportError};

use crate::{CredentialStore, SessionError};

/// The local record of an authenticated identity.
///
/// At most one `Session` is live at a time; its presence is the sole
/// definition of "authenticated".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token attached to every request/response call.
    pub credential: String,
    pub user_id: PlayerId,
    pub username: String,
}

/// Response shape of the identity endpoint. The server returns the full
/// user record; only identity fields matter here.
#[derive(Debug, Deserialize)]
struct Me {
    id: PlayerId,
    username: String,
}

/// Owns the [`Session`] and its credential lifecycle.
///
/// ## Lifecycle
///
/// ```text
/// login()/register() ──→ [Session live] ──→ logout() ──→ [absent]
///         ▲                    │
///         │                    └─ fatal auth failure → clear() → [absent]
///         └── restore() (from persisted credential)
/// ```
///
/// Teardown is local-first: `logout` clears the local session, the
/// propagated credential, and the persisted credential even when the
/// server-side call fails. Local invalidation never depends on network
/// success.
pub struct SessionManager<T> {
    api: Arc<T>,
    store: Box<dyn CredentialStore>,
    session: watch::Sender<Option<Session>>,
}

impl<T: ApiTransport> SessionManager<T> {
    /// Creates a manager with no live session.
    pub fn new(api: Arc<T>, store: Box<dyn CredentialStore>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            api,
            store,
            session,
        }
    }

    /// Authenticates against the server and installs the new session.
    ///
    /// On failure any prior session is left untouched.
    ///
    /// # Errors
    /// - [`SessionError::AuthFailed`] — the server rejected the credentials.
    /// - [`SessionError::Transport`] — the call never completed.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        self.authenticate("/auth/login", username, password).await
    }

    /// Creates an account and installs the new session.
    ///
    /// Same contract as [`login`](Self::login); the server answers with
    /// the same token-bearing response.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        self.authenticate("/auth/register", username, password).await
    }

    async fn authenticate(
        &self,
        endpoint: &str,
        username: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });
        let value = self
            .api
            .call(Method::Post, endpoint, Some(body))
            .await
            .map_err(SessionError::from_auth_call)?;
        let auth: AuthResponse = serde_json::from_value(value)
            .map_err(TransportError::InvalidBody)?;
        Ok(self.install(auth))
    }

    /// Atomically installs a session: credential to the transport, to the
    /// store, then the record to observers.
    fn install(&self, auth: AuthResponse) -> Session {
        let session = Session {
            credential: auth.token,
            user_id: auth.id,
            username: auth.username,
        };
        self.api.set_credential(Some(session.credential.clone()));
        self.store.save(&session.credential);
        self.session.send_replace(Some(session.clone()));
        tracing::info!(user_id = %session.user_id, "session established");
        session
    }

    /// Logs out: best-effort server notification, unconditional local clear.
    pub async fn logout(&self) {
        if let Err(e) = self.api.call(Method::Post, "/auth/logout", None).await
        {
            tracing::warn!(
                error = %e,
                "server logout failed, clearing local session anyway"
            );
        }
        self.clear();
    }

    /// Clears the local session, the propagated credential, and the
    /// persisted credential. Safe to call with no session live.
    pub fn clear(&self) {
        self.api.set_credential(None);
        self.store.clear();
        if self.session.send_replace(None).is_some() {
            tracing::info!("session cleared");
        }
    }

    /// Rebuilds a session from a persisted credential.
    ///
    /// Returns `Ok(None)` when no credential is stored, or when the stored
    /// credential turned out to be stale (it is cleared in that case —
    /// a dead token is an unauthenticated start, not an error).
    ///
    /// # Errors
    /// [`SessionError::Transport`] when the identity call failed for
    /// non-auth reasons; the stored credential is kept for a later retry.
    pub async fn restore(&self) -> Result<Option<Session>, SessionError> {
        let Some(credential) = self.store.load() else {
            return Ok(None);
        };
        self.api.set_credential(Some(credential.clone()));

        match self.api.call(Method::Get, "/auth/me", None).await {
            Ok(value) => {
                let me: Me = serde_json::from_value(value)
                    .map_err(TransportError::InvalidBody)?;
                let session = Session {
                    credential,
                    user_id: me.id,
                    username: me.username,
                };
                self.session.send_replace(Some(session.clone()));
                tracing::info!(
                    user_id = %session.user_id,
                    "session restored from stored credential"
                );
                Ok(Some(session))
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!("stored credential rejected, clearing it");
                self.clear();
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The current session, if one is live.
    pub fn current(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// `true` iff a session is live. This is the navigation-gating
    /// predicate exposed to the presentation layer.
    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Subscribes to session changes. The receiver sees `None` whenever
    /// the session is cleared.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

// =========================================================================
// Tests
// =========================================================================
