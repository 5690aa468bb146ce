//! Session management for Dungeonlink.
//!
//! This crate owns the authenticated identity:
//!
//! - [`Session`] — the local record of who is logged in.
//! - [`SessionManager`] — acquires a session on login/register, clears it
//!   on logout or fatal auth failure, and publishes every change.
//! - [`CredentialStore`] — where the credential survives process restarts.
//!
//! The session is the sole definition of "authenticated": there is at most
//! one live [`Session`], and its presence gates everything else. All other
//! state (room, game) resets whenever the session becomes absent.

mod error;
mod manager;
mod store;

pub use error::SessionError;
pub use manager::{Session, SessionManager};
pub use store::{CredentialStore, MemoryCredentialStore};
