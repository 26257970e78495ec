//! Server-side session records.
//!
//! A session is an opaque random token mapped to a server-side record.
//! Session existence is the login state; the persisted `is_logged_in`
//! flag on the user record is advisory only. Expiry is enforced here via
//! record age, not in handlers.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuthError, AuthResult};

/// A server-side session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque bearer token, also used as the cookie value.
    pub token: String,
    /// The authenticated user.
    pub user_id: Uuid,
    /// One-shot marker set by a password change and consumed by the next
    /// session-view read.
    pub password_updated: bool,
    /// Creation timestamp (unix seconds).
    pub created_at: i64,
}

impl SessionRecord {
    /// Creates a new session record with a fresh token.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            token: generate_session_token(),
            user_id,
            password_updated: false,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Returns true if the record is older than `max_age_secs`.
    pub fn is_expired(&self, max_age_secs: i64) -> bool {
        let age = chrono::Utc::now().timestamp() - self.created_at;
        age > max_age_secs
    }
}

/// Generates a cryptographically random session token.
fn generate_session_token() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.random::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Trait for session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a session record.
    async fn store(&self, session: &SessionRecord) -> AuthResult<()>;

    /// Retrieves a session record by token.
    async fn get(&self, token: &str) -> AuthResult<Option<SessionRecord>>;

    /// Removes a session. Returns true if one existed.
    async fn remove(&self, token: &str) -> AuthResult<bool>;

    /// Sets the one-shot password-updated marker on a session.
    async fn mark_password_updated(&self, token: &str) -> AuthResult<()>;

    /// Reads and clears the password-updated marker.
    ///
    /// The marker is consumed exactly once; a second read returns false.
    async fn take_password_updated(&self, token: &str) -> AuthResult<bool>;

    /// Removes expired sessions (cleanup task).
    ///
    /// Returns the number of sessions removed.
    async fn cleanup_expired(&self, max_age_secs: i64) -> AuthResult<usize>;
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    /// Creates a new in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn store(&self, session: &SessionRecord) -> AuthResult<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, token: &str) -> AuthResult<Option<SessionRecord>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        Ok(sessions.get(token).cloned())
    }

    async fn remove(&self, token: &str) -> AuthResult<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        Ok(sessions.remove(token).is_some())
    }

    async fn mark_password_updated(&self, token: &str) -> AuthResult<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        match sessions.get_mut(token) {
            Some(session) => {
                session.password_updated = true;
                Ok(())
            }
            None => Err(AuthError::InvalidSession),
        }
    }

    async fn take_password_updated(&self, token: &str) -> AuthResult<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        match sessions.get_mut(token) {
            Some(session) => {
                let updated = session.password_updated;
                session.password_updated = false;
                Ok(updated)
            }
            None => Ok(false),
        }
    }

    async fn cleanup_expired(&self, max_age_secs: i64) -> AuthResult<usize> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        let before_count = sessions.len();
        sessions.retain(|_, session| !session.is_expired(max_age_secs));
        Ok(before_count - sessions.len())
    }
}
