//! Email verification codes.
//!
//! Short numeric codes mailed for registration, password reset, and
//! password change flows. Codes are hashed before storage and consumed on
//! successful verification; a mismatch leaves the code in place until its
//! TTL runs out.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{hash_token, AuthError, AuthResult};

/// What a verification code authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodePurpose {
    /// Confirming an email address during registration.
    Registration,
    /// Resetting a forgotten password.
    PasswordReset,
    /// Authorizing a password change.
    PasswordChange,
}

/// A stored verification code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    /// Email the code was sent to.
    pub email: String,
    /// SHA-256 hash of the code digits.
    pub code_hash: String,
    /// Flow the code belongs to.
    pub purpose: CodePurpose,
    /// Creation timestamp (unix seconds).
    pub created_at: i64,
}

impl VerificationCode {
    /// Creates a stored code from the raw digits.
    pub fn new(email: impl Into<String>, code: &str, purpose: CodePurpose) -> Self {
        Self {
            email: email.into(),
            code_hash: hash_token(code),
            purpose,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Returns true if the code is older than `max_age_secs`.
    pub fn is_expired(&self, max_age_secs: i64) -> bool {
        let age = chrono::Utc::now().timestamp() - self.created_at;
        age > max_age_secs
    }
}

/// Generates a 6-digit verification code.
pub fn generate_verification_code() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..1_000_000))
}

/// Trait for verification code storage.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Stores a code, replacing any pending code for the same
    /// (email, purpose) pair.
    async fn store(&self, code: &VerificationCode) -> AuthResult<()>;

    /// Verifies a candidate code. On match the stored code is consumed;
    /// on mismatch it is left in place.
    async fn verify_and_consume(
        &self,
        email: &str,
        purpose: CodePurpose,
        candidate: &str,
        max_age_secs: i64,
    ) -> AuthResult<bool>;

    /// Removes expired codes (cleanup task).
    ///
    /// Returns the number of codes removed.
    async fn cleanup_expired(&self, max_age_secs: i64) -> AuthResult<usize>;
}

/// In-memory verification code store.
#[derive(Debug, Default)]
pub struct MemoryCodeStore {
    codes: RwLock<HashMap<(String, CodePurpose), VerificationCode>>,
}

impl MemoryCodeStore {
    /// Creates a new in-memory code store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn store(&self, code: &VerificationCode) -> AuthResult<()> {
        let mut codes = self
            .codes
            .write()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        codes.insert((code.email.clone(), code.purpose), code.clone());
        Ok(())
    }

    async fn verify_and_consume(
        &self,
        email: &str,
        purpose: CodePurpose,
        candidate: &str,
        max_age_secs: i64,
    ) -> AuthResult<bool> {
        let mut codes = self
            .codes
            .write()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        let key = (email.to_string(), purpose);
        let Some(stored) = codes.get(&key) else {
            return Ok(false);
        };
        if stored.is_expired(max_age_secs) {
            codes.remove(&key);
            return Ok(false);
        }
        if stored.code_hash != hash_token(candidate) {
            return Ok(false);
        }
        codes.remove(&key);
        Ok(true)
    }

    async fn cleanup_expired(&self, max_age_secs: i64) -> AuthResult<usize> {
        let mut codes = self
            .codes
            .write()
            .map_err(|e| AuthError::SessionStore(format!("Lock poisoned: {}", e)))?;
        let before_count = codes.len();
        codes.retain(|_, code| !code.is_expired(max_age_secs));
        Ok(before_count - codes.len())
    }
}
