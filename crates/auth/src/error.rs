//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Username/password pair did not match. Deliberately carries no
    /// detail about which part was wrong.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Session token unknown or expired.
    #[error("Invalid session")]
    InvalidSession,

    /// Confirmation token unknown.
    #[error("Invalid token")]
    InvalidToken,

    /// Verification code unknown or expired.
    #[error("Invalid verification code")]
    InvalidCode,

    /// Session store failure.
    #[error("Session store error: {0}")]
    SessionStore(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
