//! Cipher error types.

use thiserror::Error;

/// Errors that can occur during message encryption/decryption.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The configured key has the wrong size or encoding.
    #[error("Invalid cipher key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("Encryption failed")]
    Encrypt,

    /// Decryption failed (wrong key or tampered token).
    #[error("Decryption failed")]
    Decrypt,

    /// The token is not valid base64 or is too short to hold a nonce.
    #[error("Malformed ciphertext token")]
    MalformedToken,
}

/// Result type for cipher operations.
pub type CipherResult<T> = Result<T, CipherError>;
