//! Single-use bearer tokens.
//!
//! Registration confirmation works with an out-of-band bearer token: the
//! raw token goes to the user, only its SHA-256 hash is stored, and the
//! lookup at completion time is by hash.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

/// A confirmation token pair: the raw token for the caller and the hash
/// for storage.
#[derive(Debug, Clone)]
pub struct ConfirmationToken {
    /// The raw token, handed to the user out of band.
    pub token: String,
    /// SHA-256 hash of the token, the only form that is persisted.
    pub token_hash: String,
}

impl ConfirmationToken {
    /// Generates a new token pair.
    pub fn generate() -> Self {
        let token = generate_token();
        let token_hash = hash_token(&token);
        Self { token, token_hash }
    }

    /// Verifies that a raw token matches a stored hash.
    pub fn verify(token: &str, token_hash: &str) -> bool {
        hash_token(token) == token_hash
    }
}

/// Generates a cryptographically random bearer token.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.random::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Hashes a raw token for storage or lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let hash = hasher.finalize();
    URL_SAFE_NO_PAD.encode(hash)
}
