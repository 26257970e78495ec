//! Gravatar URL generation.

use sha2::{Digest, Sha256};

/// Builds a Gravatar URL for an email address.
///
/// Pure function: the address is trimmed and lowercased before hashing,
/// so case and whitespace variants of the same address map to the same
/// avatar.
pub fn gravatar_url(email: &str, size: Option<u32>) -> String {
    let normalized = email.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hex::encode(hasher.finalize());

    match size {
        Some(size) => format!(
            "https://www.gravatar.com/avatar/{digest}?d={}&s={size}",
            urlencoding::encode("identicon")
        ),
        None => format!(
            "https://www.gravatar.com/avatar/{digest}?d={}",
            urlencoding::encode("identicon")
        ),
    }
}
