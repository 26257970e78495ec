//! Salted password hashing.
//!
//! Argon2 with an explicit salt per password. The salt is returned
//! alongside the digest so a candidate can be rehashed with the same
//! parameters later, which is how both the current-password check and the
//! history reuse check work.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use rand::Rng;

use crate::{AuthError, AuthResult};

const SALT_SIZE: usize = 16;

/// A freshly hashed password: the salt it was hashed with plus the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    /// Base64 salt.
    pub salt: String,
    /// Base64 Argon2 digest.
    pub hash: String,
}

/// Generates a random base64 salt.
pub fn gen_salt() -> AuthResult<String> {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..SALT_SIZE).map(|_| rng.random::<u8>()).collect();
    SaltString::encode_b64(&bytes)
        .map(|s| s.as_str().to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Hashes a password with the given base64 salt.
pub fn hash_password(plaintext: &str, salt: &str) -> AuthResult<String> {
    let salt = SaltString::from_b64(salt).map_err(|e| AuthError::Hashing(e.to_string()))?;
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    let digest = password_hash
        .hash
        .ok_or_else(|| AuthError::Hashing("empty digest".to_string()))?;
    Ok(digest.to_string())
}

/// Hashes a password with a fresh salt.
pub fn hash_new_password(plaintext: &str) -> AuthResult<HashedPassword> {
    let salt = gen_salt()?;
    let hash = hash_password(plaintext, &salt)?;
    Ok(HashedPassword { salt, hash })
}

/// Returns true when `plaintext` hashed with `salt` equals `expected_hash`.
pub fn verify_password(plaintext: &str, salt: &str, expected_hash: &str) -> AuthResult<bool> {
    let computed = hash_password(plaintext, salt)?;
    Ok(computed == expected_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let hashed = hash_new_password("Secr3t!23").unwrap();

        assert!(verify_password("Secr3t!23", &hashed.salt, &hashed.hash).unwrap());
        assert!(!verify_password("wrong", &hashed.salt, &hashed.hash).unwrap());
    }

    #[test]
    fn test_same_salt_is_deterministic() {
        let salt = gen_salt().unwrap();
        let first = hash_password("Secr3t!23", &salt).unwrap();
        let second = hash_password("Secr3t!23", &salt).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_fresh_salts_differ() {
        let first = hash_new_password("Secr3t!23").unwrap();
        let second = hash_new_password("Secr3t!23").unwrap();

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }
}
