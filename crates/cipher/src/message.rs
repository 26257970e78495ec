//! ChaCha20-Poly1305 message cipher.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chacha20poly1305::{
    aead::{Aead, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{CipherError, CipherResult};

const KEY_SIZE: usize = 32; // 256 bits for ChaCha20Poly1305
const NONCE_SIZE: usize = 12; // 96 bits for ChaCha20Poly1305

/// Symmetric message cipher keyed by a server-held secret.
///
/// Tokens are base64url of `nonce || ciphertext`; a fresh nonce per
/// message means encrypting the same text twice yields different tokens.
#[derive(Clone)]
pub struct MessageCipher {
    key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for MessageCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCipher").finish_non_exhaustive()
    }
}

impl MessageCipher {
    /// Creates a cipher from a base64url-encoded 256-bit key.
    pub fn from_base64_key(encoded: &str) -> CipherResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CipherError::InvalidKey("key must be 32 bytes".to_string()))?;
        Ok(Self { key })
    }

    /// Creates a cipher by stretching an arbitrary passphrase to key size.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(passphrase.as_bytes());
        let hash = hasher.finalize();
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&hash);
        Self { key }
    }

    /// Encrypts plaintext into an opaque token.
    pub fn encrypt(&self, plaintext: &str) -> CipherResult<String> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|_| CipherError::InvalidKey("bad key size".to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut token = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    /// Decrypts a token produced by [`MessageCipher::encrypt`].
    pub fn decrypt(&self, token: &str) -> CipherResult<String> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CipherError::MalformedToken)?;
        if bytes.len() < NONCE_SIZE {
            return Err(CipherError::MalformedToken);
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);

        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|_| CipherError::InvalidKey("bad key size".to_string()))?;
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> MessageCipher {
        MessageCipher::from_passphrase("test-secret")
    }

    #[test]
    fn test_round_trip() {
        let cipher = cipher();
        let token = cipher.encrypt("Let's collab").unwrap();

        assert_ne!(token, "Let's collab");
        assert_eq!(cipher.decrypt(&token).unwrap(), "Let's collab");
    }

    #[test]
    fn test_distinct_plaintexts_distinct_tokens() {
        let cipher = cipher();
        let first = cipher.encrypt("one").unwrap();
        let second = cipher.encrypt("two").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_fresh_nonce_per_message() {
        let cipher = cipher();
        let first = cipher.encrypt("same text").unwrap();
        let second = cipher.encrypt("same text").unwrap();

        assert_ne!(first, second);
        assert_eq!(cipher.decrypt(&first).unwrap(), "same text");
        assert_eq!(cipher.decrypt(&second).unwrap(), "same text");
    }

    #[test]
    fn test_wrong_key_fails() {
        let token = cipher().encrypt("secret").unwrap();
        let other = MessageCipher::from_passphrase("other-secret");
        assert!(other.decrypt(&token).is_err());
    }

    #[test]
    fn test_tampered_token_fails() {
        let cipher = cipher();
        let token = cipher.encrypt("secret").unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(bytes);

        assert!(cipher.decrypt(&tampered).is_err());
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let cipher = cipher();
        assert!(matches!(
            cipher.decrypt("not base64!!"),
            Err(CipherError::MalformedToken)
        ));
        assert!(matches!(
            cipher.decrypt("AAAA"),
            Err(CipherError::MalformedToken)
        ));
    }

    #[test]
    fn test_base64_key_round_trip() {
        let key_bytes = [7u8; 32];
        let encoded = URL_SAFE_NO_PAD.encode(key_bytes);
        let cipher = MessageCipher::from_base64_key(&encoded).unwrap();

        let token = cipher.encrypt("hello").unwrap();
        assert_eq!(cipher.decrypt(&token).unwrap(), "hello");
    }

    #[test]
    fn test_bad_keys_rejected() {
        assert!(MessageCipher::from_base64_key("short").is_err());
        assert!(MessageCipher::from_base64_key("!!!").is_err());
    }
}
