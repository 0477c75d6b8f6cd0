//! Encryption of hidden artwork content.
//!
//! Uploaded bytes are sealed with AES-256-GCM before they reach the database.
//! The 256-bit key is the SHA-256 digest of the configured secret. The stored
//! blob is `nonce (12 bytes) || ciphertext || tag`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Length of the AES-GCM nonce prefix in bytes.
pub const NONCE_LEN: usize = 12;

/// Symmetric cipher for artwork content.
#[derive(Clone)]
pub struct ContentCipher {
    cipher: Aes256Gcm,
}

impl ContentCipher {
    /// Derive a cipher from an arbitrary-length secret.
    pub fn from_secret(secret: &str) -> Result<Self, CoreError> {
        if secret.is_empty() {
            return Err(CoreError::Validation(
                "Content encryption key must not be empty".into(),
            ));
        }
        let key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CoreError::Internal(format!("Invalid content key: {e}")))?;
        Ok(Self { cipher })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes[..]);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CoreError::Internal("Failed to encrypt artwork content".into()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// Truncated, tampered, or foreign-key blobs fail authentication.
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, CoreError> {
        if sealed.len() <= NONCE_LEN {
            return Err(CoreError::Internal("Encrypted content is truncated".into()));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CoreError::Internal("Failed to decrypt artwork content".into()))
    }
}

impl std::fmt::Debug for ContentCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCipher").finish_non_exhaustive()
    }
}
