//! Secret value encryption using AES-256-GCM
//!
//! Connection passwords and client secrets are encrypted at rest with a key
//! derived from the configured cipher secret. Ciphertexts carry their nonce,
//! so `decrypt(encrypt(x)) == x` holds under a fixed secret while two
//! encryptions of the same plaintext still differ.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::ConfigError;

/// Nonce size for AES-256-GCM (96 bits)
const NONCE_SIZE: usize = 12;

/// Symmetric cipher for secrets persisted by the metadata store.
///
/// The key is the SHA-256 digest of the configured passphrase, so any two
/// processes sharing the same configuration can decrypt each other's
/// ciphertexts.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Derive the cipher from the configured secret string.
    pub fn new(passphrase: &str) -> Self {
        let key = Sha256::digest(passphrase.as_bytes());
        // Sha256 output is exactly the AES-256 key size.
        let cipher = Aes256Gcm::new_from_slice(&key).expect("SHA-256 digest is 32 bytes");
        Self { cipher }
    }

    /// Encrypt a plaintext, returning base64(nonce || ciphertext).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, ConfigError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| ConfigError::encryption(format!("Encryption failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    ///
    /// Every failure mode (bad base64, truncated input, tampered data,
    /// wrong key) is reported as a recoverable [`ConfigError::Encryption`];
    /// request paths surface the error rather than panicking.
    pub fn decrypt(&self, encoded: &str) -> Result<String, ConfigError> {
        let raw = BASE64
            .decode(encoded.trim())
            .map_err(|e| ConfigError::encryption(format!("Invalid ciphertext base64: {e}")))?;

        if raw.len() < NONCE_SIZE {
            return Err(ConfigError::encryption(
                "Ciphertext too short (missing nonce)",
            ));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| ConfigError::encryption(format!("Decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| ConfigError::encryption(format!("Invalid UTF-8 in decrypted value: {e}")))
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher")
            .field("key", &"<redacted>")
            .finish()
    }
}
