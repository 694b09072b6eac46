//! AES-256-GCM encryption for provider API keys at rest.
//!
//! Stored form is `base64(nonce || ciphertext)` with a fresh 96-bit nonce per
//! encryption. Keys are decrypted only at the moment a provider is built.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{CipherError, CipherResult};

const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct KeyCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyCipher(<redacted>)")
    }
}

impl KeyCipher {
    /// Build from a base64-encoded 32-byte key (`ASSISTANT_ENCRYPTION_KEY`).
    pub fn from_base64_key(encoded: &str) -> CipherResult<Self> {
        let bytes = STANDARD.decode(encoded.trim())?;
        let cipher =
            Aes256Gcm::new_from_slice(&bytes).map_err(|_| CipherError::InvalidKeyLength(bytes.len()))?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> CipherResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, encoded: &str) -> CipherResult<String> {
        let bytes = STANDARD.decode(encoded.trim())?;
        if bytes.len() <= NONCE_LEN {
            return Err(CipherError::Malformed);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
    }
}
