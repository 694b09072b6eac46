//! Typed errors for API-key encryption.

use thiserror::Error;

/// Errors raised while encrypting or decrypting stored provider credentials.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Key or ciphertext was not valid base64
    #[error("invalid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// AES-256-GCM needs exactly 32 key bytes
    #[error("encryption key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// Ciphertext shorter than its nonce
    #[error("ciphertext is malformed")]
    Malformed,

    #[error("encryption failed")]
    Encrypt,

    /// Wrong key or tampered ciphertext
    #[error("decryption failed")]
    Decrypt,
}

/// Result type alias for cipher operations.
pub type CipherResult<T> = std::result::Result<T, CipherError>;
