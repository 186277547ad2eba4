//! # Cryptographic Error Types
//!
//! Structured errors for the cipher adapter, built with `thiserror`.

use thiserror::Error;

/// Errors from key handling and authenticated encryption.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The AEAD tag did not verify: wrong key, wrong nonce, or tampered data.
    #[error("authentication failed: ciphertext does not verify under the supplied key")]
    AuthenticationFailed,

    /// The cipher refused the input (e.g. plaintext exceeds the AEAD limit).
    #[error("cipher error: {0}")]
    Cipher(String),

    /// Hex decoding error for a stored nonce or ciphertext.
    #[error("hex decode error: {0}")]
    HexDecode(String),

    /// A stored nonce has the wrong length.
    #[error("invalid nonce length: expected {expected} bytes, got {actual}")]
    InvalidNonceLength {
        /// Required length.
        expected: usize,
        /// Length found.
        actual: usize,
    },
}
