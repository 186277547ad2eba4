//! # Key and Nonce Material
//!
//! [`CipherKey`] is the 256-bit symmetric key derived from a party's
//! passphrase. It is zeroized on drop and never printed.
//!
//! [`Nonce`] is the 96-bit AEAD nonce shared by both escrow slots of a
//! trade. It is derived once, at trade creation, from the creation
//! timestamp and then persisted on the trade and its escrow record, so
//! every later encrypt and decrypt uses the exact same bytes.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use teval_core::Timestamp;

use crate::error::CryptoError;
use crate::sha256::sha256_raw;

/// Size of a [`CipherKey`] in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a [`Nonce`] in bytes.
pub const NONCE_SIZE: usize = 12;

// ---------------------------------------------------------------------------
// CipherKey
// ---------------------------------------------------------------------------

/// A 256-bit symmetric key.
///
/// Does not implement `Serialize`, `Clone`, or a revealing `Debug`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CipherKey([u8; KEY_SIZE]);

impl CipherKey {
    /// SHA-256 of the passphrase bytes.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self(sha256_raw(passphrase.as_bytes()))
    }

    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Nonce
// ---------------------------------------------------------------------------

/// A 96-bit AEAD nonce, stored as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Derive the nonce for a trade created at `created_at`.
    ///
    /// The first twelve bytes of SHA-256 over [`Timestamp::nonce_text`].
    pub fn derive(created_at: &Timestamp) -> Self {
        let digest = sha256_raw(created_at.nonce_text().as_bytes());
        let mut bytes = [0u8; NONCE_SIZE];
        bytes.copy_from_slice(&digest[..NONCE_SIZE]);
        Self(bytes)
    }

    /// Wrap raw nonce bytes.
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Decode from hex.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::HexDecode`] for malformed hex and
    /// [`CryptoError::InvalidNonceLength`] if the decoded bytes are not
    /// exactly [`NONCE_SIZE`] long.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(s).map_err(|e| CryptoError::HexDecode(e.to_string()))?;
        let bytes: [u8; NONCE_SIZE] =
            raw.as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidNonceLength {
                    expected: NONCE_SIZE,
                    actual: raw.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Access the raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl std::fmt::Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Nonce {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Nonce> for String {
    fn from(nonce: Nonce) -> Self {
        nonce.to_hex()
    }
}
