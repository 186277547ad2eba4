//! # Score Cipher
//!
//! The [`ScoreCipher`] trait abstracts the symmetric AEAD used to seal
//! ratings in escrow. [`AesGcmCipher`] is the production implementation
//! (AES-256-GCM, 96-bit nonce, 128-bit tag).
//!
//! ## Round-trip Law
//!
//! For any key `k`, nonce `n` and plaintext `p`:
//! `decrypt(k, n, encrypt(k, n, p)) == p`. Decrypting under any other key,
//! or after any bit of the ciphertext changed, yields
//! [`CryptoError::AuthenticationFailed`].

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce as GcmNonce};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::key::{CipherKey, Nonce};

// ---------------------------------------------------------------------------
// Ciphertext
// ---------------------------------------------------------------------------

/// Sealed bytes (ciphertext followed by the authentication tag), stored as
/// lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    /// Wrap raw sealed bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode from hex.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::HexDecode`] for malformed hex.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| CryptoError::HexDecode(e.to_string()))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Access the raw sealed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Ciphertext {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Ciphertext> for String {
    fn from(ct: Ciphertext) -> Self {
        ct.to_hex()
    }
}

// ---------------------------------------------------------------------------
// ScoreCipher trait
// ---------------------------------------------------------------------------

/// Authenticated symmetric encryption for escrowed ratings.
pub trait ScoreCipher: Send + Sync {
    /// Derive a key from a passphrase. Must be deterministic.
    fn derive_key(&self, passphrase: &str) -> CipherKey;

    /// Seal `plaintext` under `key` and `nonce`.
    fn encrypt(
        &self,
        key: &CipherKey,
        nonce: &Nonce,
        plaintext: &[u8],
    ) -> Result<Ciphertext, CryptoError>;

    /// Open `ciphertext` under `key` and `nonce`.
    ///
    /// Returns [`CryptoError::AuthenticationFailed`] if the tag does not
    /// verify.
    fn decrypt(
        &self,
        key: &CipherKey,
        nonce: &Nonce,
        ciphertext: &Ciphertext,
    ) -> Result<Vec<u8>, CryptoError>;
}

// ---------------------------------------------------------------------------
// AES-256-GCM
// ---------------------------------------------------------------------------

/// AES-256-GCM implementation of [`ScoreCipher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    /// Create the cipher.
    pub fn new() -> Self {
        Self
    }

    fn aead(key: &CipherKey) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
    }
}

impl ScoreCipher for AesGcmCipher {
    fn derive_key(&self, passphrase: &str) -> CipherKey {
        CipherKey::from_passphrase(passphrase)
    }

    fn encrypt(
        &self,
        key: &CipherKey,
        nonce: &Nonce,
        plaintext: &[u8],
    ) -> Result<Ciphertext, CryptoError> {
        Self::aead(key)
            .encrypt(GcmNonce::from_slice(nonce.as_bytes()), plaintext)
            .map(Ciphertext)
            .map_err(|e| CryptoError::Cipher(e.to_string()))
    }

    fn decrypt(
        &self,
        key: &CipherKey,
        nonce: &Nonce,
        ciphertext: &Ciphertext,
    ) -> Result<Vec<u8>, CryptoError> {
        Self::aead(key)
            .decrypt(GcmNonce::from_slice(nonce.as_bytes()), ciphertext.as_bytes())
            .map_err(|_| CryptoError::AuthenticationFailed)
    }
}
