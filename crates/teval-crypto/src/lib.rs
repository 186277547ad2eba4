//! # teval-crypto — Cipher Adapter for Sealed Ratings
//!
//! Ratings sit in escrow encrypted until both parties have submitted. This
//! crate provides the building blocks:
//!
//! - **Key derivation**: a passphrase is hashed with SHA-256 into a 256-bit
//!   [`CipherKey`]. Deterministic, so both parties and the reveal step
//!   arrive at the same key from the same passphrase.
//! - **Nonce derivation**: a 96-bit [`Nonce`] is derived once per trade
//!   from the trade's creation timestamp.
//! - **AEAD**: [`AesGcmCipher`] implements the [`ScoreCipher`] trait with
//!   AES-256-GCM. Tampering or a wrong key surfaces as
//!   [`CryptoError::AuthenticationFailed`].
//!
//! The [`ScoreCipher`] trait is the seam: the ledger only talks to the
//! trait, so a host may substitute a different AEAD backend.

pub mod cipher;
pub mod error;
pub mod key;
pub mod sha256;

// Re-export primary types.
pub use cipher::{AesGcmCipher, Ciphertext, ScoreCipher};
pub use error::CryptoError;
pub use key::{CipherKey, Nonce, KEY_SIZE, NONCE_SIZE};
pub use sha256::sha256_raw;
