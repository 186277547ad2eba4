//! # SHA-256 Helpers
//!
//! The single SHA-256 entry point in the workspace. Used for passphrase key
//! derivation and per-trade nonce derivation.

use sha2::{Digest, Sha256};

/// SHA-256 of `data` as raw bytes.
pub fn sha256_raw(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(sha256_raw(data))
    }

    #[test]
    fn known_vector_empty() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn known_vector_abc() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn raw_digest_is_deterministic() {
        assert_eq!(sha256_raw(b"secret"), sha256_raw(b"secret"));
        assert_ne!(sha256_raw(b"secret"), sha256_raw(b"Secret"));
    }
}
