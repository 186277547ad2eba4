//! # Ledger Error Types
//!
//! Every ledger operation returns [`LedgerError`] on rejection. Nothing is
//! retried or swallowed: the only recovery anywhere in the ledger is the
//! trade rollback when its escrow cannot be created.
//!
//! Lower-layer errors (`ValidationError`, `CryptoError`, `StoreError`)
//! convert via `#[from]`, except tag failures, which surface as the
//! dedicated [`LedgerError::AuthenticationFailed`] with the trade id.

use teval_core::ValidationError;
use teval_crypto::CryptoError;
use teval_store::StoreError;
use thiserror::Error;

use crate::record::RecordKind;

/// Errors arising from ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A user, trade, escrow, or the properties record is absent.
    #[error("{kind} \"{key}\" not found")]
    NotFound {
        /// Kind of record looked up.
        kind: RecordKind,
        /// Key or trade id used for the lookup.
        key: String,
    },

    /// A user with this token is already registered.
    #[error("user \"{token}\" already exists")]
    AlreadyExists {
        /// The duplicate token.
        token: String,
    },

    /// The operation collides with existing state.
    #[error("{kind} \"{key}\" conflict: {reason}")]
    Conflict {
        /// Kind of record involved.
        kind: RecordKind,
        /// Key of the record involved.
        key: String,
        /// What collided.
        reason: String,
    },

    /// The caller is neither the seller nor the buyer of the trade.
    #[error("caller \"{caller}\" is not a party to trade \"{trade_id}\"")]
    Forbidden {
        /// The trade.
        trade_id: String,
        /// The rejected caller token.
        caller: String,
    },

    /// A score does not consist of exactly three integers.
    #[error("invalid score: {reason}")]
    InvalidScore {
        /// Why the score was rejected.
        reason: String,
    },

    /// An escrowed ciphertext did not verify under the supplied passphrase.
    #[error("score authentication failed for trade \"{trade_id}\"")]
    AuthenticationFailed {
        /// The trade whose escrow failed to open.
        trade_id: String,
    },

    /// More than one escrow record matched a trade.
    #[error("inconsistent state: {matches} escrow records match trade \"{trade_id}\"")]
    Inconsistent {
        /// The trade.
        trade_id: String,
        /// Number of matching escrow records.
        matches: usize,
    },

    /// Trade creation failed and the partially written trade could not be
    /// removed again.
    #[error("trade \"{trade_id}\" left behind: {cause}; rollback failed: {rollback}")]
    RollbackFailed {
        /// The trade whose record remains.
        trade_id: String,
        /// The failure that triggered the rollback.
        cause: String,
        /// The failure of the rollback itself.
        rollback: String,
    },

    /// A stored record could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A duration argument is malformed.
    #[error("invalid duration \"{value}\": {reason}")]
    InvalidDuration {
        /// The rejected text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A dispatched operation received unusable arguments.
    #[error("invalid arguments for {function}: {reason}")]
    InvalidArguments {
        /// The dispatched function name.
        function: String,
        /// What was wrong.
        reason: String,
    },

    /// No operation is registered under this name.
    #[error("unknown function \"{0}\"")]
    UnknownFunction(String),

    /// An identifier or timestamp failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Cipher failure other than authentication.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The keyed store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Ledger configuration is malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LedgerError {
    /// Wrap a score validation failure as [`LedgerError::InvalidScore`].
    pub fn invalid_score(err: ValidationError) -> Self {
        Self::InvalidScore {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

/// Errors loading [`LedgerConfig`](crate::config::LedgerConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("invalid value \"{value}\" for {var}: {reason}")]
    InvalidValue {
        /// Variable name.
        var: String,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
