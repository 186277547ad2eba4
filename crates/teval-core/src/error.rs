//! # Validation Errors
//!
//! Construction-time failures for the domain primitives in this crate.
//! Each variant carries the rejected input so that operators can diagnose
//! a bad request without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes and score values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier (trade id, user token, service code) was empty.
    #[error("{kind} must be non-empty")]
    EmptyIdentifier {
        /// Which identifier kind was rejected.
        kind: &'static str,
    },

    /// An identifier contained characters that cannot be used as a store key.
    #[error("invalid {kind}: \"{value}\" (control characters are not permitted)")]
    InvalidIdentifier {
        /// Which identifier kind was rejected.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An identifier collides with a key the ledger keeps for itself.
    #[error("{kind} \"{value}\" is reserved")]
    ReservedIdentifier {
        /// Which identifier kind was rejected.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Score text is not a bracketed, comma-separated list of integers.
    #[error("invalid score text \"{value}\": {reason}")]
    InvalidScoreText {
        /// The text that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A score did not contain exactly one value per evaluation question.
    #[error("score must have exactly {expected} values, got {actual}")]
    InvalidScoreArity {
        /// Number of evaluation questions.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// A question score lies outside the accepted range.
    #[error("score value {value} is outside -{limit}..={limit}")]
    ScoreOutOfRange {
        /// The rejected value.
        value: i64,
        /// Largest accepted magnitude.
        limit: i64,
    },

    /// Timestamp string is not valid RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Shifting a timestamp would leave the four-digit-year range.
    #[error("{start} plus {secs}s is past the latest storable timestamp")]
    TimestampOutOfRange {
        /// The instant being shifted.
        start: String,
        /// The requested shift in seconds.
        secs: u64,
    },
}
