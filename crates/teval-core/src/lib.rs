#![deny(missing_docs)]

//! # teval-core — Foundational Types for the Trade Evaluation Ledger
//!
//! Every other crate in the workspace depends on the types defined here.
//! The crate has no internal dependencies, only `serde`, `thiserror` and
//! `chrono` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A [`TradeId`] cannot be passed
//!    where a [`UserToken`] is expected, and neither can be empty.
//!
//! 2. **One score shape.** Ratings are always a [`ScoreTriple`]: exactly
//!    three per-question integers. The bracketed text form (`"[3,4,5]"`) is
//!    the only plaintext that is ever encrypted, and it is produced and
//!    parsed in one place.
//!
//! 3. **UTC timestamps with full precision.** [`Timestamp`] keeps
//!    nanoseconds because the per-trade nonce is derived from them.
//!
//! 4. **[`ValidationError`] hierarchy.** Structured errors with `thiserror`,
//!    no `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod score;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use error::ValidationError;
pub use identity::{ServiceCode, TradeId, UserToken, PROPERTIES_KEY};
pub use score::{ScoreTriple, SCORE_LIMIT, SCORE_QUESTIONS};
pub use temporal::Timestamp;
