#![deny(missing_docs)]

//! # teval-ledger — Trade Evaluation Ledger
//!
//! A ledger-backed escrow-and-reputation engine. Two parties record a
//! trade, each submits a sealed rating of the other, and once both are in
//! the ratings are revealed, written permanently into the trade, and folded
//! into per-user and global running statistics.
//!
//! ## Components
//!
//! - [`user`]: per-user reputation aggregates and the global totals.
//! - [`trade`]: trade records, two-sided closing, finalization, queries.
//! - [`escrow`]: the sealed score pair and its reveal protocol.
//! - [`properties`]: the two protocol durations.
//! - [`evaluation`]: reveal, finalize and aggregate in one call.
//! - [`ledger`]: the [`EvaluationLedger`] operation surface.
//! - [`dispatch`]: named operations with string arguments.
//!
//! ## Lifecycle
//!
//! ```text
//! createTrade ──▶ escrow Open ──submit×2──▶ BothSubmitted ──revealScore──▶ trade finalized
//!                                                                           escrow deleted
//!                                                                           aggregates updated
//! ```
//!
//! ## Execution Model
//!
//! Every operation is synchronous and runs as a sequence of keyed-store
//! round-trips. The ledger never assumes those round-trips commit
//! together; the host's transaction model decides that. Deadlines are
//! stored as timestamps for an external sweep and never enforced inline.

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod escrow;
pub mod evaluation;
pub mod ledger;
pub mod properties;
pub mod record;
pub mod trade;
pub mod user;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use dispatch::invoke;
pub use error::{ConfigError, LedgerError};
pub use escrow::{EscrowPhase, RevealedScores, ScoreEscrow, ScoreEscrowLedger};
pub use evaluation::EvaluationEngine;
pub use ledger::EvaluationLedger;
pub use properties::{parse_duration, Properties, PropertiesStore, MAX_DURATION};
pub use record::{LedgerRecord, RecordKind};
pub use trade::{Closing, Trade, TradeLedger, TradePage, TradeQuery, TradeScore};
pub use user::{
    AggregateBucket, GlobalTotals, ReceivedRole, ReputationStats, TradeRole, User, UserLedger,
};
