//! # User Ledger
//!
//! Per-user running reputation statistics, plus the global totals
//! aggregate that sums every revealed score across all users.
//!
//! ## Buckets
//!
//! Each user carries three [`AggregateBucket`]s: `sell` (scores received
//! as seller), `buy` (scores received as buyer) and `trade` (both). Every
//! accumulation touches exactly one of `sell`/`buy` and always mirrors into
//! `trade`, so `trade == sell + buy` holds after every successful update.
//!
//! ## Pending Counts
//!
//! Opening a trade increments the role's trade count and pending count.
//! A revealed score decrements the pending count only if it is a real
//! rating. The all-zero triple is the "nobody rated, defaulted" value: it
//! is still summed (adding nothing) but leaves the pending count alone.

use serde::{Deserialize, Serialize};
use teval_core::{ScoreTriple, Timestamp, UserToken, SCORE_QUESTIONS};
use teval_store::KeyedStore;

use crate::error::LedgerError;
use crate::record::{kind_at, RecordKind, Repository};

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Side of a trade a user opened it on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeRole {
    /// The selling party.
    Seller,
    /// The buying party.
    Buyer,
}

impl TradeRole {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Buyer => "buyer",
        }
    }
}

impl std::fmt::Display for TradeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side a revealed score was received on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivedRole {
    /// Received by the seller (rated by the buyer).
    SellerReceived,
    /// Received by the buyer (rated by the seller).
    BuyerReceived,
}

impl ReceivedRole {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SellerReceived => "seller_received",
            Self::BuyerReceived => "buyer_received",
        }
    }
}

impl std::fmt::Display for ReceivedRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Running sum of scores: overall total plus one sum per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateBucket {
    /// Sum over every question of every score added.
    pub total: i64,
    /// Per-question sums.
    pub per_question: [i64; SCORE_QUESTIONS],
}

impl AggregateBucket {
    /// Add one score triple.
    pub fn add(&mut self, scores: &ScoreTriple) {
        for (sum, value) in self.per_question.iter_mut().zip(scores.values()) {
            *sum = sum.saturating_add(value);
        }
        self.total = self.total.saturating_add(scores.total());
    }

    /// Component-wise sum of two buckets.
    pub fn combined(&self, other: &Self) -> Self {
        let mut per_question = self.per_question;
        for (sum, value) in per_question.iter_mut().zip(other.per_question) {
            *sum = sum.saturating_add(value);
        }
        Self {
            total: self.total.saturating_add(other.total),
            per_question,
        }
    }
}

/// Trade counters and score buckets shared by users and global totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReputationStats {
    /// Trades opened as seller.
    pub sell_count: u64,
    /// Trades opened as buyer.
    pub buy_count: u64,
    /// Seller-side trades still awaiting a real rating.
    pub pending_sell: u64,
    /// Buyer-side trades still awaiting a real rating.
    pub pending_buy: u64,
    /// Scores received as seller.
    pub sell: AggregateBucket,
    /// Scores received as buyer.
    pub buy: AggregateBucket,
    /// Scores received on either side.
    pub trade: AggregateBucket,
}

impl ReputationStats {
    /// Count a newly opened trade on `role`.
    pub fn open_trade(&mut self, role: TradeRole) {
        match role {
            TradeRole::Seller => {
                self.sell_count = self.sell_count.saturating_add(1);
                self.pending_sell = self.pending_sell.saturating_add(1);
            }
            TradeRole::Buyer => {
                self.buy_count = self.buy_count.saturating_add(1);
                self.pending_buy = self.pending_buy.saturating_add(1);
            }
        }
    }

    /// Fold a revealed score into the bucket for `role`.
    pub fn accumulate(&mut self, scores: &ScoreTriple, role: ReceivedRole) {
        let settled = !scores.is_defaulted();
        match role {
            ReceivedRole::SellerReceived => {
                self.sell.add(scores);
                if settled {
                    self.pending_sell = self.pending_sell.saturating_sub(1);
                }
            }
            ReceivedRole::BuyerReceived => {
                self.buy.add(scores);
                if settled {
                    self.pending_buy = self.pending_buy.saturating_sub(1);
                }
            }
        }
        self.trade.add(scores);
    }

    /// Whether `trade == sell + buy` component-wise.
    pub fn is_balanced(&self) -> bool {
        self.trade == self.sell.combined(&self.buy)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's token, also its store key.
    pub token: UserToken,
    /// When the user registered.
    pub registered_at: Timestamp,
    /// Trade counters and score buckets.
    pub stats: ReputationStats,
}

/// Global totals across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalTotals {
    /// When the totals record was first created.
    pub created_at: Timestamp,
    /// Trade counters and score buckets over every user.
    pub stats: ReputationStats,
}

impl GlobalTotals {
    /// Store key of the singleton.
    pub const KEY: &'static str = UserToken::TOTALS;

    fn new(created_at: Timestamp) -> Self {
        Self {
            created_at,
            stats: ReputationStats::default(),
        }
    }
}

fn score_from(scores: &[i64]) -> Result<ScoreTriple, LedgerError> {
    ScoreTriple::from_slice(scores).map_err(LedgerError::invalid_score)
}

// ---------------------------------------------------------------------------
// UserLedger
// ---------------------------------------------------------------------------

/// User and global-totals operations over a keyed store.
pub struct UserLedger<'a, S: ?Sized> {
    store: &'a S,
    users: Repository<'a, S, User>,
    totals: Repository<'a, S, GlobalTotals>,
}

impl<'a, S: KeyedStore + ?Sized> UserLedger<'a, S> {
    /// Bind to a store.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            users: Repository::new(store),
            totals: Repository::new(store),
        }
    }

    /// Register `token`.
    ///
    /// The reserved totals token is idempotent: it ensures the global
    /// totals record exists and succeeds whether or not it already did.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AlreadyExists`] if the user is already registered,
    /// [`LedgerError::Conflict`] if the key holds another kind of record.
    pub fn register(&self, token: &UserToken, now: Timestamp) -> Result<(), LedgerError> {
        if token.is_totals() {
            self.ensure_totals(now)?;
            return Ok(());
        }

        match kind_at(self.store, token.as_str())? {
            Some(RecordKind::User) => {
                return Err(LedgerError::AlreadyExists {
                    token: token.to_string(),
                })
            }
            Some(other) => {
                return Err(LedgerError::Conflict {
                    kind: RecordKind::User,
                    key: token.to_string(),
                    reason: format!("key is in use by a {other} record"),
                })
            }
            None => {}
        }

        self.users.put(&User {
            token: token.clone(),
            registered_at: now,
            stats: ReputationStats::default(),
        })?;
        tracing::info!(user = %token, "user registered");
        Ok(())
    }

    /// Create the global totals record if it does not exist yet.
    pub fn ensure_totals(&self, now: Timestamp) -> Result<GlobalTotals, LedgerError> {
        if let Some(existing) = self.totals.get(GlobalTotals::KEY)? {
            tracing::debug!("global totals already present");
            return Ok(existing);
        }
        let totals = GlobalTotals::new(now);
        self.totals.put(&totals)?;
        tracing::info!("global totals created");
        Ok(totals)
    }

    /// Count a new trade for `token` on `role`.
    pub fn initialize_for_trade(
        &self,
        token: &UserToken,
        role: TradeRole,
    ) -> Result<User, LedgerError> {
        let mut user = self.users.require(token.as_str())?;
        user.stats.open_trade(role);
        self.users.put(&user)?;
        Ok(user)
    }

    /// Count a new trade in the global totals, on both roles.
    pub fn initialize_totals_for_trade(&self, now: Timestamp) -> Result<GlobalTotals, LedgerError> {
        let mut totals = self.ensure_totals(now)?;
        totals.stats.open_trade(TradeRole::Seller);
        totals.stats.open_trade(TradeRole::Buyer);
        self.totals.put(&totals)?;
        Ok(totals)
    }

    /// Fold a revealed score into `token`'s statistics.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidScore`] unless `scores` has exactly three
    /// elements, [`LedgerError::NotFound`] if the user is absent.
    pub fn apply_score(
        &self,
        token: &UserToken,
        scores: &[i64],
        role: ReceivedRole,
    ) -> Result<User, LedgerError> {
        let triple = score_from(scores)?;
        let mut user = self.users.require(token.as_str())?;
        user.stats.accumulate(&triple, role);
        self.users.put(&user)?;
        tracing::debug!(user = %token, %role, "score applied");
        Ok(user)
    }

    /// Fold one trade's revealed pair into the global totals.
    pub fn apply_totals(
        &self,
        sell_scores: &[i64],
        buy_scores: &[i64],
        now: Timestamp,
    ) -> Result<GlobalTotals, LedgerError> {
        let sell = score_from(sell_scores)?;
        let buy = score_from(buy_scores)?;
        let mut totals = self.ensure_totals(now)?;
        totals.stats.accumulate(&sell, ReceivedRole::SellerReceived);
        totals.stats.accumulate(&buy, ReceivedRole::BuyerReceived);
        self.totals.put(&totals)?;
        Ok(totals)
    }

    /// Read a registered user.
    pub fn get(&self, token: &UserToken) -> Result<User, LedgerError> {
        self.users.require(token.as_str())
    }

    /// Read the global totals.
    pub fn totals(&self) -> Result<GlobalTotals, LedgerError> {
        self.totals.require(GlobalTotals::KEY)
    }
}
