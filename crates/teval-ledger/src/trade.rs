//! # Trade Ledger
//!
//! Owns the trade record: its parties, its two independent closing flags,
//! and the score pair written once at finalization.
//!
//! ## Creation
//!
//! Creating a trade is a small transaction script:
//!
//! 1. persist the trade;
//! 2. create its escrow, deleting the trade again if that fails;
//! 3. count the new trade for the seller, the buyer and the global totals.
//!
//! Each step is a separate store commit. Only step 2 has a compensating
//! action.
//!
//! ## Finalization
//!
//! A trade is finalized once both score arrays are non-empty. Finalized
//! trades are immutable: closing or finalizing again is a
//! [`LedgerError::Conflict`].

use serde::{Deserialize, Serialize};
use teval_core::{ScoreTriple, ServiceCode, Timestamp, TradeId, UserToken};
use teval_crypto::Nonce;
use teval_store::{KeyedStore, SortOrder};

use crate::error::LedgerError;
use crate::escrow::ScoreEscrowLedger;
use crate::properties::PropertiesStore;
use crate::record::{kind_at, RecordKind, Repository};
use crate::user::{TradeRole, UserLedger};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Per-party closing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Closing {
    /// Whether the seller has closed.
    pub seller_closed: bool,
    /// When the seller closed.
    pub seller_closed_at: Option<Timestamp>,
    /// Whether the buyer has closed.
    pub buyer_closed: bool,
    /// When the buyer closed.
    pub buyer_closed_at: Option<Timestamp>,
}

impl Closing {
    /// Whether `role` has closed.
    pub fn is_closed(&self, role: TradeRole) -> bool {
        match role {
            TradeRole::Seller => self.seller_closed,
            TradeRole::Buyer => self.buyer_closed,
        }
    }

    /// Whether both parties have closed.
    pub fn both_closed(&self) -> bool {
        self.seller_closed && self.buyer_closed
    }

    fn close(&mut self, role: TradeRole, at: Timestamp) {
        match role {
            TradeRole::Seller => {
                self.seller_closed = true;
                self.seller_closed_at = Some(at);
            }
            TradeRole::Buyer => {
                self.buyer_closed = true;
                self.buyer_closed_at = Some(at);
            }
        }
    }
}

/// The revealed score pair, empty until finalization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TradeScore {
    /// Rating received by the seller.
    pub sell: Vec<i64>,
    /// Rating received by the buyer.
    pub buy: Vec<i64>,
}

/// A trade between two registered users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Caller-chosen identifier, also the store key.
    pub trade_id: TradeId,
    /// Service the trade was made under.
    pub service_code: ServiceCode,
    /// Selling party.
    pub seller: UserToken,
    /// Buying party.
    pub buyer: UserToken,
    /// Creation time.
    pub created_at: Timestamp,
    /// Escrow nonce, derived once from `created_at`.
    pub nonce: Nonce,
    /// Closing state of both parties.
    pub closing: Closing,
    /// Revealed scores.
    pub score: TradeScore,
}

impl Trade {
    /// A new, open trade created at `created_at`.
    pub fn new(
        trade_id: TradeId,
        service_code: ServiceCode,
        seller: UserToken,
        buyer: UserToken,
        created_at: Timestamp,
    ) -> Self {
        Self {
            trade_id,
            service_code,
            seller,
            buyer,
            nonce: Nonce::derive(&created_at),
            created_at,
            closing: Closing::default(),
            score: TradeScore::default(),
        }
    }

    /// The role `token` plays in this trade, if any.
    pub fn role_of(&self, token: &UserToken) -> Option<TradeRole> {
        if *token == self.seller {
            Some(TradeRole::Seller)
        } else if *token == self.buyer {
            Some(TradeRole::Buyer)
        } else {
            None
        }
    }

    /// Whether both score arrays have been written.
    pub fn is_finalized(&self) -> bool {
        !self.score.sell.is_empty() && !self.score.buy.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Filters, ordering and paging for trade queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeQuery {
    /// Only trades sold by this user.
    pub seller: Option<UserToken>,
    /// Only trades bought by this user.
    pub buyer: Option<UserToken>,
    /// Only trades under this service.
    pub service_code: Option<ServiceCode>,
    /// Order by creation time. Newest first by default.
    pub order: SortOrder,
    /// Page size; `None` returns every match.
    pub page_size: Option<usize>,
    /// Continuation from a previous page.
    pub bookmark: Option<String>,
}

impl TradeQuery {
    /// Match every trade.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to trades sold by `seller`.
    pub fn seller(mut self, seller: UserToken) -> Self {
        self.seller = Some(seller);
        self
    }

    /// Restrict to trades bought by `buyer`.
    pub fn buyer(mut self, buyer: UserToken) -> Self {
        self.buyer = Some(buyer);
        self
    }

    /// Restrict to trades under `service_code`.
    pub fn service(mut self, service_code: ServiceCode) -> Self {
        self.service_code = Some(service_code);
        self
    }

    /// Set the creation-time ordering.
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Return pages of `page_size`, continuing after `bookmark`.
    pub fn paged(mut self, page_size: usize, bookmark: Option<String>) -> Self {
        self.page_size = Some(page_size);
        self.bookmark = bookmark;
        self
    }
}

/// Result of a trade query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePage {
    /// Matching trades in result order.
    pub records: Vec<Trade>,
    /// Continuation for the next page, if there is one.
    pub bookmark: Option<String>,
    /// Number of records in this page.
    pub fetched: usize,
}

// ---------------------------------------------------------------------------
// TradeLedger
// ---------------------------------------------------------------------------

/// Trade operations over a keyed store.
pub struct TradeLedger<'a, S: ?Sized> {
    store: &'a S,
    trades: Repository<'a, S, Trade>,
}

impl<'a, S: KeyedStore + ?Sized> TradeLedger<'a, S> {
    /// Bind to a store.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            trades: Repository::new(store),
        }
    }

    /// Create a trade and its escrow, then count it for both parties and
    /// the global totals.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Conflict`] if `trade_id` is taken,
    /// [`LedgerError::NotFound`] if either party is unregistered. If escrow
    /// creation fails, the trade is deleted again and the escrow error is
    /// returned; if that delete fails too, [`LedgerError::RollbackFailed`]
    /// names both failures.
    pub fn create(
        &self,
        trade_id: &TradeId,
        service_code: &ServiceCode,
        seller: &UserToken,
        buyer: &UserToken,
        now: Timestamp,
    ) -> Result<Trade, LedgerError> {
        if let Some(kind) = kind_at(self.store, trade_id.as_str())? {
            let reason = match kind {
                RecordKind::Trade => "trade already exists".to_string(),
                other => format!("key is in use by a {other} record"),
            };
            return Err(LedgerError::Conflict {
                kind: RecordKind::Trade,
                key: trade_id.to_string(),
                reason,
            });
        }

        let users = UserLedger::new(self.store);
        users.get(seller)?;
        users.get(buyer)?;

        let trade = Trade::new(
            trade_id.clone(),
            service_code.clone(),
            seller.clone(),
            buyer.clone(),
            now,
        );
        self.trades.put(&trade)?;

        if let Err(escrow_err) = ScoreEscrowLedger::new(self.store).create(&trade) {
            tracing::warn!(%trade_id, error = %escrow_err, "escrow creation failed, rolling back trade");
            if let Err(rollback_err) = self.trades.delete(trade_id.as_str()) {
                tracing::error!(%trade_id, error = %rollback_err, "trade rollback failed");
                return Err(LedgerError::RollbackFailed {
                    trade_id: trade_id.to_string(),
                    cause: escrow_err.to_string(),
                    rollback: rollback_err.to_string(),
                });
            }
            return Err(escrow_err);
        }

        users.initialize_for_trade(seller, TradeRole::Seller)?;
        users.initialize_for_trade(buyer, TradeRole::Buyer)?;
        users.initialize_totals_for_trade(now)?;

        tracing::info!(%trade_id, %seller, %buyer, service = %service_code, "trade created");
        Ok(trade)
    }

    /// Record that `caller` has closed the trade.
    ///
    /// Closing twice from the same side is a no-op. When this call makes
    /// both sides closed, the escrow's reveal time becomes `now` plus the
    /// configured evaluation wait.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`], [`LedgerError::Forbidden`] for a
    /// non-party, [`LedgerError::Conflict`] once finalized.
    pub fn close(
        &self,
        trade_id: &TradeId,
        caller: &UserToken,
        now: Timestamp,
    ) -> Result<Trade, LedgerError> {
        let mut trade = self.trades.require(trade_id.as_str())?;
        let role = trade.role_of(caller).ok_or_else(|| LedgerError::Forbidden {
            trade_id: trade_id.to_string(),
            caller: caller.to_string(),
        })?;
        if trade.is_finalized() {
            return Err(LedgerError::Conflict {
                kind: RecordKind::Trade,
                key: trade_id.to_string(),
                reason: "trade is already finalized".to_string(),
            });
        }
        if trade.closing.is_closed(role) {
            tracing::debug!(%trade_id, %role, "trade already closed by this party");
            return Ok(trade);
        }

        trade.closing.close(role, now);
        if trade.closing.both_closed() {
            let wait = PropertiesStore::new(self.store).get()?.evaluation_wait;
            let reveal_after = now.plus_secs(wait)?;
            let escrows = ScoreEscrowLedger::new(self.store);
            escrows.lookup(trade_id)?;
            self.trades.put(&trade)?;
            escrows.schedule_reveal(trade_id, reveal_after)?;
            tracing::info!(%trade_id, %reveal_after, "trade closed by both parties");
        } else {
            self.trades.put(&trade)?;
            tracing::info!(%trade_id, %role, "trade closed");
        }
        Ok(trade)
    }

    /// Write the revealed scores and delete the trade's escrow.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if the trade or its escrow is absent,
    /// [`LedgerError::Conflict`] if already finalized,
    /// [`LedgerError::InvalidScore`] unless both arrays hold three values.
    pub fn finalize(
        &self,
        trade_id: &TradeId,
        sell_scores: &[i64],
        buy_scores: &[i64],
    ) -> Result<Trade, LedgerError> {
        let mut trade = self.trades.require(trade_id.as_str())?;
        if trade.is_finalized() {
            return Err(LedgerError::Conflict {
                kind: RecordKind::Trade,
                key: trade_id.to_string(),
                reason: "trade is already finalized".to_string(),
            });
        }
        let sell = ScoreTriple::from_slice(sell_scores).map_err(LedgerError::invalid_score)?;
        let buy = ScoreTriple::from_slice(buy_scores).map_err(LedgerError::invalid_score)?;

        let escrows = ScoreEscrowLedger::new(self.store);
        let escrow = escrows.lookup(trade_id)?;

        trade.score = TradeScore {
            sell: sell.into(),
            buy: buy.into(),
        };
        self.trades.put(&trade)?;
        escrows.remove(&escrow)?;
        tracing::info!(%trade_id, "trade finalized");
        Ok(trade)
    }

    /// Read a trade.
    pub fn get(&self, trade_id: &TradeId) -> Result<Trade, LedgerError> {
        self.trades.require(trade_id.as_str())
    }

    /// Trades matching `query`, ordered by creation time.
    pub fn query(&self, query: &TradeQuery) -> Result<TradePage, LedgerError> {
        let mut selector = self.trades.selector();
        if let Some(seller) = &query.seller {
            selector = selector.eq("seller", seller.as_str());
        }
        if let Some(buyer) = &query.buyer {
            selector = selector.eq("buyer", buyer.as_str());
        }
        if let Some(service) = &query.service_code {
            selector = selector.eq("service_code", service.as_str());
        }
        let selector = selector.sort_by("created_at", query.order);

        let (records, bookmark) = match query.page_size {
            Some(size) => self
                .trades
                .query_paged(&selector, size, query.bookmark.as_deref())?,
            None => (self.trades.query(&selector)?, None),
        };
        let fetched = records.len();
        tracing::debug!(fetched, order = %query.order, "trade query");
        Ok(TradePage {
            records,
            bookmark,
            fetched,
        })
    }
}
