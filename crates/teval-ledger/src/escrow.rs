//! # Score Escrow
//!
//! Each open trade has exactly one [`ScoreEscrow`] holding the two sealed
//! ratings until they are revealed together.
//!
//! ## State Machine
//!
//! ```text
//!   Open ──(second slot filled)──▶ BothSubmitted ──(reveal)──▶ Finalized
//!   0 or 1 slot                    reveal_after set            record deleted
//! ```
//!
//! ## Slot Mapping
//!
//! Slots are named for who *receives* the rating. The seller rates the
//! buyer, so the seller's submission lands in `buyer_received`, and the
//! buyer's submission lands in `seller_received`.
//!
//! ## Sealing
//!
//! The plaintext is the bracketed score text (`"[3,4,5]"`), sealed under
//! the key derived from the submitter's passphrase and the nonce fixed at
//! trade creation. Both parties are expected to agree on the passphrase out
//! of band; the escrow cannot check that they did, and a mismatch only
//! shows up as an authentication failure at reveal.
//!
//! ## Lookup
//!
//! Escrows are always located by a `trade_id` query, never by key. More
//! than one match means corrupted state and fails with
//! [`LedgerError::Inconsistent`].

use serde::{Deserialize, Serialize};
use teval_core::{ScoreTriple, Timestamp, TradeId, UserToken};
use teval_crypto::{Ciphertext, CryptoError, Nonce, ScoreCipher};
use teval_store::KeyedStore;

use crate::error::LedgerError;
use crate::properties::PropertiesStore;
use crate::record::{kind_at, RecordKind, Repository};
use crate::trade::Trade;
use crate::user::TradeRole;

/// Phase of a live escrow record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowPhase {
    /// Zero or one rating submitted.
    Open,
    /// Both ratings submitted; reveal scheduled.
    BothSubmitted,
}

impl EscrowPhase {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::BothSubmitted => "both_submitted",
        }
    }
}

impl std::fmt::Display for EscrowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temporary holding record for a trade's two sealed ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEscrow {
    /// Store key (`<tradeId>_ScoreTemp`).
    pub escrow_key: String,
    /// The owning trade.
    pub trade_id: TradeId,
    /// Nonce copied from the trade at creation.
    pub nonce: Nonce,
    /// Sealed rating received by the seller (submitted by the buyer).
    pub seller_received: Option<Ciphertext>,
    /// Sealed rating received by the buyer (submitted by the seller).
    pub buyer_received: Option<Ciphertext>,
    /// Earliest time the reveal is meant to run.
    pub reveal_after: Option<Timestamp>,
    /// Set by the sweep once `reveal_after` has passed.
    pub expired: bool,
}

impl ScoreEscrow {
    /// Suffix appended to the trade id to form the store key.
    pub const KEY_SUFFIX: &'static str = "_ScoreTemp";

    /// Store key of the escrow owned by `trade_id`.
    pub fn key_for(trade_id: &TradeId) -> String {
        format!("{trade_id}{}", Self::KEY_SUFFIX)
    }

    /// Empty escrow for a freshly created trade.
    pub fn for_trade(trade: &Trade) -> Self {
        Self {
            escrow_key: Self::key_for(&trade.trade_id),
            trade_id: trade.trade_id.clone(),
            nonce: trade.nonce,
            seller_received: None,
            buyer_received: None,
            reveal_after: None,
            expired: false,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> EscrowPhase {
        if self.seller_received.is_some() && self.buyer_received.is_some() {
            EscrowPhase::BothSubmitted
        } else {
            EscrowPhase::Open
        }
    }

    /// Whether the reveal-eligibility time has passed and the sweep has not
    /// marked this escrow yet.
    pub fn is_due(&self, now: Timestamp) -> bool {
        !self.expired && self.reveal_after.is_some_and(|at| at <= now)
    }
}

/// Both revealed ratings of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealedScores {
    /// Rating received by the seller.
    pub sell: ScoreTriple,
    /// Rating received by the buyer.
    pub buy: ScoreTriple,
}

/// Score escrow operations over a keyed store.
pub struct ScoreEscrowLedger<'a, S: ?Sized> {
    store: &'a S,
    escrows: Repository<'a, S, ScoreEscrow>,
    trades: Repository<'a, S, Trade>,
}

impl<'a, S: KeyedStore + ?Sized> ScoreEscrowLedger<'a, S> {
    /// Bind to a store.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            escrows: Repository::new(store),
            trades: Repository::new(store),
        }
    }

    /// Create the empty escrow for `trade`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Conflict`] if the escrow key is already in use.
    pub fn create(&self, trade: &Trade) -> Result<ScoreEscrow, LedgerError> {
        let escrow = ScoreEscrow::for_trade(trade);
        if let Some(kind) = kind_at(self.store, &escrow.escrow_key)? {
            return Err(LedgerError::Conflict {
                kind: RecordKind::ScoreEscrow,
                key: escrow.escrow_key,
                reason: format!("key is already in use by a {kind} record"),
            });
        }
        self.escrows.put(&escrow)?;
        tracing::debug!(trade_id = %trade.trade_id, "escrow created");
        Ok(escrow)
    }

    /// The escrow owned by `trade_id`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] when no escrow matches,
    /// [`LedgerError::Inconsistent`] when more than one does.
    pub fn lookup(&self, trade_id: &TradeId) -> Result<ScoreEscrow, LedgerError> {
        let selector = self.escrows.selector().eq("trade_id", trade_id.as_str());
        let mut matches = self.escrows.query(&selector)?;
        match matches.len() {
            0 => Err(LedgerError::NotFound {
                kind: RecordKind::ScoreEscrow,
                key: trade_id.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            n => {
                tracing::warn!(%trade_id, matches = n, "more than one escrow matches trade");
                Err(LedgerError::Inconsistent {
                    trade_id: trade_id.to_string(),
                    matches: n,
                })
            }
        }
    }

    /// Seal `score` from `caller` into the slot of the party being rated.
    ///
    /// When both slots are filled after this write, `reveal_after` becomes
    /// `now` plus the configured reveal delay.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] for an unknown trade (or one already
    /// finalized), [`LedgerError::Forbidden`] if `caller` is not a party,
    /// [`LedgerError::InvalidScore`] for a value outside the score range.
    pub fn submit<C: ScoreCipher + ?Sized>(
        &self,
        cipher: &C,
        trade_id: &TradeId,
        caller: &UserToken,
        score: &ScoreTriple,
        passphrase: &str,
        now: Timestamp,
    ) -> Result<ScoreEscrow, LedgerError> {
        let trade = self.trades.require(trade_id.as_str())?;
        let role = trade.role_of(caller).ok_or_else(|| LedgerError::Forbidden {
            trade_id: trade_id.to_string(),
            caller: caller.to_string(),
        })?;
        score.validate().map_err(LedgerError::invalid_score)?;
        let mut escrow = self.lookup(trade_id)?;

        let key = cipher.derive_key(passphrase);
        let sealed = cipher.encrypt(&key, &escrow.nonce, score.to_text().as_bytes())?;
        match role {
            TradeRole::Seller => escrow.buyer_received = Some(sealed),
            TradeRole::Buyer => escrow.seller_received = Some(sealed),
        }

        if escrow.phase() == EscrowPhase::BothSubmitted {
            let delay = PropertiesStore::new(self.store).get()?.reveal_delay;
            let reveal_after = now.plus_secs(delay)?;
            escrow.reveal_after = Some(reveal_after);
            tracing::info!(%trade_id, %reveal_after, "both scores submitted");
        } else {
            tracing::debug!(%trade_id, %role, "score submitted");
        }

        self.escrows.put(&escrow)?;
        Ok(escrow)
    }

    /// Open both slots with the key derived from `passphrase`.
    ///
    /// An empty slot reveals as the defaulted all-zero rating.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AuthenticationFailed`] if either slot does not verify,
    /// [`LedgerError::InvalidScore`] if a plaintext is not three integers.
    pub fn reveal<C: ScoreCipher + ?Sized>(
        &self,
        cipher: &C,
        escrow: &ScoreEscrow,
        passphrase: &str,
    ) -> Result<RevealedScores, LedgerError> {
        let key = cipher.derive_key(passphrase);
        let open = |slot: &Option<Ciphertext>| -> Result<ScoreTriple, LedgerError> {
            let Some(sealed) = slot else {
                return Ok(ScoreTriple::DEFAULTED);
            };
            let plain = cipher
                .decrypt(&key, &escrow.nonce, sealed)
                .map_err(|e| match e {
                    CryptoError::AuthenticationFailed => LedgerError::AuthenticationFailed {
                        trade_id: escrow.trade_id.to_string(),
                    },
                    other => LedgerError::Crypto(other),
                })?;
            let text = String::from_utf8(plain).map_err(|_| LedgerError::InvalidScore {
                reason: "revealed score is not UTF-8".to_string(),
            })?;
            ScoreTriple::parse(&text).map_err(LedgerError::invalid_score)
        };

        Ok(RevealedScores {
            sell: open(&escrow.seller_received)?,
            buy: open(&escrow.buyer_received)?,
        })
    }

    /// Set the reveal-eligibility time of `trade_id`'s escrow.
    pub fn schedule_reveal(
        &self,
        trade_id: &TradeId,
        at: Timestamp,
    ) -> Result<ScoreEscrow, LedgerError> {
        let mut escrow = self.lookup(trade_id)?;
        escrow.reveal_after = Some(at);
        self.escrows.put(&escrow)?;
        Ok(escrow)
    }

    /// Delete an escrow record.
    pub fn remove(&self, escrow: &ScoreEscrow) -> Result<(), LedgerError> {
        self.escrows.delete(&escrow.escrow_key)?;
        tracing::debug!(trade_id = %escrow.trade_id, "escrow removed");
        Ok(())
    }

    /// Escrows whose reveal time has passed and that are not yet marked
    /// expired, oldest deadline first.
    pub fn due(&self, now: Timestamp) -> Result<Vec<ScoreEscrow>, LedgerError> {
        let mut due: Vec<ScoreEscrow> = self
            .escrows
            .query(&self.escrows.selector())?
            .into_iter()
            .filter(|e| e.is_due(now))
            .collect();
        due.sort_by(|a, b| a.reveal_after.cmp(&b.reveal_after));
        Ok(due)
    }

    /// Mark `trade_id`'s escrow expired. Marking twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Conflict`] if the reveal time has not passed yet.
    pub fn mark_expired(
        &self,
        trade_id: &TradeId,
        now: Timestamp,
    ) -> Result<ScoreEscrow, LedgerError> {
        let mut escrow = self.lookup(trade_id)?;
        if escrow.expired {
            tracing::debug!(%trade_id, "escrow already marked expired");
            return Ok(escrow);
        }
        if !escrow.is_due(now) {
            return Err(LedgerError::Conflict {
                kind: RecordKind::ScoreEscrow,
                key: escrow.escrow_key,
                reason: "reveal time has not passed".to_string(),
            });
        }
        escrow.expired = true;
        self.escrows.put(&escrow)?;
        tracing::info!(%trade_id, "escrow marked expired");
        Ok(escrow)
    }
}
