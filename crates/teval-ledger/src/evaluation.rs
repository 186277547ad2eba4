//! # Evaluation Engine
//!
//! Reveals a trade's escrowed ratings and folds them into permanent state:
//!
//! 1. look up the escrow and open both slots;
//! 2. finalize the trade (writes scores, deletes the escrow);
//! 3. apply the seller-received score to the seller;
//! 4. apply the buyer-received score to the buyer;
//! 5. apply both to the global totals.
//!
//! The steps are sequential store commits with no enclosing transaction. A
//! failure part-way leaves the earlier steps applied; the host's own
//! commit/rollback is the only backstop.

use teval_core::{Timestamp, TradeId};
use teval_crypto::ScoreCipher;
use teval_store::KeyedStore;

use crate::error::LedgerError;
use crate::escrow::ScoreEscrowLedger;
use crate::trade::{Trade, TradeLedger};
use crate::user::{ReceivedRole, UserLedger};

/// Orchestrates reveal and aggregation for one trade at a time.
pub struct EvaluationEngine<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    cipher: &'a C,
}

impl<'a, S: KeyedStore + ?Sized, C: ScoreCipher + ?Sized> EvaluationEngine<'a, S, C> {
    /// Bind to a store and cipher.
    pub fn new(store: &'a S, cipher: &'a C) -> Self {
        Self { store, cipher }
    }

    /// Reveal `trade_id`'s ratings, finalize the trade and update every
    /// affected aggregate.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if the trade has no escrow (already
    /// finalized or never created), plus anything the reveal, finalize or
    /// aggregate steps reject.
    pub fn evaluate_and_close(
        &self,
        trade_id: &TradeId,
        passphrase: &str,
        now: Timestamp,
    ) -> Result<Trade, LedgerError> {
        let escrows = ScoreEscrowLedger::new(self.store);
        let escrow = escrows.lookup(trade_id)?;
        let revealed = escrows.reveal(self.cipher, &escrow, passphrase)?;

        let sell = revealed.sell.values();
        let buy = revealed.buy.values();
        let trade = TradeLedger::new(self.store).finalize(trade_id, &sell, &buy)?;

        let users = UserLedger::new(self.store);
        users.apply_score(&trade.seller, &sell, ReceivedRole::SellerReceived)?;
        users.apply_score(&trade.buyer, &buy, ReceivedRole::BuyerReceived)?;
        users.apply_totals(&sell, &buy, now)?;

        tracing::info!(
            %trade_id,
            seller_defaulted = revealed.sell.is_defaulted(),
            buyer_defaulted = revealed.buy.is_defaulted(),
            "scores revealed"
        );
        Ok(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::ScoreEscrow;
    use crate::record::{RecordKind, Repository};
    use crate::test_support::{fixture, token, ts, SEED};
    use teval_crypto::AesGcmCipher;

    #[test]
    fn reveal_finalizes_and_aggregates() {
        let fx = fixture();
        fx.submit("A", [5, 5, 5]).unwrap();
        fx.submit("B", [4, 4, 4]).unwrap();

        let trade = EvaluationEngine::new(&fx.store, &AesGcmCipher)
            .evaluate_and_close(&fx.trade_id, "secret", ts(SEED))
            .unwrap();
        assert_eq!(trade.score.sell, vec![4, 4, 4]);
        assert_eq!(trade.score.buy, vec![5, 5, 5]);
        assert!(fx.escrows().lookup(&fx.trade_id).is_err());

        let a = fx.users().get(&token("A")).unwrap();
        assert_eq!(a.stats.sell.total, 12);
        assert_eq!(a.stats.pending_sell, 0);
        let b = fx.users().get(&token("B")).unwrap();
        assert_eq!(b.stats.buy.total, 15);
        assert_eq!(b.stats.pending_buy, 0);

        let totals = fx.users().totals().unwrap();
        assert_eq!(totals.stats.trade.total, 27);
        assert!(totals.stats.is_balanced());
    }

    #[test]
    fn silent_party_defaults_to_zero() {
        let fx = fixture();
        fx.submit("A", [2, 3, 4]).unwrap();
        let trade = EvaluationEngine::new(&fx.store, &AesGcmCipher)
            .evaluate_and_close(&fx.trade_id, "secret", ts(SEED))
            .unwrap();
        assert_eq!(trade.score.sell, vec![0, 0, 0]);
        assert_eq!(trade.score.buy, vec![2, 3, 4]);

        let a = fx.users().get(&token("A")).unwrap();
        assert_eq!(a.stats.sell.total, 0);
        assert_eq!(a.stats.pending_sell, 1);
        let b = fx.users().get(&token("B")).unwrap();
        assert_eq!(b.stats.pending_buy, 0);
    }

    #[test]
    fn wrong_passphrase_changes_nothing() {
        let fx = fixture();
        fx.submit("A", [5, 5, 5]).unwrap();
        fx.submit("B", [4, 4, 4]).unwrap();
        let err = EvaluationEngine::new(&fx.store, &AesGcmCipher)
            .evaluate_and_close(&fx.trade_id, "guess", ts(SEED))
            .unwrap_err();
        assert!(matches!(err, LedgerError::AuthenticationFailed { .. }));
        assert!(!fx.trade().is_finalized());
        assert!(fx.escrows().lookup(&fx.trade_id).is_ok());
    }

    #[test]
    fn out_of_range_sealed_score_is_rejected_before_finalizing() {
        let fx = fixture();
        fx.submit("A", [1, 1, 1]).unwrap();
        let mut escrow = fx.escrows().lookup(&fx.trade_id).unwrap();
        let cipher = AesGcmCipher;
        let key = cipher.derive_key("secret");
        escrow.seller_received = Some(
            cipher
                .encrypt(&key, &escrow.nonce, b"[9223372036854775807,1,0]")
                .unwrap(),
        );
        Repository::<'_, _, ScoreEscrow>::new(&fx.store)
            .put(&escrow)
            .unwrap();

        let err = EvaluationEngine::new(&fx.store, &cipher)
            .evaluate_and_close(&fx.trade_id, "secret", ts(SEED))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidScore { .. }), "{err:?}");
        assert!(!fx.trade().is_finalized());
        assert_eq!(fx.escrows().lookup(&fx.trade_id).unwrap(), escrow);
        assert_eq!(fx.users().get(&token("A")).unwrap().stats.pending_sell, 1);
        assert_eq!(fx.users().totals().unwrap().stats.trade.total, 0);
    }

    #[test]
    fn second_reveal_is_not_found() {
        let fx = fixture();
        let engine = EvaluationEngine::new(&fx.store, &AesGcmCipher);
        engine
            .evaluate_and_close(&fx.trade_id, "secret", ts(SEED))
            .unwrap();
        let err = engine
            .evaluate_and_close(&fx.trade_id, "secret", ts(SEED))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NotFound {
                kind: RecordKind::ScoreEscrow,
                ..
            }
        ));
    }
}
