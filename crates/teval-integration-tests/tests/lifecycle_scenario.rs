//! # Trade Lifecycle Scenarios
//!
//! End-to-end flows through the `EvaluationLedger` surface: creation,
//! sealed submission, reveal, aggregation, and the failure paths that
//! must leave state untouched.

use std::sync::Arc;

use teval_core::{ScoreTriple, ServiceCode, Timestamp, TradeId, UserToken};
use teval_crypto::{AesGcmCipher, Nonce, ScoreCipher};
use teval_ledger::{
    Clock, EscrowPhase, EvaluationLedger, LedgerConfig, LedgerError, ManualClock, RecordKind,
};
use teval_store::MemoryStore;

const START: &str = "2026-10-19T08:00:00.000000123Z";

fn start() -> Timestamp {
    Timestamp::parse(START).unwrap()
}

fn token(s: &str) -> UserToken {
    UserToken::new(s).unwrap()
}

fn trade_id(s: &str) -> TradeId {
    TradeId::new(s).unwrap()
}

fn svc() -> ServiceCode {
    ServiceCode::new("SVC").unwrap()
}

/// Ledger with demo durations, a manual clock at [`START`], and users A, B, C.
fn setup() -> (EvaluationLedger<MemoryStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let ledger =
        EvaluationLedger::new(MemoryStore::new(), LedgerConfig::demo()).with_clock(clock.clone());
    ledger.init().unwrap();
    for name in ["A", "B", "C"] {
        ledger.register_user(&token(name)).unwrap();
    }
    (ledger, clock)
}

fn open_trade(ledger: &EvaluationLedger<MemoryStore>, id: &str) -> TradeId {
    let id = trade_id(id);
    ledger
        .create_trade(&id, &svc(), &token("A"), &token("B"))
        .unwrap();
    id
}

// ---------------------------------------------------------------------------
// Reference scenario
// ---------------------------------------------------------------------------

#[test]
fn reference_scenario() {
    let (ledger, _) = setup();
    let t1 = open_trade(&ledger, "T1");

    ledger
        .submit_score(&t1, &token("A"), &ScoreTriple::new([5, 5, 5]), "secret")
        .unwrap();
    let escrow = ledger.get_escrow(&t1).unwrap();
    assert!(escrow.buyer_received.is_some());
    assert!(escrow.seller_received.is_none());

    ledger
        .submit_score(&t1, &token("B"), &ScoreTriple::new([4, 4, 4]), "secret")
        .unwrap();
    let escrow = ledger.get_escrow(&t1).unwrap();
    assert!(escrow.seller_received.is_some());
    assert_eq!(escrow.phase(), EscrowPhase::BothSubmitted);

    ledger.reveal_score(&t1, "secret").unwrap();

    let trade = ledger.get_trade(&t1).unwrap();
    assert_eq!(trade.score.sell, vec![4, 4, 4]);
    assert_eq!(trade.score.buy, vec![5, 5, 5]);
    assert!(matches!(
        ledger.get_escrow(&t1),
        Err(LedgerError::NotFound {
            kind: RecordKind::ScoreEscrow,
            ..
        })
    ));

    // Seller-received [4,4,4] lands in A's sell bucket, buyer-received
    // [5,5,5] in B's buy bucket.
    let a = ledger.get_user(&token("A")).unwrap();
    assert_eq!(a.stats.sell.total, 12);
    assert_eq!(a.stats.sell.per_question, [4, 4, 4]);
    assert_eq!(a.stats.buy.total, 0);
    assert_eq!(a.stats.trade.total, 12);
    assert_eq!(a.stats.pending_sell, 0);

    let b = ledger.get_user(&token("B")).unwrap();
    assert_eq!(b.stats.buy.total, 15);
    assert_eq!(b.stats.buy.per_question, [5, 5, 5]);
    assert_eq!(b.stats.pending_buy, 0);

    let totals = ledger.get_totals().unwrap();
    assert_eq!(totals.stats.sell.total, 12);
    assert_eq!(totals.stats.buy.total, 15);
    assert_eq!(totals.stats.trade.total, 27);
    assert!(totals.stats.is_balanced());
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[test]
fn created_trade_has_one_empty_escrow() {
    let (ledger, _) = setup();
    let t1 = open_trade(&ledger, "T1");
    let escrow = ledger.get_escrow(&t1).unwrap();
    assert_eq!(escrow.trade_id, t1);
    assert!(escrow.seller_received.is_none());
    assert!(escrow.buyer_received.is_none());
    assert_eq!(escrow.phase(), EscrowPhase::Open);
}

#[test]
fn trade_nonce_is_fixed_at_creation() {
    let (ledger, clock) = setup();
    let t1 = open_trade(&ledger, "T1");
    clock.advance(3600).unwrap();
    let trade = ledger.get_trade(&t1).unwrap();
    assert_eq!(trade.created_at, start());
    assert_eq!(trade.nonce, Nonce::derive(&start()));
    assert_eq!(ledger.get_escrow(&t1).unwrap().nonce, trade.nonce);
}

#[test]
fn duplicate_create_conflicts_and_leaves_original() {
    let (ledger, clock) = setup();
    let t1 = open_trade(&ledger, "T1");
    let original = ledger.get_trade(&t1).unwrap();
    clock.advance(5).unwrap();

    let err = ledger
        .create_trade(&t1, &ServiceCode::new("OTHER").unwrap(), &token("C"), &token("A"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict { .. }));
    assert_eq!(ledger.get_trade(&t1).unwrap(), original);
    assert_eq!(ledger.get_user(&token("C")).unwrap().stats.sell_count, 0);
}

#[test]
fn unregistered_party_is_not_found() {
    let (ledger, _) = setup();
    let err = ledger
        .create_trade(&trade_id("T1"), &svc(), &token("A"), &token("nobody"))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::NotFound {
            kind: RecordKind::User,
            ..
        }
    ));
    assert!(ledger.get_trade(&trade_id("T1")).is_err());
    assert!(ledger.get_escrow(&trade_id("T1")).is_err());
}

// ---------------------------------------------------------------------------
// Submission and reveal timing
// ---------------------------------------------------------------------------

#[test]
fn stranger_submission_is_forbidden() {
    let (ledger, _) = setup();
    let t1 = open_trade(&ledger, "T1");
    let before = ledger.get_escrow(&t1).unwrap();
    let err = ledger
        .submit_score(&t1, &token("C"), &ScoreTriple::new([1, 1, 1]), "secret")
        .unwrap_err();
    assert!(matches!(err, LedgerError::Forbidden { .. }));
    assert_eq!(ledger.get_escrow(&t1).unwrap(), before);
}

#[test]
fn reveal_time_follows_second_submission() {
    let (ledger, clock) = setup();
    let t1 = open_trade(&ledger, "T1");

    clock.advance(100).unwrap();
    ledger
        .submit_score(&t1, &token("B"), &ScoreTriple::new([2, 2, 2]), "k")
        .unwrap();
    assert!(ledger.get_escrow(&t1).unwrap().reveal_after.is_none());

    clock.advance(50).unwrap();
    let submitted = clock.now();
    ledger
        .submit_score(&t1, &token("A"), &ScoreTriple::new([3, 3, 3]), "k")
        .unwrap();
    let delay = ledger.get_properties().unwrap().reveal_delay;
    assert_eq!(
        ledger.get_escrow(&t1).unwrap().reveal_after,
        Some(submitted.plus_secs(delay).unwrap())
    );
}

#[test]
fn closing_by_both_sets_evaluation_deadline() {
    let (ledger, clock) = setup();
    let t1 = open_trade(&ledger, "T1");

    ledger.close_trade(&t1, &token("B")).unwrap();
    assert!(ledger.get_escrow(&t1).unwrap().reveal_after.is_none());

    clock.advance(60).unwrap();
    let closed = clock.now();
    let trade = ledger.close_trade(&t1, &token("A")).unwrap();
    assert!(trade.closing.both_closed());
    assert_eq!(trade.closing.seller_closed_at, Some(closed));

    let wait = ledger.get_properties().unwrap().evaluation_wait;
    assert_eq!(
        ledger.get_escrow(&t1).unwrap().reveal_after,
        Some(closed.plus_secs(wait).unwrap())
    );
}

#[test]
fn silent_buyer_is_swept_and_defaults_to_zero() {
    let (ledger, clock) = setup();
    let t1 = open_trade(&ledger, "T1");
    ledger
        .submit_score(&t1, &token("A"), &ScoreTriple::new([3, 4, 5]), "secret")
        .unwrap();
    ledger.close_trade(&t1, &token("A")).unwrap();
    ledger.close_trade(&t1, &token("B")).unwrap();

    assert!(ledger.due_escrows().unwrap().is_empty());
    clock.advance(ledger.get_properties().unwrap().evaluation_wait).unwrap();
    let due = ledger.due_escrows().unwrap();
    assert_eq!(due.len(), 1);
    ledger.mark_escrow_expired(&t1).unwrap();

    let trade = ledger.reveal_score(&t1, "secret").unwrap();
    assert_eq!(trade.score.sell, vec![0, 0, 0]);
    assert_eq!(trade.score.buy, vec![3, 4, 5]);

    let a = ledger.get_user(&token("A")).unwrap();
    assert_eq!(a.stats.pending_sell, 1, "defaulted rating is not settled");
    let b = ledger.get_user(&token("B")).unwrap();
    assert_eq!(b.stats.pending_buy, 0);
    assert_eq!(b.stats.buy.total, 12);
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[test]
fn mismatched_passphrases_fail_reveal_without_writes() {
    let (ledger, _) = setup();
    let t1 = open_trade(&ledger, "T1");
    ledger
        .submit_score(&t1, &token("A"), &ScoreTriple::new([5, 5, 5]), "alpha")
        .unwrap();
    ledger
        .submit_score(&t1, &token("B"), &ScoreTriple::new([4, 4, 4]), "beta")
        .unwrap();

    for passphrase in ["alpha", "beta", "gamma"] {
        let err = ledger.reveal_score(&t1, passphrase).unwrap_err();
        assert!(matches!(err, LedgerError::AuthenticationFailed { .. }));
    }
    assert!(!ledger.get_trade(&t1).unwrap().is_finalized());
    assert!(ledger.get_escrow(&t1).is_ok());
    assert_eq!(ledger.get_totals().unwrap().stats.trade.total, 0);
}

#[test]
fn finalized_trade_rejects_further_activity() {
    let (ledger, _) = setup();
    let t1 = open_trade(&ledger, "T1");
    ledger.reveal_score(&t1, "secret").unwrap();

    assert!(matches!(
        ledger.reveal_score(&t1, "secret"),
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(
        ledger.submit_score(&t1, &token("A"), &ScoreTriple::new([1, 1, 1]), "secret"),
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(
        ledger.close_trade(&t1, &token("A")),
        Err(LedgerError::Conflict { .. })
    ));
}

#[test]
fn escrow_ciphertext_is_not_plaintext() {
    let (ledger, _) = setup();
    let t1 = open_trade(&ledger, "T1");
    let escrow = ledger
        .submit_score(&t1, &token("A"), &ScoreTriple::new([5, 5, 5]), "secret")
        .unwrap();
    let sealed = escrow.buyer_received.unwrap();
    assert_ne!(sealed.as_bytes(), b"[5,5,5]");

    let cipher = AesGcmCipher::new();
    let key = cipher.derive_key("secret");
    let opened = cipher.decrypt(&key, &escrow.nonce, &sealed).unwrap();
    assert_eq!(opened, b"[5,5,5]");
}

// ---------------------------------------------------------------------------
// Shared store
// ---------------------------------------------------------------------------

#[test]
fn ledgers_sharing_a_store_see_each_other() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(start()));
    let first =
        EvaluationLedger::new(store.clone(), LedgerConfig::demo()).with_clock(clock.clone());
    let second = EvaluationLedger::new(store, LedgerConfig::default()).with_clock(clock);

    first.init().unwrap();
    // The properties record already exists, so the second config is ignored.
    second.init().unwrap();
    assert_eq!(second.get_properties().unwrap().reveal_delay, 30);

    first.register_user(&token("A")).unwrap();
    first.register_user(&token("B")).unwrap();
    let t1 = trade_id("T1");
    first
        .create_trade(&t1, &svc(), &token("A"), &token("B"))
        .unwrap();
    second
        .submit_score(&t1, &token("B"), &ScoreTriple::new([1, 2, 3]), "s")
        .unwrap();
    let trade = first.reveal_score(&t1, "s").unwrap();
    assert_eq!(trade.score.sell, vec![1, 2, 3]);
}
