//! Shared fixtures for unit tests.

use teval_core::{ScoreTriple, ServiceCode, Timestamp, TradeId, UserToken};
use teval_crypto::AesGcmCipher;
use teval_store::MemoryStore;

use crate::error::LedgerError;
use crate::escrow::{ScoreEscrow, ScoreEscrowLedger};
use crate::properties::{Properties, PropertiesStore};
use crate::trade::{Trade, TradeLedger};
use crate::user::UserLedger;

/// Creation time of the fixture trade.
pub const SEED: &str = "2026-10-19T08:00:00.000000001Z";

pub fn ts(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

pub fn token(s: &str) -> UserToken {
    UserToken::new(s).unwrap()
}

/// Store with demo properties, users A, B and C, and trade T1 (A sells
/// to B under "SVC") created at [`SEED`].
pub struct Fixture {
    pub store: MemoryStore,
    pub trade_id: TradeId,
}

pub fn fixture() -> Fixture {
    let store = MemoryStore::new();
    PropertiesStore::new(&store)
        .initialize(Properties::demo())
        .unwrap();
    let users = UserLedger::new(&store);
    users.ensure_totals(ts(SEED)).unwrap();
    for name in ["A", "B", "C"] {
        users.register(&token(name), ts(SEED)).unwrap();
    }
    let trade_id = TradeId::new("T1").unwrap();
    TradeLedger::new(&store)
        .create(
            &trade_id,
            &ServiceCode::new("SVC").unwrap(),
            &token("A"),
            &token("B"),
            ts(SEED),
        )
        .unwrap();
    Fixture { store, trade_id }
}

impl Fixture {
    pub fn users(&self) -> UserLedger<'_, MemoryStore> {
        UserLedger::new(&self.store)
    }

    pub fn trades(&self) -> TradeLedger<'_, MemoryStore> {
        TradeLedger::new(&self.store)
    }

    pub fn escrows(&self) -> ScoreEscrowLedger<'_, MemoryStore> {
        ScoreEscrowLedger::new(&self.store)
    }

    pub fn trade(&self) -> Trade {
        self.trades().get(&self.trade_id).unwrap()
    }

    /// Submit `score` from `caller` on T1 with passphrase "secret" at [`SEED`].
    pub fn submit(&self, caller: &str, score: [i64; 3]) -> Result<ScoreEscrow, LedgerError> {
        self.escrows().submit(
            &AesGcmCipher,
            &self.trade_id,
            &token(caller),
            &ScoreTriple::new(score),
            "secret",
            ts(SEED),
        )
    }
}
