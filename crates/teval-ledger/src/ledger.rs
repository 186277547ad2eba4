//! # Evaluation Ledger
//!
//! [`EvaluationLedger`] is the operation surface a host drives. It owns the
//! store, the cipher and the clock, and delegates each operation to the
//! component that owns the affected records.

use std::sync::Arc;

use teval_core::{ScoreTriple, ServiceCode, TradeId, UserToken};
use teval_crypto::{AesGcmCipher, ScoreCipher};
use teval_store::KeyedStore;

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::escrow::{ScoreEscrow, ScoreEscrowLedger};
use crate::evaluation::EvaluationEngine;
use crate::properties::{Properties, PropertiesStore};
use crate::trade::{Trade, TradeLedger, TradePage, TradeQuery};
use crate::user::{GlobalTotals, User, UserLedger};

/// The ledger's operation surface.
pub struct EvaluationLedger<S, C = AesGcmCipher> {
    store: S,
    cipher: C,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl<S: KeyedStore> EvaluationLedger<S, AesGcmCipher> {
    /// A ledger over `store` using AES-256-GCM and the system clock.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self::with_cipher(store, AesGcmCipher::new(), config)
    }
}

impl<S: KeyedStore, C: ScoreCipher> EvaluationLedger<S, C> {
    /// A ledger with a custom cipher.
    pub fn with_cipher(store: S, cipher: C, config: LedgerConfig) -> Self {
        Self {
            store,
            cipher,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration this ledger was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn users(&self) -> UserLedger<'_, S> {
        UserLedger::new(&self.store)
    }

    fn trades(&self) -> TradeLedger<'_, S> {
        TradeLedger::new(&self.store)
    }

    fn escrows(&self) -> ScoreEscrowLedger<'_, S> {
        ScoreEscrowLedger::new(&self.store)
    }

    fn properties(&self) -> PropertiesStore<'_, S> {
        PropertiesStore::new(&self.store)
    }

    // -- Administration -------------------------------------------------------

    /// Seed the properties record from the configuration (if absent) and
    /// ensure the global totals exist. Safe to call repeatedly.
    pub fn init(&self) -> Result<Properties, LedgerError> {
        let props = self.properties().initialize(self.config.to_properties())?;
        self.users().ensure_totals(self.clock.now())?;
        Ok(props)
    }

    /// The current properties.
    pub fn get_properties(&self) -> Result<Properties, LedgerError> {
        self.properties().get()
    }

    /// Update the properties. Empty arguments leave a field unchanged.
    pub fn set_properties(
        &self,
        evaluation_wait: &str,
        reveal_delay: &str,
    ) -> Result<Properties, LedgerError> {
        self.properties().set(evaluation_wait, reveal_delay)
    }

    // -- Users ----------------------------------------------------------------

    /// Register a user.
    pub fn register_user(&self, token: &UserToken) -> Result<(), LedgerError> {
        self.users().register(token, self.clock.now())
    }

    /// Read a user.
    pub fn get_user(&self, token: &UserToken) -> Result<User, LedgerError> {
        self.users().get(token)
    }

    /// Read the global totals.
    pub fn get_totals(&self) -> Result<GlobalTotals, LedgerError> {
        self.users().totals()
    }

    // -- Trades ---------------------------------------------------------------

    /// Create a trade and its escrow.
    pub fn create_trade(
        &self,
        trade_id: &TradeId,
        service_code: &ServiceCode,
        seller: &UserToken,
        buyer: &UserToken,
    ) -> Result<Trade, LedgerError> {
        self.trades()
            .create(trade_id, service_code, seller, buyer, self.clock.now())
    }

    /// Close a trade on the caller's side.
    pub fn close_trade(&self, trade_id: &TradeId, caller: &UserToken) -> Result<Trade, LedgerError> {
        self.trades().close(trade_id, caller, self.clock.now())
    }

    /// Read a trade.
    pub fn get_trade(&self, trade_id: &TradeId) -> Result<Trade, LedgerError> {
        self.trades().get(trade_id)
    }

    /// Query trades.
    pub fn query_trades(&self, query: &TradeQuery) -> Result<TradePage, LedgerError> {
        self.trades().query(query)
    }

    // -- Scores ---------------------------------------------------------------

    /// Seal the caller's rating of the other party into escrow.
    pub fn submit_score(
        &self,
        trade_id: &TradeId,
        caller: &UserToken,
        score: &ScoreTriple,
        passphrase: &str,
    ) -> Result<ScoreEscrow, LedgerError> {
        self.escrows().submit(
            &self.cipher,
            trade_id,
            caller,
            score,
            passphrase,
            self.clock.now(),
        )
    }

    /// Reveal both ratings, finalize the trade and update aggregates.
    pub fn reveal_score(&self, trade_id: &TradeId, passphrase: &str) -> Result<Trade, LedgerError> {
        EvaluationEngine::new(&self.store, &self.cipher).evaluate_and_close(
            trade_id,
            passphrase,
            self.clock.now(),
        )
    }

    /// Read a trade's escrow.
    pub fn get_escrow(&self, trade_id: &TradeId) -> Result<ScoreEscrow, LedgerError> {
        self.escrows().lookup(trade_id)
    }

    // -- Sweep ----------------------------------------------------------------

    /// Escrows whose reveal time has passed and are not yet marked expired.
    pub fn due_escrows(&self) -> Result<Vec<ScoreEscrow>, LedgerError> {
        self.escrows().due(self.clock.now())
    }

    /// Mark a due escrow expired.
    pub fn mark_escrow_expired(&self, trade_id: &TradeId) -> Result<ScoreEscrow, LedgerError> {
        self.escrows().mark_expired(trade_id, self.clock.now())
    }
}

impl<S, C> std::fmt::Debug for EvaluationLedger<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationLedger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
