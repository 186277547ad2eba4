//! # Named-Operation Dispatch
//!
//! Maps a function name and positional string arguments onto the
//! [`EvaluationLedger`] surface. Reads return the JSON encoding of the
//! result; pure writes return an empty payload.
//!
//! | Function | Arguments |
//! |----------|-----------|
//! | `init` | none |
//! | `addUser` | token |
//! | `queryUser` | token |
//! | `queryTotals` | none |
//! | `createTrade` | tradeId, serviceCode, seller, buyer |
//! | `queryTradeWithId` | tradeId |
//! | `queryTradesBySeller` | seller, [order], [pageSize], [bookmark] |
//! | `queryTradesByBuyer` | buyer, [order], [pageSize], [bookmark] |
//! | `queryTradesByService` | serviceCode, [order], [pageSize], [bookmark] |
//! | `closeTrade` | tradeId, caller |
//! | `enrollScore` | tradeId, caller, score (`"[3,4,5]"`), passphrase |
//! | `revealScore` | tradeId, passphrase |
//! | `queryScoreTemp` | tradeId |
//! | `queryDueScoreTemps` | none |
//! | `expireScoreTemp` | tradeId |
//! | `getProperties` | none |
//! | `setProperties` | evaluationWait, revealDelay |
//!
//! `order` is `asc` or `desc` (default `desc`). An empty `pageSize` or
//! `bookmark` means "not given". Arguments are never logged.

use serde::Serialize;
use teval_core::{ScoreTriple, ServiceCode, TradeId, UserToken};
use teval_crypto::ScoreCipher;
use teval_store::{KeyedStore, SortOrder};

use crate::error::LedgerError;
use crate::ledger::EvaluationLedger;
use crate::trade::TradeQuery;

/// Execute `function` with `args` against `ledger`.
///
/// # Errors
///
/// [`LedgerError::UnknownFunction`] for an unregistered name,
/// [`LedgerError::InvalidArguments`] for a wrong argument count or an
/// unparseable option, and whatever the operation itself rejects.
pub fn invoke<S, C, A>(
    ledger: &EvaluationLedger<S, C>,
    function: &str,
    args: &[A],
) -> Result<Vec<u8>, LedgerError>
where
    S: KeyedStore,
    C: ScoreCipher,
    A: AsRef<str>,
{
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    tracing::debug!(function, args = args.len(), "invoke");
    let call = Call {
        function,
        args: &args,
    };

    match function {
        "init" => {
            call.arity(0)?;
            ledger.init()?;
            Ok(Vec::new())
        }
        "addUser" => {
            call.arity(1)?;
            ledger.register_user(&UserToken::new(args[0])?)?;
            Ok(Vec::new())
        }
        "queryUser" => {
            call.arity(1)?;
            json(&ledger.get_user(&UserToken::new(args[0])?)?)
        }
        "queryTotals" => {
            call.arity(0)?;
            json(&ledger.get_totals()?)
        }
        "createTrade" => {
            call.arity(4)?;
            ledger.create_trade(
                &TradeId::new(args[0])?,
                &ServiceCode::new(args[1])?,
                &UserToken::new(args[2])?,
                &UserToken::new(args[3])?,
            )?;
            Ok(Vec::new())
        }
        "queryTradeWithId" => {
            call.arity(1)?;
            json(&ledger.get_trade(&TradeId::new(args[0])?)?)
        }
        "queryTradesBySeller" => {
            let query = call.trade_query()?.seller(UserToken::new(args[0])?);
            json(&ledger.query_trades(&query)?)
        }
        "queryTradesByBuyer" => {
            let query = call.trade_query()?.buyer(UserToken::new(args[0])?);
            json(&ledger.query_trades(&query)?)
        }
        "queryTradesByService" => {
            let query = call.trade_query()?.service(ServiceCode::new(args[0])?);
            json(&ledger.query_trades(&query)?)
        }
        "closeTrade" => {
            call.arity(2)?;
            ledger.close_trade(&TradeId::new(args[0])?, &UserToken::new(args[1])?)?;
            Ok(Vec::new())
        }
        "enrollScore" => {
            call.arity(4)?;
            let score = ScoreTriple::parse(args[2]).map_err(LedgerError::invalid_score)?;
            ledger.submit_score(
                &TradeId::new(args[0])?,
                &UserToken::new(args[1])?,
                &score,
                args[3],
            )?;
            Ok(Vec::new())
        }
        "revealScore" => {
            call.arity(2)?;
            ledger.reveal_score(&TradeId::new(args[0])?, args[1])?;
            Ok(Vec::new())
        }
        "queryScoreTemp" => {
            call.arity(1)?;
            json(&ledger.get_escrow(&TradeId::new(args[0])?)?)
        }
        "queryDueScoreTemps" => {
            call.arity(0)?;
            json(&ledger.due_escrows()?)
        }
        "expireScoreTemp" => {
            call.arity(1)?;
            ledger.mark_escrow_expired(&TradeId::new(args[0])?)?;
            Ok(Vec::new())
        }
        "getProperties" => {
            call.arity(0)?;
            json(&ledger.get_properties()?)
        }
        "setProperties" => {
            call.arity(2)?;
            ledger.set_properties(args[0], args[1])?;
            Ok(Vec::new())
        }
        other => Err(LedgerError::UnknownFunction(other.to_string())),
    }
}

fn json<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    Ok(serde_json::to_vec(value)?)
}

struct Call<'a> {
    function: &'a str,
    args: &'a [&'a str],
}

impl Call<'_> {
    fn invalid(&self, reason: String) -> LedgerError {
        LedgerError::InvalidArguments {
            function: self.function.to_string(),
            reason,
        }
    }

    fn arity(&self, expected: usize) -> Result<(), LedgerError> {
        if self.args.len() == expected {
            Ok(())
        } else {
            Err(self.invalid(format!(
                "expected {expected} argument(s), got {}",
                self.args.len()
            )))
        }
    }

    /// Optional order, page size and bookmark after the filter value.
    fn trade_query(&self) -> Result<TradeQuery, LedgerError> {
        if self.args.is_empty() || self.args.len() > 4 {
            return Err(self.invalid(format!(
                "expected 1 to 4 arguments, got {}",
                self.args.len()
            )));
        }
        let given = |idx: usize| self.args.get(idx).map(|s| s.trim()).filter(|s| !s.is_empty());

        let order = match given(1) {
            None => SortOrder::default(),
            Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Ascending,
            Some(o) if o.eq_ignore_ascii_case("desc") => SortOrder::Descending,
            Some(o) => return Err(self.invalid(format!("unknown sort order \"{o}\""))),
        };
        let mut query = TradeQuery::new().order(order);

        let bookmark = given(3).map(str::to_string);
        match given(2) {
            Some(size) => {
                let size: usize = size
                    .parse()
                    .map_err(|_| self.invalid(format!("page size \"{size}\" is not a number")))?;
                query = query.paged(size, bookmark);
            }
            None if bookmark.is_some() => {
                return Err(self.invalid("bookmark given without page size".to_string()))
            }
            None => {}
        }
        Ok(query)
    }
}
