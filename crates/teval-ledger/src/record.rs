//! # Ledger Records
//!
//! Every persisted record is one variant of [`LedgerRecord`], serialized as
//! a JSON object carrying a `"record_type"` tag. Users and trades share one
//! key space with escrows and the properties singleton, so the tag is what
//! tells them apart in queries.
//!
//! ## Typed Repositories
//!
//! [`Repository<S, T>`] reads and writes one record kind. Reading a key that
//! holds a different kind fails with [`LedgerError::Encoding`] rather than
//! reinterpreting the bytes.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use teval_store::{KeyedStore, Selector};

use crate::error::LedgerError;
use crate::escrow::ScoreEscrow;
use crate::properties::Properties;
use crate::trade::Trade;
use crate::user::{GlobalTotals, User};

/// Name of the tag field present on every stored record.
pub const RECORD_TYPE_FIELD: &str = "record_type";

/// Discriminant of a [`LedgerRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A registered user.
    User,
    /// The global totals aggregate.
    GlobalTotals,
    /// A trade.
    Trade,
    /// A trade's score escrow.
    ScoreEscrow,
    /// The properties singleton.
    Properties,
}

impl RecordKind {
    /// Tag value as stored in `record_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::GlobalTotals => "global_totals",
            Self::Trade => "trade",
            Self::ScoreEscrow => "score_escrow",
            Self::Properties => "properties",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum LedgerRecord {
    /// A registered user.
    User(User),
    /// The global totals aggregate.
    GlobalTotals(GlobalTotals),
    /// A trade.
    Trade(Trade),
    /// A trade's score escrow.
    ScoreEscrow(ScoreEscrow),
    /// The properties singleton.
    Properties(Properties),
}

impl LedgerRecord {
    /// The variant's discriminant.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::User(_) => RecordKind::User,
            Self::GlobalTotals(_) => RecordKind::GlobalTotals,
            Self::Trade(_) => RecordKind::Trade,
            Self::ScoreEscrow(_) => RecordKind::ScoreEscrow,
            Self::Properties(_) => RecordKind::Properties,
        }
    }

    /// Decode stored bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, LedgerError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode for storage.
    pub fn encode(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A record type with a fixed kind and store key.
pub trait Record: Clone + Sized {
    /// The kind this type is stored as.
    const KIND: RecordKind;

    /// Store key of this record.
    fn key(&self) -> String;

    /// Wrap in the tagged sum type.
    fn into_record(self) -> LedgerRecord;

    /// Unwrap from the tagged sum type, if the kind matches.
    fn from_record(record: LedgerRecord) -> Option<Self>;
}

macro_rules! impl_record {
    ($ty:ty, $variant:ident, |$this:ident| $key:expr) => {
        impl Record for $ty {
            const KIND: RecordKind = RecordKind::$variant;

            fn key(&self) -> String {
                let $this = self;
                $key
            }

            fn into_record(self) -> LedgerRecord {
                LedgerRecord::$variant(self)
            }

            fn from_record(record: LedgerRecord) -> Option<Self> {
                match record {
                    LedgerRecord::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_record!(User, User, |u| u.token.as_str().to_string());
impl_record!(GlobalTotals, GlobalTotals, |_t| GlobalTotals::KEY.to_string());
impl_record!(Trade, Trade, |t| t.trade_id.as_str().to_string());
impl_record!(ScoreEscrow, ScoreEscrow, |e| e.escrow_key.clone());
impl_record!(Properties, Properties, |_p| Properties::KEY.to_string());

/// Kind of whatever record occupies `key`, if any.
pub fn kind_at<S: KeyedStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<RecordKind>, LedgerError> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(LedgerRecord::decode(&bytes)?.kind())),
        None => Ok(None),
    }
}

/// Typed access to one record kind.
pub struct Repository<'a, S: ?Sized, T> {
    store: &'a S,
    _kind: PhantomData<fn() -> T>,
}

impl<'a, S: KeyedStore + ?Sized, T: Record> Repository<'a, S, T> {
    /// Bind to a store.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    fn decode(key: &str, bytes: &[u8]) -> Result<T, LedgerError> {
        let record = LedgerRecord::decode(bytes)?;
        let found = record.kind();
        T::from_record(record).ok_or_else(|| {
            LedgerError::Encoding(format!(
                "key \"{key}\" holds a {found} record, expected {}",
                T::KIND
            ))
        })
    }

    /// Read the record at `key`, if present.
    pub fn get(&self, key: &str) -> Result<Option<T>, LedgerError> {
        self.store
            .get(key)?
            .map(|bytes| Self::decode(key, &bytes))
            .transpose()
    }

    /// Read the record at `key`, failing with `NotFound` when absent.
    pub fn require(&self, key: &str) -> Result<T, LedgerError> {
        self.get(key)?.ok_or_else(|| LedgerError::NotFound {
            kind: T::KIND,
            key: key.to_string(),
        })
    }

    /// Write `record` under its own key.
    pub fn put(&self, record: &T) -> Result<(), LedgerError> {
        let key = record.key();
        let bytes = record.clone().into_record().encode()?;
        self.store.put(&key, bytes)?;
        Ok(())
    }

    /// Delete the record at `key`.
    pub fn delete(&self, key: &str) -> Result<(), LedgerError> {
        self.store.delete(key)?;
        Ok(())
    }

    /// Selector pre-filtered to this record kind.
    pub fn selector(&self) -> Selector {
        Selector::new().eq(RECORD_TYPE_FIELD, T::KIND.as_str())
    }

    /// All records of this kind matching `selector`.
    pub fn query(&self, selector: &Selector) -> Result<Vec<T>, LedgerError> {
        self.store
            .query(selector)?
            .into_iter()
            .map(|(key, bytes)| Self::decode(&key, &bytes))
            .collect()
    }

    /// One page of records matching `selector`, plus the next bookmark.
    pub fn query_paged(
        &self,
        selector: &Selector,
        page_size: usize,
        bookmark: Option<&str>,
    ) -> Result<(Vec<T>, Option<String>), LedgerError> {
        let page = self.store.query_paged(selector, page_size, bookmark)?;
        let records = page
            .entries
            .into_iter()
            .map(|(key, bytes)| Self::decode(&key, &bytes))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, page.bookmark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::ReputationStats;
    use teval_core::{Timestamp, UserToken};
    use teval_store::MemoryStore;

    fn user(token: &str) -> User {
        User {
            token: UserToken::new(token).unwrap(),
            registered_at: Timestamp::parse("2026-10-19T00:00:00Z").unwrap(),
            stats: ReputationStats::default(),
        }
    }

    #[test]
    fn kind_names_match_serde_tags() {
        let json = serde_json::to_value(user("A").into_record()).unwrap();
        assert_eq!(json[RECORD_TYPE_FIELD], RecordKind::User.as_str());
        let props = serde_json::to_value(Properties::default().into_record()).unwrap();
        assert_eq!(props[RECORD_TYPE_FIELD], "properties");
    }

    #[test]
    fn repository_roundtrip() {
        let store = MemoryStore::new();
        let repo: Repository<'_, _, User> = Repository::new(&store);
        assert_eq!(repo.get("A").unwrap(), None);
        repo.put(&user("A")).unwrap();
        assert_eq!(repo.require("A").unwrap(), user("A"));
        repo.delete("A").unwrap();
        assert!(matches!(
            repo.require("A"),
            Err(LedgerError::NotFound {
                kind: RecordKind::User,
                ..
            })
        ));
    }

    #[test]
    fn repository_refuses_other_kind() {
        let store = MemoryStore::new();
        Repository::<'_, _, User>::new(&store).put(&user("X")).unwrap();
        let props: Repository<'_, _, Properties> = Repository::new(&store);
        let err = props.get("X").unwrap_err();
        match err {
            LedgerError::Encoding(msg) => {
                assert!(msg.contains("user record"));
                assert!(msg.contains("expected properties"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn kind_at_reports_occupant() {
        let store = MemoryStore::new();
        assert_eq!(kind_at(&store, "A").unwrap(), None);
        Repository::<'_, _, User>::new(&store).put(&user("A")).unwrap();
        assert_eq!(kind_at(&store, "A").unwrap(), Some(RecordKind::User));
    }

    #[test]
    fn garbage_bytes_are_encoding_errors() {
        let store = MemoryStore::new();
        store.put("A", b"{\"record_type\":\"martian\"}".to_vec()).unwrap();
        assert!(matches!(
            kind_at(&store, "A"),
            Err(LedgerError::Encoding(_))
        ));
    }

    #[test]
    fn query_is_scoped_to_kind() {
        let store = MemoryStore::new();
        let users: Repository<'_, _, User> = Repository::new(&store);
        users.put(&user("A")).unwrap();
        users.put(&user("B")).unwrap();
        Repository::<'_, _, Properties>::new(&store)
            .put(&Properties::default())
            .unwrap();
        assert_eq!(users.query(&users.selector()).unwrap().len(), 2);
    }
}
