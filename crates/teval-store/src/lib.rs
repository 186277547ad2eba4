//! # teval-store — Keyed Store Contract
//!
//! The ledger persists every record as an opaque byte blob under a string
//! key. This crate defines what the ledger needs from that store and ships
//! one reference backend.
//!
//! - [`KeyedStore`]: point `get`/`put`/`delete`, plus predicate queries
//!   with optional sort and bookmark pagination.
//! - [`Selector`]: a JSON field-equality predicate in the style of a
//!   document-store rich query.
//! - [`MemoryStore`]: a thread-safe in-memory backend for tests and
//!   embedding hosts.
//!
//! Values that do not parse as JSON objects are stored and returned by
//! point operations but are invisible to queries.

pub mod error;
pub mod memory;
pub mod selector;

use std::sync::Arc;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use selector::{Selector, SortOrder};

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPage {
    /// Matching `(key, value)` pairs in result order.
    pub entries: Vec<(String, Vec<u8>)>,
    /// Continuation token for the next page, `None` when exhausted.
    pub bookmark: Option<String>,
}

/// Durable mapping from string key to byte blob.
///
/// Each call is assumed atomic with respect to other calls. No
/// cross-call atomicity is offered or assumed.
pub trait KeyedStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All entries matching `selector`, in selector order.
    fn query(&self, selector: &Selector) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// At most `page_size` entries matching `selector`, starting after
    /// `bookmark`.
    fn query_paged(
        &self,
        selector: &Selector,
        page_size: usize,
        bookmark: Option<&str>,
    ) -> Result<QueryPage, StoreError>;
}

impl<T: KeyedStore + ?Sized> KeyedStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn query(&self, selector: &Selector) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        (**self).query(selector)
    }

    fn query_paged(
        &self,
        selector: &Selector,
        page_size: usize,
        bookmark: Option<&str>,
    ) -> Result<QueryPage, StoreError> {
        (**self).query_paged(selector, page_size, bookmark)
    }
}
