//! # In-Memory Store
//!
//! [`MemoryStore`] keeps every entry in a `BTreeMap` behind a
//! `parking_lot::RwLock`. Cloning shares the underlying map, so a host can
//! hand the same store to several ledgers.
//!
//! ## Pagination
//!
//! A bookmark is the key of the last entry of the previous page. The next
//! page starts immediately after that key in the current result order. A
//! bookmark that no longer matches (the entry was deleted or changed so it
//! stopped matching) is rejected with [`StoreError::InvalidBookmark`].

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::StoreError;
use crate::selector::Selector;
use crate::{KeyedStore, QueryPage};

/// Thread-safe, cloneable in-memory [`KeyedStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Matching entries sorted per `selector`, each with its parsed document.
    fn matching(&self, selector: &Selector) -> Vec<(String, Vec<u8>, Value)> {
        let guard = self.data.read();
        let mut hits: Vec<(String, Vec<u8>, Value)> = guard
            .iter()
            .filter_map(|(key, bytes)| {
                let doc: Value = serde_json::from_slice(bytes).ok()?;
                selector
                    .matches(&doc)
                    .then(|| (key.clone(), bytes.clone(), doc))
            })
            .collect();
        drop(guard);
        hits.sort_by(|a, b| selector.compare((a.0.as_str(), &a.2), (b.0.as_str(), &b.2)));
        hits
    }
}

impl KeyedStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        tracing::debug!(key, bytes = value.len(), "store put");
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        tracing::debug!(key, "store delete");
        self.data.write().remove(key);
        Ok(())
    }

    fn query(&self, selector: &Selector) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let hits = self.matching(selector);
        tracing::debug!(matched = hits.len(), "store query");
        Ok(hits.into_iter().map(|(k, v, _)| (k, v)).collect())
    }

    fn query_paged(
        &self,
        selector: &Selector,
        page_size: usize,
        bookmark: Option<&str>,
    ) -> Result<QueryPage, StoreError> {
        if page_size == 0 {
            return Err(StoreError::InvalidPageSize);
        }
        let hits = self.matching(selector);

        let start = match bookmark.filter(|b| !b.is_empty()) {
            None => 0,
            Some(mark) => {
                hits.iter()
                    .position(|(k, _, _)| k == mark)
                    .ok_or_else(|| StoreError::InvalidBookmark {
                        bookmark: mark.to_string(),
                    })?
                    + 1
            }
        };

        let end = start.saturating_add(page_size).min(hits.len());
        let entries: Vec<(String, Vec<u8>)> = hits[start..end]
            .iter()
            .map(|(k, v, _)| (k.clone(), v.clone()))
            .collect();
        let next = if end < hits.len() {
            entries.last().map(|(k, _)| k.clone())
        } else {
            None
        };

        tracing::debug!(
            matched = hits.len(),
            returned = entries.len(),
            more = next.is_some(),
            "store paged query"
        );
        Ok(QueryPage {
            entries,
            bookmark: next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SortOrder;
    use serde_json::json;

    fn put_json(store: &MemoryStore, key: &str, doc: Value) {
        store.put(key, serde_json::to_vec(&doc).unwrap()).unwrap();
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (i, key) in ["T1", "T2", "T3", "T4", "T5"].iter().enumerate() {
            put_json(
                &store,
                key,
                json!({"record_type": "trade", "seller": "A", "created_at": format!("2026-01-0{}", i + 1)}),
            );
        }
        put_json(&store, "U1", json!({"record_type": "user"}));
        store.put("RAW", b"not json".to_vec()).unwrap();
        store
    }

    fn keys(entries: &[(String, Vec<u8>)]) -> Vec<&str> {
        entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn get_put_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.put("k", b"v1".to_vec()).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v1".to_vec()));
        store.put("k", b"v2".to_vec()).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v2".to_vec()));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.delete("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.put("k", b"v".to_vec()).unwrap();
        assert!(b.contains("k"));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn query_filters_and_skips_non_json() {
        let store = seeded();
        let trades = store
            .query(&Selector::new().eq("record_type", "trade"))
            .unwrap();
        assert_eq!(trades.len(), 5);
        let all = store.query(&Selector::new()).unwrap();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn query_sorts_descending() {
        let store = seeded();
        let sel = Selector::new()
            .eq("record_type", "trade")
            .sort_by("created_at", SortOrder::Descending);
        let hits = store.query(&sel).unwrap();
        assert_eq!(keys(&hits), vec!["T5", "T4", "T3", "T2", "T1"]);
    }

    #[test]
    fn paged_query_walks_all_pages() {
        let store = seeded();
        let sel = Selector::new()
            .eq("record_type", "trade")
            .sort_by("created_at", SortOrder::Ascending);

        let p1 = store.query_paged(&sel, 2, None).unwrap();
        assert_eq!(keys(&p1.entries), vec!["T1", "T2"]);
        assert_eq!(p1.bookmark.as_deref(), Some("T2"));

        let p2 = store.query_paged(&sel, 2, p1.bookmark.as_deref()).unwrap();
        assert_eq!(keys(&p2.entries), vec!["T3", "T4"]);

        let p3 = store.query_paged(&sel, 2, p2.bookmark.as_deref()).unwrap();
        assert_eq!(keys(&p3.entries), vec!["T5"]);
        assert_eq!(p3.bookmark, None);
    }

    #[test]
    fn exact_fit_page_has_no_bookmark() {
        let store = seeded();
        let sel = Selector::new().eq("record_type", "trade");
        let page = store.query_paged(&sel, 5, None).unwrap();
        assert_eq!(page.entries.len(), 5);
        assert_eq!(page.bookmark, None);
    }

    #[test]
    fn empty_bookmark_starts_from_beginning() {
        let store = seeded();
        let sel = Selector::new().eq("record_type", "trade");
        let page = store.query_paged(&sel, 1, Some("")).unwrap();
        assert_eq!(keys(&page.entries), vec!["T1"]);
    }

    #[test]
    fn unknown_bookmark_rejected() {
        let store = seeded();
        let sel = Selector::new().eq("record_type", "trade");
        let err = store.query_paged(&sel, 2, Some("T9")).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidBookmark {
                bookmark: "T9".to_string()
            }
        );
    }

    #[test]
    fn zero_page_size_rejected() {
        let store = seeded();
        assert_eq!(
            store.query_paged(&Selector::new(), 0, None).unwrap_err(),
            StoreError::InvalidPageSize
        );
    }

    #[test]
    fn arc_store_delegates() {
        let store: Arc<dyn KeyedStore> = Arc::new(MemoryStore::new());
        store.put("k", b"{}".to_vec()).unwrap();
        assert_eq!(store.query(&Selector::new()).unwrap().len(), 1);
    }
}
