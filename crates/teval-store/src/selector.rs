//! # Query Selector
//!
//! A [`Selector`] matches stored JSON objects whose top-level fields equal
//! given values, optionally ordering the matches by one field.
//!
//! ```
//! use teval_store::{Selector, SortOrder};
//!
//! let selector = Selector::new()
//!     .eq("record_type", "trade")
//!     .eq("seller", "A")
//!     .sort_by("created_at", SortOrder::Descending);
//! assert_eq!(
//!     selector.to_query_json().to_string(),
//!     r#"{"selector":{"record_type":"trade","seller":"A"},"sort":[{"created_at":"desc"}]}"#
//! );
//! ```
//!
//! [`Selector::to_query_json`] renders the document-store rich-query form,
//! so a backend built on such a store can pass it through unchanged.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction for selector results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest / smallest first.
    Ascending,
    /// Newest / largest first.
    #[default]
    Descending,
}

impl SortOrder {
    /// Rich-query spelling (`"asc"` / `"desc"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-equality predicate with optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    fields: BTreeMap<String, Value>,
    sort: Option<(String, SortOrder)>,
}

impl Selector {
    /// A selector that matches every JSON object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Order matches by `field`.
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    /// The sort field and direction, if any.
    pub fn sort(&self) -> Option<(&str, SortOrder)> {
        self.sort.as_ref().map(|(f, o)| (f.as_str(), *o))
    }

    /// Whether `doc` satisfies every equality constraint.
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(obj) = doc.as_object() else {
            return false;
        };
        self.fields
            .iter()
            .all(|(field, expected)| obj.get(field) == Some(expected))
    }

    /// Order two matched documents. Ties and unsorted selectors fall back
    /// to key order so results are deterministic.
    pub fn compare(&self, a: (&str, &Value), b: (&str, &Value)) -> Ordering {
        let by_field = match &self.sort {
            Some((field, order)) => {
                let ord = compare_values(a.1.get(field), b.1.get(field));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            }
            None => Ordering::Equal,
        };
        by_field.then_with(|| a.0.cmp(b.0))
    }

    /// Render as a rich-query document: `{"selector":{..},"sort":[..]}`.
    pub fn to_query_json(&self) -> Value {
        let selector: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut query = serde_json::Map::new();
        query.insert("selector".to_string(), Value::Object(selector));
        if let Some((field, order)) = &self.sort {
            let mut clause = serde_json::Map::new();
            clause.insert(field.clone(), Value::String(order.as_str().to_string()));
            query.insert("sort".to_string(), Value::Array(vec![Value::Object(clause)]));
        }
        Value::Object(query)
    }
}

/// Missing < null < bool < number < string. Arrays and objects compare
/// equal to each other.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
