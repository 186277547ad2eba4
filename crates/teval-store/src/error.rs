//! Store error types.

use thiserror::Error;

/// Errors raised by a [`KeyedStore`](crate::KeyedStore) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed to complete the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A pagination bookmark does not identify a position in the result set.
    #[error("invalid bookmark \"{bookmark}\"")]
    InvalidBookmark {
        /// The bookmark that was supplied.
        bookmark: String,
    },

    /// Paged queries need a page size of at least one.
    #[error("page size must be at least 1")]
    InvalidPageSize,
}
