//! Data backend trait.

use crate::error::DataError;

/// Keyed record store.
pub trait DataBackend: Send + Sync {
    /// Fetch the record in `collection` whose `id` equals `key`.
    ///
    /// Returns `Ok(None)` when no record matches.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the query or cannot be reached.
    fn fetch_one(
        &self,
        collection: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<serde_json::Value>, DataError>> + Send;
}
