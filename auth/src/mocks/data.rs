//! Mock data backend for testing.

use crate::error::DataError;
use crate::providers::DataBackend;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock data backend.
///
/// Records are keyed by `(collection, id)`.
#[derive(Debug, Clone, Default)]
pub struct MockDataBackend {
    records: Arc<Mutex<HashMap<(String, String), serde_json::Value>>>,
    failure: Arc<Mutex<Option<DataError>>>,
}

impl MockDataBackend {
    /// Create an empty mock data backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn insert(
        &self,
        collection: &str,
        key: &str,
        record: serde_json::Value,
    ) -> Result<(), DataError> {
        self.records
            .lock()
            .map_err(|_| DataError::Internal("Mutex lock failed".to_string()))?
            .insert((collection.to_string(), key.to_string()), record);
        Ok(())
    }

    /// Make every following fetch fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn fail_with(&self, error: DataError) -> Result<(), DataError> {
        *self
            .failure
            .lock()
            .map_err(|_| DataError::Internal("Mutex lock failed".to_string()))? = Some(error);
        Ok(())
    }
}

impl DataBackend for MockDataBackend {
    fn fetch_one(
        &self,
        collection: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, DataError>> + Send {
        let records = Arc::clone(&self.records);
        let failure = Arc::clone(&self.failure);
        let key = (collection.to_string(), key.to_string());

        async move {
            if let Some(error) = failure
                .lock()
                .map_err(|_| DataError::Internal("Mutex lock failed".to_string()))?
                .clone()
            {
                return Err(error);
            }

            Ok(records
                .lock()
                .map_err(|_| DataError::Internal("Mutex lock failed".to_string()))?
                .get(&key)
                .cloned())
        }
    }
}
