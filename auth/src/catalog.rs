//! Product read.

use crate::providers::DataBackend;
use serde::{Deserialize, Serialize};

/// Collection products are read from unless configured otherwise.
pub const PRODUCTS: &str = "products";

/// A product record. Extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Numeric identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Creation timestamp as stored.
    pub created_at: String,
}

/// Fetch one product by id.
///
/// Best effort and single attempt: backend errors and undecodable rows are
/// logged and reported as absent.
pub async fn fetch_product<D>(data: &D, collection: &str, product_id: &str) -> Option<Product>
where
    D: DataBackend,
{
    let record = match data.fetch_one(collection, product_id).await {
        Ok(record) => record?,
        Err(error) => {
            tracing::warn!(product_id, error = %error, "Product fetch failed");
            return None;
        },
    };

    match serde_json::from_value::<Product>(record) {
        Ok(product) => Some(product),
        Err(error) => {
            tracing::warn!(product_id, error = %error, "Product record could not be decoded");
            None
        },
    }
}
