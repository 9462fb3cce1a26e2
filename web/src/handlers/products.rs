//! Product endpoints.

use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use serde_json::{Map, Value};
use storefront_auth::{DataBackend, IdentityBackend, Product, fetch_product};

/// Echo the `product_id` query parameter.
///
/// Always 200. A missing parameter yields `{}`.
///
/// A repeated parameter is not echoed as a list: the first value is kept
/// as a plain string and the rest are dropped.
///
/// ```text
/// GET /api/products/getInfo?product_id=42              ->  {"product_id": "42"}
/// GET /api/products/getInfo?product_id=a&product_id=b  ->  {"product_id": "a"}
/// ```
#[allow(clippy::unused_async)]
pub async fn get_info(Query(params): Query<Vec<(String, String)>>) -> Json<Map<String, Value>> {
    let mut body = Map::new();
    if let Some((_, product_id)) = params.into_iter().find(|(key, _)| key == "product_id") {
        body.insert("product_id".to_string(), Value::String(product_id));
    }
    Json(body)
}

/// Product lookup response.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    /// Requested id, as given in the path.
    pub product_id: String,
    /// The record, or `null` when absent or unreadable.
    pub product: Option<Product>,
}

/// Read one product.
///
/// Always 200; lookup failures are logged and reported as `"product": null`.
///
/// ```text
/// GET /api/products/{product_id}
/// ```
pub async fn get_product<B, D>(
    State(state): State<AppState<B, D>>,
    Path(product_id): Path<String>,
) -> Json<ProductResponse>
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    let product = fetch_product(&state.data, &state.products_table, &product_id).await;

    Json(ProductResponse {
        product_id,
        product,
    })
}
