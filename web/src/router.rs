//! Route table.

use crate::handlers::{auth, health, products};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use storefront_auth::{DataBackend, IdentityBackend};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// ```text
/// GET  /health
/// GET  /health/ready
/// GET  /api/products/getInfo?product_id=X
/// GET  /api/products/:product_id
/// POST /api/auth/sign-in
/// POST /api/auth/sign-up
/// POST /api/auth/sign-out
/// GET  /api/auth/session
/// ```
///
/// The correlation layer is outermost so every response carries
/// `X-Correlation-ID` and request traces run inside its span.
pub fn build_router<B, D>(state: AppState<B, D>) -> Router
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    let products = Router::new()
        .route("/getInfo", get(products::get_info))
        .route("/:product_id", get(products::get_product::<B, D>));

    let auth = Router::new()
        .route("/sign-in", post(auth::sign_in::<B, D>))
        .route("/sign-up", post(auth::sign_up::<B, D>))
        .route("/sign-out", post(auth::sign_out::<B, D>))
        .route("/session", get(auth::session::<B, D>));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness::<B, D>))
        .nest("/api/products", products)
        .nest("/api/auth", auth)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
