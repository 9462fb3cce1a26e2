//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use storefront_auth::{DataBackend, IdentityBackend};
use storefront_runtime::HealthCheck;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness report.
#[derive(Debug, Serialize)]
pub struct Readiness {
    /// Whether the session view has resolved.
    pub ready: bool,
    /// Session store diagnostics.
    pub store: HealthCheck,
}

/// Readiness check (for traffic routing).
///
/// # Status Codes
///
/// - 200 OK: the session view is ready and the store is not unhealthy
/// - 503 Service Unavailable: otherwise
///
/// # Endpoint
///
/// ```text
/// GET /health/ready
/// ```
///
/// # Response
///
/// ```json
/// {
///   "ready": true,
///   "store": { "component": "store", "status": "Healthy", "message": null, "metadata": [] }
/// }
/// ```
pub async fn readiness<B, D>(State(state): State<AppState<B, D>>) -> (StatusCode, Json<Readiness>)
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    let ready = state.session.current_view().await.ready;
    let store = state.session.health();

    let status = if ready && !store.status.is_unhealthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(Readiness { ready, store }))
}
