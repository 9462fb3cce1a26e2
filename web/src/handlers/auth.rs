//! Authentication endpoints.
//!
//! Thin wrappers over [`SessionCoordinator`](storefront_auth::SessionCoordinator).
//! None of them touch the session view directly: sign-in and sign-out show
//! up in `GET /api/auth/session` once the backend's notification arrives.
//!
//! There is one session per process. Every caller of these routes acts on
//! that same session, the way a single operator would.

use crate::WebResult;
use crate::extractors::CorrelationId;
use crate::state::AppState;
use axum::{Json, extract::State};
use serde::Serialize;
use storefront_auth::{Credentials, DataBackend, Identity, IdentityBackend, SessionView};

/// Sign-in response.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    /// The signed-in user.
    pub user: Identity,
    /// Human-readable confirmation.
    pub message: &'static str,
}

/// Sign-up response.
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    /// The created user, when the backend returns one.
    pub user: Option<Identity>,
    /// `true` when the account must be confirmed by email first.
    pub confirmation_required: bool,
    /// Human-readable confirmation.
    pub message: &'static str,
}

/// Sign-out response.
#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    /// Human-readable confirmation.
    pub message: &'static str,
}

/// Sign in with email and password.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/sign-in
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "..." }
/// ```
///
/// # Errors
///
/// - 400 `BAD_REQUEST` if either field is empty
/// - 400 `AUTH_ERROR` with the backend's message when rejected
/// - 408 if the backend does not answer in time
pub async fn sign_in<B, D>(
    State(state): State<AppState<B, D>>,
    correlation_id: CorrelationId,
    Json(credentials): Json<Credentials>,
) -> WebResult<Json<SignInResponse>>
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    tracing::info!(correlation_id = %correlation_id.0, "Sign-in requested");

    let user = state.session.sign_in(credentials).await?;

    Ok(Json(SignInResponse {
        user,
        message: "Signed in successfully",
    }))
}

/// Register a new account.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/sign-up
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "..." }
/// ```
///
/// # Errors
///
/// Same as [`sign_in`].
pub async fn sign_up<B, D>(
    State(state): State<AppState<B, D>>,
    correlation_id: CorrelationId,
    Json(credentials): Json<Credentials>,
) -> WebResult<Json<SignUpResponse>>
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    tracing::info!(correlation_id = %correlation_id.0, "Sign-up requested");

    let outcome = state.session.sign_up(credentials).await?;
    let message = if outcome.confirmation_required {
        "Registration successful! Check your email to confirm."
    } else {
        "Registration successful"
    };

    Ok(Json(SignUpResponse {
        user: outcome.identity,
        confirmation_required: outcome.confirmation_required,
        message,
    }))
}

/// End the current session.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/sign-out
/// ```
///
/// # Errors
///
/// - 400 `AUTH_ERROR` with the backend's message on failure
pub async fn sign_out<B, D>(
    State(state): State<AppState<B, D>>,
    correlation_id: CorrelationId,
) -> WebResult<Json<SignOutResponse>>
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    tracing::info!(correlation_id = %correlation_id.0, "Sign-out requested");

    state.session.sign_out().await?;

    Ok(Json(SignOutResponse {
        message: "Signed out",
    }))
}

/// Current session view.
///
/// ```text
/// GET /api/auth/session
/// ```
pub async fn session<B, D>(State(state): State<AppState<B, D>>) -> Json<SessionView>
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    Json(state.session.current_view().await)
}
