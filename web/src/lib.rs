//! Axum HTTP surface for Storefront.
//!
//! Handlers stay thin: they extract the request, call the session
//! coordinator or the data backend, and map the result to a response.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, correlation ids
//! ├─────────────────────────────────────────┤
//! │  SessionCoordinator ── Store ── Reducer │  ← session view, backend requests
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use storefront_web::{AppState, build_router};
//!
//! let state = AppState::new(coordinator, data_backend);
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::CorrelationId;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
