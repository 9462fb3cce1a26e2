//! # Storefront Authentication
//!
//! Session state for the storefront: who is signed in, kept in sync with a
//! hosted identity backend, plus the keyed product read.
//!
//! ## Architecture
//!
//! The session is a reducer driven by a store:
//!
//! ```text
//! Start ──► fetch current session ──► SessionFetched ──┐
//!       └─► subscribe (cancellable) ─► AuthStateChanged ┴─► identity replaced, ready = true
//! Teardown ─► Cancel(subscription)    (later updates ignored)
//! ```
//!
//! Sign-in, sign-up and sign-out are forwarded to the backend. Their answers
//! go back to the caller through a reply slot; the view only changes through notifications.
//!
//! ## Example
//!
//! ```rust,ignore
//! use storefront_auth::{SessionConfig, SessionCoordinator, SupabaseClient};
//!
//! let backend = SupabaseClient::new(url, anon_key);
//! let coordinator = SessionCoordinator::new(backend, SessionConfig::default());
//! coordinator.start().await?;
//!
//! let view = coordinator.wait_until_ready(Duration::from_secs(5)).await?;
//! ```

pub mod actions;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod environment;
pub mod error;
pub mod providers;
pub mod reducers;
pub mod replies;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::SessionAction;
pub use catalog::{Product, fetch_product};
pub use config::SessionConfig;
pub use coordinator::{SessionCoordinator, SessionUpdates};
pub use environment::SessionEnvironment;
pub use error::{AuthError, DataError, Result};
pub use providers::{AuthEventHub, AuthSubscription, DataBackend, IdentityBackend, SupabaseClient};
pub use reducers::SessionReducer;
pub use replies::PendingReplies;
pub use state::{
    AuthChangeEvent, AuthStateChange, Credentials, Identity, SessionState, SessionView,
    SignUpOutcome, UserId,
};
