//! Identity backend trait.

use crate::error::Result;
use crate::providers::AuthSubscription;
use crate::state::{Credentials, Identity, SignUpOutcome};

/// Hosted identity service.
///
/// The coordinator observes identities through this trait; it never
/// constructs them.
pub trait IdentityBackend: Send + Sync {
    /// Current session, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached.
    fn current_session(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Identity>>> + Send;

    /// Subscribe to auth state changes.
    ///
    /// Notifications are delivered in order. Dropping the subscription
    /// unsubscribes.
    fn subscribe(&self) -> AuthSubscription;

    /// Sign in with email and password.
    ///
    /// On success the backend also emits a `SignedIn` notification.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` with the backend's message if the
    /// credentials are rejected.
    fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<Identity>> + Send;

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` with the backend's message if
    /// registration is rejected.
    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<SignUpOutcome>> + Send;

    /// Invalidate the current session.
    ///
    /// The resulting `SignedOut` notification is the only signal that the
    /// session is gone.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` with the backend's message on failure.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}
