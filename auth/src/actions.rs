//! Session actions.
//!
//! Commands sent by the coordinator and results fed back by effects.
//! Request/response pairs carry a `correlation_id` so a caller waiting on
//! the store can pick out its own answer.

use crate::error::AuthError;
use crate::state::{AuthStateChange, Credentials, Identity, SignUpOutcome};
use uuid::Uuid;

/// Actions for the session reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    // ═══════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════

    /// Fetch the current session and subscribe to changes.
    Start,

    /// Cancel the change subscription; later updates are ignored.
    Teardown,

    // ═══════════════════════════════════════════════════════════
    // Session resolution
    // ═══════════════════════════════════════════════════════════

    /// The initial session fetch resolved. A failed fetch arrives as `None`.
    SessionFetched {
        /// Identity reported by the backend
        identity: Option<Identity>,
    },

    /// The backend reported an auth state change.
    AuthStateChanged {
        /// The notification
        change: AuthStateChange,
    },

    // ═══════════════════════════════════════════════════════════
    // Sign in
    // ═══════════════════════════════════════════════════════════

    /// Sign in with email and password.
    SignInRequested {
        /// Request correlation
        correlation_id: Uuid,
        /// Validated credentials
        credentials: Credentials,
    },

    /// The backend accepted the credentials.
    SignInSucceeded {
        /// Request correlation
        correlation_id: Uuid,
        /// Signed-in identity
        identity: Identity,
    },

    /// The backend rejected the credentials.
    SignInFailed {
        /// Request correlation
        correlation_id: Uuid,
        /// Failure
        error: AuthError,
    },

    // ═══════════════════════════════════════════════════════════
    // Sign up
    // ═══════════════════════════════════════════════════════════

    /// Register a new account.
    SignUpRequested {
        /// Request correlation
        correlation_id: Uuid,
        /// Validated credentials
        credentials: Credentials,
    },

    /// The account was created.
    SignUpSucceeded {
        /// Request correlation
        correlation_id: Uuid,
        /// Backend answer
        outcome: SignUpOutcome,
    },

    /// Registration failed.
    SignUpFailed {
        /// Request correlation
        correlation_id: Uuid,
        /// Failure
        error: AuthError,
    },

    // ═══════════════════════════════════════════════════════════
    // Sign out
    // ═══════════════════════════════════════════════════════════

    /// Invalidate the current session on the backend.
    SignOutRequested {
        /// Request correlation
        correlation_id: Uuid,
    },

    /// The backend acknowledged the sign-out.
    SignOutSucceeded {
        /// Request correlation
        correlation_id: Uuid,
    },

    /// The backend failed to sign out.
    SignOutFailed {
        /// Request correlation
        correlation_id: Uuid,
        /// Failure
        error: AuthError,
    },
}

impl SessionAction {
    /// Correlation id of a request/response action.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<Uuid> {
        match self {
            Self::SignInRequested { correlation_id, .. }
            | Self::SignInSucceeded { correlation_id, .. }
            | Self::SignInFailed { correlation_id, .. }
            | Self::SignUpRequested { correlation_id, .. }
            | Self::SignUpSucceeded { correlation_id, .. }
            | Self::SignUpFailed { correlation_id, .. }
            | Self::SignOutRequested { correlation_id }
            | Self::SignOutSucceeded { correlation_id }
            | Self::SignOutFailed { correlation_id, .. } => Some(*correlation_id),
            Self::Start
            | Self::Teardown
            | Self::SessionFetched { .. }
            | Self::AuthStateChanged { .. } => None,
        }
    }

    /// Returns `true` for the success or failure answer to `correlation_id`.
    #[must_use]
    pub fn is_response_to(&self, correlation_id: Uuid) -> bool {
        let is_response = matches!(
            self,
            Self::SignInSucceeded { .. }
                | Self::SignInFailed { .. }
                | Self::SignUpSucceeded { .. }
                | Self::SignUpFailed { .. }
                | Self::SignOutSucceeded { .. }
                | Self::SignOutFailed { .. }
        );
        is_response && self.correlation_id() == Some(correlation_id)
    }

    /// Returns `true` for actions that may change the session view.
    #[must_use]
    pub const fn affects_view(&self) -> bool {
        matches!(self, Self::SessionFetched { .. } | Self::AuthStateChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_not_its_own_response() {
        let id = Uuid::new_v4();
        assert!(!SessionAction::SignOutRequested { correlation_id: id }.is_response_to(id));
        assert!(SessionAction::SignOutSucceeded { correlation_id: id }.is_response_to(id));
        assert!(!SessionAction::SignOutSucceeded { correlation_id: id }.is_response_to(Uuid::new_v4()));
    }
}
