//! Error types for session and data backend operations.

use storefront_runtime::StoreError;
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failures surfaced by the identity backend and the session coordinator.
///
/// Backend messages are carried verbatim so callers can show them to users
/// unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Backend Errors
    // ═══════════════════════════════════════════════════════════

    /// The identity backend rejected the request.
    #[error("{message}")]
    Backend {
        /// Message reported by the backend
        message: String,
    },

    /// Email or password was empty.
    #[error("Please fill in all fields")]
    MissingCredentials,

    /// The backend could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with something we could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ═══════════════════════════════════════════════════════════
    // Coordinator Errors
    // ═══════════════════════════════════════════════════════════

    /// No answer within the configured request timeout.
    #[error("Timed out waiting for the identity backend")]
    Timeout,

    /// The coordinator has been shut down.
    #[error("Session coordinator is stopped")]
    CoordinatorStopped,

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Build a backend error from any message.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this error came back from the backend or from
    /// local validation, i.e. it is safe to show to the user as-is.
    ///
    /// # Examples
    ///
    /// ```
    /// # use storefront_auth::AuthError;
    /// assert!(AuthError::backend("Invalid login credentials").is_user_error());
    /// assert!(!AuthError::Timeout.is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Backend { .. } | Self::MissingCredentials)
    }
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::ShutdownInProgress => Self::CoordinatorStopped,
            StoreError::ShutdownTimeout(pending) => {
                Self::Internal(format!("shutdown timed out with {pending} effects running"))
            },
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Failures surfaced by a data backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The backend rejected the query.
    #[error("Query failed with status {status}: {message}")]
    Query {
        /// HTTP status code
        status: u16,
        /// Message reported by the backend
        message: String,
    },

    /// The backend could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The row could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for DataError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_verbatim() {
        let error = AuthError::backend("network error");
        assert_eq!(error.to_string(), "network error");
    }

    #[test]
    fn store_errors_map_to_coordinator_errors() {
        assert_eq!(
            AuthError::from(StoreError::ShutdownInProgress),
            AuthError::CoordinatorStopped
        );
        assert!(matches!(
            AuthError::from(StoreError::ShutdownTimeout(2)),
            AuthError::Internal(_)
        ));
    }
}
