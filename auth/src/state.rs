//! Session state types.
//!
//! This module defines the identity model reported by the identity backend
//! and the state owned by the session reducer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier assigned by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a backend identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated principal.
///
/// Created by the identity backend and replaced wholesale on every change.
/// `metadata` is carried through without interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend-assigned identifier.
    pub id: UserId,

    /// Contact address, if the backend reports one.
    #[serde(default)]
    pub email: Option<String>,

    /// Backend-defined metadata.
    #[serde(default, alias = "user_metadata")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Identity with an id and email and no metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            email: Some(email.into()),
            metadata: serde_json::Map::new(),
        }
    }
}

/// Kind of auth state change reported by the identity backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    /// First event delivered to a new subscriber.
    InitialSession,
    /// A user signed in.
    SignedIn,
    /// The session ended.
    SignedOut,
    /// The access token was refreshed.
    TokenRefreshed,
    /// User attributes changed.
    UserUpdated,
}

/// One notification on the auth change stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStateChange {
    /// What happened.
    pub event: AuthChangeEvent,
    /// The identity after the change, absent when signed out.
    pub identity: Option<Identity>,
}

impl AuthStateChange {
    /// Notification carrying `identity`.
    #[must_use]
    pub const fn new(event: AuthChangeEvent, identity: Option<Identity>) -> Self {
        Self { event, identity }
    }

    /// `SignedIn` notification.
    #[must_use]
    pub const fn signed_in(identity: Identity) -> Self {
        Self::new(AuthChangeEvent::SignedIn, Some(identity))
    }

    /// `SignedOut` notification.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self::new(AuthChangeEvent::SignedOut, None)
    }
}

/// Snapshot of the session handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionView {
    /// Current identity, absent when nobody is signed in.
    pub identity: Option<Identity>,

    /// `false` until the session has been resolved once.
    pub ready: bool,

    /// When the identity was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionView {
    /// Returns `true` when resolved and somebody is signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.ready && self.identity.is_some()
    }
}

/// State owned by the session reducer.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Current identity.
    pub identity: Option<Identity>,

    /// Set on the first resolution, never cleared.
    pub ready: bool,

    /// Initialization has run.
    pub started: bool,

    /// Teardown has run; further updates are ignored.
    pub torn_down: bool,

    /// When the identity was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Snapshot for consumers.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            identity: self.identity.clone(),
            ready: self.ready,
            updated_at: self.updated_at,
        }
    }
}

/// Email and password pair for sign-in and sign-up.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Build credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Trim the email and reject empty fields.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`](crate::AuthError::MissingCredentials)
    /// if either field is empty.
    pub fn validated(self) -> crate::Result<Self> {
        let email = self.email.trim().to_string();
        if email.is_empty() || self.password.is_empty() {
            return Err(crate::AuthError::MissingCredentials);
        }
        Ok(Self {
            email,
            password: self.password,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpOutcome {
    /// The created user, when the backend returns one.
    pub identity: Option<Identity>,

    /// `true` when the backend requires email confirmation before a
    /// session is issued.
    pub confirmation_required: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn credentials_trim_email() {
        let credentials = Credentials::new("  a@b.c ", "pw").validated();
        assert_eq!(credentials.map(|c| c.email), Ok("a@b.c".to_string()));
    }

    #[test]
    fn credentials_reject_empty_fields() {
        assert_eq!(
            Credentials::new("   ", "pw").validated(),
            Err(crate::AuthError::MissingCredentials)
        );
        assert_eq!(
            Credentials::new("a@b.c", "").validated(),
            Err(crate::AuthError::MissingCredentials)
        );
    }

    #[test]
    fn credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("a@b.c", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn identity_reads_backend_user_metadata() {
        let identity: Identity = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "a@b.c",
            "user_metadata": { "plan": "pro" },
            "aud": "authenticated"
        }))
        .unwrap();

        assert_eq!(identity.id, UserId::new("u1"));
        assert_eq!(identity.metadata.get("plan"), Some(&serde_json::json!("pro")));
    }

    #[test]
    fn change_event_wire_names() {
        let json = serde_json::to_value(AuthChangeEvent::InitialSession).unwrap();
        assert_eq!(json, serde_json::json!("INITIAL_SESSION"));
    }
}
