//! Supabase backend.
//!
//! Talks to GoTrue (`/auth/v1`) for identity and PostgREST (`/rest/v1`) for
//! records. The session is kept in memory and changes are fanned out
//! through an [`AuthEventHub`].

use crate::error::{AuthError, DataError, Result};
use crate::providers::{AuthEventHub, AuthSubscription, DataBackend, IdentityBackend};
use crate::state::{AuthChangeEvent, AuthStateChange, Credentials, Identity, SignUpOutcome};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Supabase project client.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    session: Arc<Mutex<Option<StoredSession>>>,
    events: AuthEventHub,
}

#[derive(Clone)]
struct StoredSession {
    access_token: String,
    identity: Identity,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    access_token: String,
    user: Identity,
}

/// Signup answers with a session when confirmation is off, or with the bare
/// user when a confirmation email was sent.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionResponse),
    User(Identity),
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Pull the human-readable message out of an error response.
async fn error_message(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });
    (status, message)
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            anon_key: anon_key.into(),
            session: Arc::new(Mutex::new(None)),
            events: AuthEventHub::new(),
        }
    }

    /// Use a preconfigured HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Project URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access token of the stored session.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.access_token.clone())
    }

    /// Notification hub backing [`IdentityBackend::subscribe`].
    #[must_use]
    pub const fn events(&self) -> &AuthEventHub {
        &self.events
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<StoredSession>> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Replace the stored session and notify subscribers.
    fn set_session(&self, session: Option<StoredSession>, event: AuthChangeEvent) {
        let identity = session.as_ref().map(|s| s.identity.clone());
        *self.lock_session() = session;
        self.events.publish(&AuthStateChange::new(event, identity));
    }

    async fn password_grant(&self, credentials: &Credentials) -> Result<SessionResponse> {
        let response = self
            .request(Method::POST, "/auth/v1/token?grant_type=password")
            .json(&PasswordGrant {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = error_message(response).await;
            tracing::debug!(%status, "Password sign-in rejected");
            return Err(AuthError::Backend { message });
        }

        Ok(response.json::<SessionResponse>().await?)
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("signed_in", &self.lock_session().is_some())
            .finish_non_exhaustive()
    }
}

impl IdentityBackend for SupabaseClient {
    fn current_session(&self) -> impl std::future::Future<Output = Result<Option<Identity>>> + Send {
        let identity = self.lock_session().as_ref().map(|s| s.identity.clone());
        async move { Ok(identity) }
    }

    fn subscribe(&self) -> AuthSubscription {
        let identity = self.lock_session().as_ref().map(|s| s.identity.clone());
        self.events
            .subscribe_with_initial(AuthStateChange::new(AuthChangeEvent::InitialSession, identity))
    }

    fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<Identity>> + Send {
        async move {
            let session = self.password_grant(credentials).await?;
            let identity = session.user.clone();
            tracing::info!(user_id = %identity.id, "Signed in");

            self.set_session(
                Some(StoredSession {
                    access_token: session.access_token,
                    identity: session.user,
                }),
                AuthChangeEvent::SignedIn,
            );
            Ok(identity)
        }
    }

    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<SignUpOutcome>> + Send {
        async move {
            let response = self
                .request(Method::POST, "/auth/v1/signup")
                .json(&PasswordGrant {
                    email: &credentials.email,
                    password: &credentials.password,
                })
                .send()
                .await?;

            if !response.status().is_success() {
                let (status, message) = error_message(response).await;
                tracing::debug!(%status, "Sign-up rejected");
                return Err(AuthError::Backend { message });
            }

            match response.json::<SignUpResponse>().await? {
                SignUpResponse::Session(session) => {
                    let identity = session.user.clone();
                    tracing::info!(user_id = %identity.id, "Signed up with immediate session");
                    self.set_session(
                        Some(StoredSession {
                            access_token: session.access_token,
                            identity: session.user,
                        }),
                        AuthChangeEvent::SignedIn,
                    );
                    Ok(SignUpOutcome {
                        identity: Some(identity),
                        confirmation_required: false,
                    })
                },
                SignUpResponse::User(identity) => {
                    tracing::info!(user_id = %identity.id, "Signed up, confirmation pending");
                    Ok(SignUpOutcome {
                        identity: Some(identity),
                        confirmation_required: true,
                    })
                },
            }
        }
    }

    fn sign_out(&self) -> impl std::future::Future<Output = Result<()>> + Send {
        async move {
            if self.access_token().is_some() {
                let response = self.request(Method::POST, "/auth/v1/logout").send().await?;
                let status = response.status();

                // An already-invalid token still ends the local session
                if !status.is_success()
                    && status != StatusCode::UNAUTHORIZED
                    && status != StatusCode::NOT_FOUND
                {
                    let (_, message) = error_message(response).await;
                    return Err(AuthError::Backend { message });
                }
            }

            tracing::info!("Signed out");
            self.set_session(None, AuthChangeEvent::SignedOut);
            Ok(())
        }
    }
}

impl DataBackend for SupabaseClient {
    fn fetch_one(
        &self,
        collection: &str,
        key: &str,
    ) -> impl std::future::Future<Output = std::result::Result<Option<serde_json::Value>, DataError>> + Send
    {
        let request = self
            .request(Method::GET, &format!("/rest/v1/{collection}"))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{key}"))])
            .header("Accept", "application/json");

        async move {
            let response = request.send().await?;

            if !response.status().is_success() {
                let (status, message) = error_message(response).await;
                return Err(DataError::Query {
                    status: status.as_u16(),
                    message,
                });
            }

            let rows = response.json::<Vec<serde_json::Value>>().await?;
            Ok(rows.into_iter().next())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = SupabaseClient::new("https://project.supabase.co/", "anon");
        assert_eq!(client.base_url(), "https://project.supabase.co");
        assert!(client.access_token().is_none());
    }

    #[test]
    fn error_body_prefers_description() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap_or_default();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));

        let body: ErrorBody =
            serde_json::from_str(r#"{"code":422,"msg":"User already registered"}"#).unwrap_or_default();
        assert_eq!(body.into_message().as_deref(), Some("User already registered"));
    }
}
