//! Session coordinator.
//!
//! Process-wide owner of the session view. Wraps a [`Store`] running the
//! [`SessionReducer`] and exposes snapshots, change notifications and the
//! backend requests as plain async methods.
//!
//! # Example
//!
//! ```ignore
//! let coordinator = SessionCoordinator::new(backend, SessionConfig::default());
//! coordinator.start().await?;
//!
//! let view = coordinator.wait_until_ready(Duration::from_secs(5)).await?;
//! if let Some(identity) = view.identity {
//!     tracing::info!(user_id = %identity.id, "Signed in");
//! }
//! ```

use crate::actions::SessionAction;
use crate::config::SessionConfig;
use crate::environment::SessionEnvironment;
use crate::error::{AuthError, Result};
use crate::providers::IdentityBackend;
use crate::reducers::SessionReducer;
use crate::replies::PendingReplies;
use crate::state::{Credentials, Identity, SessionState, SessionView, SignUpOutcome};
use futures::Stream;
use std::time::Duration;
use storefront_runtime::{HealthCheck, Store, StoreConfig, StoreError};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Store type driving the session reducer.
pub type SessionStore<B> =
    Store<SessionState, SessionAction, SessionEnvironment<B>, SessionReducer<B>>;

/// Owner of the session view.
///
/// Cheap to clone; clones share the same store.
pub struct SessionCoordinator<B>
where
    B: IdentityBackend + Clone + 'static,
{
    store: SessionStore<B>,
    replies: PendingReplies,
    config: SessionConfig,
}

impl<B> Clone for SessionCoordinator<B>
where
    B: IdentityBackend + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            replies: self.replies.clone(),
            config: self.config.clone(),
        }
    }
}

impl<B> SessionCoordinator<B>
where
    B: IdentityBackend + Clone + 'static,
{
    /// Create a coordinator. The view starts as not ready and signed out.
    #[must_use]
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Self::with_environment(SessionEnvironment::new(backend), config)
    }

    /// Create a coordinator with a custom environment.
    #[must_use]
    pub fn with_environment(environment: SessionEnvironment<B>, config: SessionConfig) -> Self {
        let store_config = StoreConfig::default()
            .with_broadcast_capacity(config.update_capacity)
            .with_shutdown_timeout(config.shutdown_timeout);

        let replies = environment.replies.clone();

        Self {
            store: Store::with_config(
                SessionState::default(),
                SessionReducer::new(),
                environment,
                store_config,
            ),
            replies,
            config,
        }
    }

    /// Fetch the current session and subscribe to changes.
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CoordinatorStopped`] after shutdown.
    pub async fn start(&self) -> Result<()> {
        self.store.send(SessionAction::Start).await?;
        Ok(())
    }

    /// Latest snapshot of the session view.
    pub async fn current_view(&self) -> SessionView {
        self.store.state(SessionState::view).await
    }

    /// Subscribe to view changes.
    #[must_use]
    pub fn updates(&self) -> SessionUpdates<B> {
        SessionUpdates {
            store: self.store.clone(),
            actions: self.store.subscribe_actions(),
        }
    }

    /// Wait for a view matching `predicate`.
    ///
    /// Returns immediately if the current view already matches.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Timeout`] if no matching view appears in time
    /// - [`AuthError::CoordinatorStopped`] if the coordinator goes away
    pub async fn wait_for<F>(&self, predicate: F, timeout: Duration) -> Result<SessionView>
    where
        F: Fn(&SessionView) -> bool,
    {
        // Subscribe before reading so no change slips between the two
        let mut updates = self.updates();
        let view = self.current_view().await;
        if predicate(&view) {
            return Ok(view);
        }

        tokio::time::timeout(timeout, async {
            while let Some(view) = updates.next().await {
                if predicate(&view) {
                    return Ok(view);
                }
            }
            Err(AuthError::CoordinatorStopped)
        })
        .await
        .map_err(|_| AuthError::Timeout)?
    }

    /// Wait until the session has been resolved once.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Timeout`] if the session does not resolve in time.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<SessionView> {
        self.wait_for(|view| view.ready, timeout).await
    }

    /// Sign in with email and password.
    ///
    /// The view changes when the backend's `SignedIn` notification arrives,
    /// not when this returns.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingCredentials`] if either field is empty
    /// - [`AuthError::Backend`] with the backend's message on rejection
    /// - [`AuthError::Timeout`] if the backend does not answer in time
    pub async fn sign_in(&self, credentials: Credentials) -> Result<Identity> {
        let credentials = credentials.validated()?;
        let correlation_id = Uuid::new_v4();

        match self
            .request(SessionAction::SignInRequested {
                correlation_id,
                credentials,
            })
            .await?
        {
            SessionAction::SignInSucceeded { identity, .. } => Ok(identity),
            SessionAction::SignInFailed { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingCredentials`] if either field is empty
    /// - [`AuthError::Backend`] with the backend's message on rejection
    /// - [`AuthError::Timeout`] if the backend does not answer in time
    pub async fn sign_up(&self, credentials: Credentials) -> Result<SignUpOutcome> {
        let credentials = credentials.validated()?;
        let correlation_id = Uuid::new_v4();

        match self
            .request(SessionAction::SignUpRequested {
                correlation_id,
                credentials,
            })
            .await?
        {
            SessionAction::SignUpSucceeded { outcome, .. } => Ok(outcome),
            SessionAction::SignUpFailed { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Ask the backend to end the session.
    ///
    /// Local state is left alone; the view clears when the backend's
    /// `SignedOut` notification arrives.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Backend`] with the backend's message on failure
    /// - [`AuthError::Timeout`] if the backend does not answer in time
    pub async fn sign_out(&self) -> Result<()> {
        let correlation_id = Uuid::new_v4();

        match self
            .request(SessionAction::SignOutRequested { correlation_id })
            .await?
        {
            SessionAction::SignOutSucceeded { .. } => Ok(()),
            SessionAction::SignOutFailed { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Cancel the subscription and drain in-flight requests.
    ///
    /// Updates arriving after this are ignored. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if in-flight effects outlive `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        match self.store.send(SessionAction::Teardown).await {
            Ok(()) => {},
            Err(StoreError::ShutdownInProgress) => return Ok(()),
            Err(error) => return Err(error.into()),
        }
        self.store.shutdown(timeout).await?;
        tracing::info!("Session coordinator stopped");
        Ok(())
    }

    /// Store health.
    #[must_use]
    pub fn health(&self) -> HealthCheck {
        self.store.health()
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Send a request and wait for its answer in the reply slot.
    async fn request(&self, action: SessionAction) -> Result<SessionAction> {
        let Some(correlation_id) = action.correlation_id() else {
            return Err(AuthError::Internal("request without correlation id".to_string()));
        };

        // The slot must exist before the effect can answer
        let reply = self.replies.register(correlation_id);
        if let Err(error) = self.store.send(action).await {
            self.replies.forget(correlation_id);
            return Err(error.into());
        }

        match tokio::time::timeout(self.config.request_timeout, reply).await {
            Ok(Ok(answer)) => Ok(answer),
            // Effect task died without answering
            Ok(Err(_)) => Err(AuthError::CoordinatorStopped),
            Err(_) => {
                self.replies.forget(correlation_id);
                tracing::warn!(%correlation_id, "Backend request timed out");
                Err(AuthError::Timeout)
            },
        }
    }
}

fn unexpected(action: &SessionAction) -> AuthError {
    AuthError::Internal(format!("unexpected response: {action:?}"))
}

/// Stream of session view snapshots.
///
/// Yields a fresh snapshot after every action that may have changed the
/// view. Snapshots are taken after the change was applied.
pub struct SessionUpdates<B>
where
    B: IdentityBackend + Clone + 'static,
{
    store: SessionStore<B>,
    actions: broadcast::Receiver<SessionAction>,
}

impl<B> SessionUpdates<B>
where
    B: IdentityBackend + Clone + 'static,
{
    /// Next snapshot, or `None` once the coordinator is gone.
    ///
    /// A slow reader that fell behind gets the current snapshot instead of
    /// the ones it missed.
    pub async fn next(&mut self) -> Option<SessionView> {
        loop {
            match self.actions.recv().await {
                Ok(action) if action.affects_view() => {
                    return Some(self.store.state(SessionState::view).await);
                },
                Ok(_) => {},
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Session updates lagged");
                    return Some(self.store.state(SessionState::view).await);
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Convert into a `futures::Stream`.
    pub fn into_stream(self) -> impl Stream<Item = SessionView> + Send {
        futures::stream::unfold(self, |mut updates| async move {
            updates.next().await.map(|view| (view, updates))
        })
    }
}
