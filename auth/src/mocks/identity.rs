//! Mock identity backend for testing.

use crate::error::{AuthError, Result};
use crate::providers::{AuthEventHub, AuthSubscription, IdentityBackend};
use crate::state::{AuthChangeEvent, AuthStateChange, Credentials, Identity, SignUpOutcome};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Default)]
struct Inner {
    users: Mutex<HashMap<String, (String, Identity)>>,
    session: Mutex<Option<Identity>>,
    fetch_gate: Mutex<Option<watch::Receiver<bool>>>,
    fetch_failure: Mutex<Option<AuthError>>,
    sign_out_failure: Mutex<Option<AuthError>>,
    silent_sign_out: AtomicBool,
    initial_event: AtomicBool,
    auto_confirm: AtomicBool,
    sign_out_calls: AtomicUsize,
    events: AuthEventHub,
}

/// Mock identity backend.
///
/// Holds users and the current session in memory and publishes change
/// notifications the way a hosted backend would. Failure injection and a
/// gate on the session fetch let tests steer ordering.
#[derive(Clone, Default)]
pub struct MockIdentityBackend {
    inner: Arc<Inner>,
}

/// Holds the session fetch until [`open`](Self::open) is called or the gate
/// is dropped.
#[derive(Debug)]
pub struct FetchGate {
    sender: watch::Sender<bool>,
}

impl FetchGate {
    /// Let pending and future fetches resolve.
    pub fn open(&self) {
        let _ = self.sender.send(true);
    }
}

impl MockIdentityBackend {
    /// Create a mock backend with no users and no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user that can sign in with `password`.
    #[must_use]
    pub fn with_user(self, password: &str, identity: Identity) -> Self {
        let email = identity.email.clone().unwrap_or_default();
        lock(&self.inner.users).insert(email, (password.to_string(), identity));
        self
    }

    /// Start with `identity` signed in.
    #[must_use]
    pub fn with_session(self, identity: Identity) -> Self {
        *lock(&self.inner.session) = Some(identity);
        self
    }

    /// Deliver an `InitialSession` notification to every new subscriber.
    #[must_use]
    pub fn with_initial_event(self) -> Self {
        self.inner.initial_event.store(true, Ordering::SeqCst);
        self
    }

    /// Issue a session straight away on sign-up instead of asking for
    /// email confirmation.
    #[must_use]
    pub fn with_auto_confirm(self) -> Self {
        self.inner.auto_confirm.store(true, Ordering::SeqCst);
        self
    }

    /// Block `current_session` until the returned gate is opened.
    #[must_use]
    pub fn gate_session_fetch(&self) -> FetchGate {
        let (sender, receiver) = watch::channel(false);
        *lock(&self.inner.fetch_gate) = Some(receiver);
        FetchGate { sender }
    }

    /// Make `current_session` fail with `error`.
    pub fn fail_session_fetch(&self, error: AuthError) {
        *lock(&self.inner.fetch_failure) = Some(error);
    }

    /// Make `sign_out` fail with a backend error carrying `message`.
    pub fn fail_sign_out_with(&self, message: &str) {
        *lock(&self.inner.sign_out_failure) = Some(AuthError::backend(message));
    }

    /// Let `sign_out` succeed without publishing `SignedOut`.
    pub fn silent_sign_out(&self) {
        self.inner.silent_sign_out.store(true, Ordering::SeqCst);
    }

    /// Publish `change` and adopt its identity as the backend session.
    pub fn emit(&self, change: AuthStateChange) -> usize {
        *lock(&self.inner.session) = change.identity.clone();
        self.inner.events.publish(&change)
    }

    /// Backend-side session.
    #[must_use]
    pub fn session(&self) -> Option<Identity> {
        lock(&self.inner.session).clone()
    }

    /// Number of live change subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.events.subscriber_count()
    }

    /// Number of `sign_out` calls so far.
    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.inner.sign_out_calls.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MockIdentityBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockIdentityBackend")
            .field("session", &self.session())
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl IdentityBackend for MockIdentityBackend {
    fn current_session(&self) -> impl Future<Output = Result<Option<Identity>>> + Send {
        let inner = Arc::clone(&self.inner);
        let gate = lock(&self.inner.fetch_gate).clone();

        async move {
            if let Some(mut gate) = gate {
                // A dropped gate counts as open
                let _ = gate.wait_for(|open| *open).await;
            }

            if let Some(error) = lock(&inner.fetch_failure).clone() {
                return Err(error);
            }
            Ok(lock(&inner.session).clone())
        }
    }

    fn subscribe(&self) -> AuthSubscription {
        if self.inner.initial_event.load(Ordering::SeqCst) {
            let initial = AuthStateChange::new(AuthChangeEvent::InitialSession, self.session());
            self.inner.events.subscribe_with_initial(initial)
        } else {
            self.inner.events.subscribe()
        }
    }

    fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Identity>> + Send {
        let inner = Arc::clone(&self.inner);
        let credentials = credentials.clone();

        async move {
            let identity = match lock(&inner.users).get(&credentials.email) {
                Some((password, identity)) if *password == credentials.password => identity.clone(),
                _ => return Err(AuthError::backend("Invalid login credentials")),
            };

            *lock(&inner.session) = Some(identity.clone());
            inner.events.publish(&AuthStateChange::signed_in(identity.clone()));
            Ok(identity)
        }
    }

    fn sign_up(&self, credentials: &Credentials) -> impl Future<Output = Result<SignUpOutcome>> + Send {
        let inner = Arc::clone(&self.inner);
        let credentials = credentials.clone();

        async move {
            let identity = {
                let mut users = lock(&inner.users);
                if users.contains_key(&credentials.email) {
                    return Err(AuthError::backend("User already registered"));
                }
                let identity = Identity::new(uuid::Uuid::new_v4().to_string(), credentials.email.clone());
                users.insert(credentials.email, (credentials.password, identity.clone()));
                identity
            };

            let confirmation_required = !inner.auto_confirm.load(Ordering::SeqCst);
            if !confirmation_required {
                *lock(&inner.session) = Some(identity.clone());
                inner.events.publish(&AuthStateChange::signed_in(identity.clone()));
            }

            Ok(SignUpOutcome {
                identity: Some(identity),
                confirmation_required,
            })
        }
    }

    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            inner.sign_out_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(error) = lock(&inner.sign_out_failure).clone() {
                return Err(error);
            }

            *lock(&inner.session) = None;
            if !inner.silent_sign_out.load(Ordering::SeqCst) {
                inner.events.publish(&AuthStateChange::signed_out());
            }
            Ok(())
        }
    }
}
