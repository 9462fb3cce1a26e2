//! Session reducer.
//!
//! Owns the session view. The identity changes only through the initial
//! fetch and backend notifications; sign-in, sign-up and sign-out requests
//! are forwarded to the backend and their answers leave the view alone.
//!
//! # Flow
//!
//! 1. `Start` fetches the current session and subscribes to changes
//! 2. `SessionFetched` and `AuthStateChanged` both replace the identity
//!    and mark the view ready; there is no ordering between them
//! 3. `Teardown` cancels the subscription; later updates are ignored

use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::providers::IdentityBackend;
use crate::state::{Identity, SessionState};
use futures::StreamExt;
use storefront_core::effect::{Effect, EffectId};
use storefront_core::reducer::Reducer;
use storefront_core::{SmallVec, async_effect, smallvec, stream_effect};

/// Cancellation id of the auth change subscription.
pub const SUBSCRIPTION: EffectId = EffectId::new("auth-state-subscription");

/// Session reducer.
#[derive(Debug, Clone)]
pub struct SessionReducer<B> {
    _phantom: std::marker::PhantomData<B>,
}

impl<B> SessionReducer<B> {
    /// Create a new session reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<B> Default for SessionReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SessionReducer<B>
where
    B: IdentityBackend + Clone + 'static,
{
    fn apply(state: &mut SessionState, identity: Option<Identity>, env: &SessionEnvironment<B>) {
        state.identity = identity;
        state.ready = true;
        state.updated_at = Some(env.clock.now());
    }

    fn fetch_session(env: &SessionEnvironment<B>) -> Effect<SessionAction> {
        let backend = env.backend.clone();
        async_effect! {
            let identity = match backend.current_session().await {
                Ok(identity) => identity,
                Err(error) => {
                    tracing::warn!(error = %error, "Session fetch failed, treating as signed out");
                    None
                },
            };
            Some(SessionAction::SessionFetched { identity })
        }
    }

    fn subscribe(env: &SessionEnvironment<B>) -> Effect<SessionAction> {
        let backend = env.backend.clone();
        // Subscribe on first poll so the reducer itself stays free of I/O
        let changes = futures::stream::once(async move { backend.subscribe() })
            .flatten()
            .map(|change| SessionAction::AuthStateChanged { change });
        stream_effect!(changes).cancellable(SUBSCRIPTION)
    }
}

impl<B> Reducer for SessionReducer<B>
where
    B: IdentityBackend + Clone + 'static,
{
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<B>;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Start: fetch + subscribe, once
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Start => {
                if state.started || state.torn_down {
                    tracing::debug!("Session already started, ignoring Start");
                    return SmallVec::new();
                }
                state.started = true;
                tracing::info!("Starting session coordinator");

                smallvec![Self::fetch_session(env), Self::subscribe(env)]
            },

            // ═══════════════════════════════════════════════════════════════
            // Resolution: last writer wins
            // ═══════════════════════════════════════════════════════════════
            SessionAction::SessionFetched { identity } => {
                if state.torn_down {
                    tracing::debug!("Session fetch resolved after teardown, ignoring");
                    return SmallVec::new();
                }
                tracing::debug!(signed_in = identity.is_some(), "Initial session resolved");
                Self::apply(state, identity, env);
                SmallVec::new()
            },

            SessionAction::AuthStateChanged { change } => {
                if state.torn_down {
                    tracing::debug!(event = ?change.event, "Auth change after teardown, ignoring");
                    return SmallVec::new();
                }
                tracing::debug!(
                    event = ?change.event,
                    signed_in = change.identity.is_some(),
                    "Auth state changed"
                );
                Self::apply(state, change.identity, env);
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Requests: delegate to the backend, reply by correlation id
            // ═══════════════════════════════════════════════════════════════
            SessionAction::SignInRequested {
                correlation_id,
                credentials,
            } => {
                let backend = env.backend.clone();
                let replies = env.replies.clone();
                smallvec![async_effect! {
                    let answer = match backend.sign_in_with_password(&credentials).await {
                        Ok(identity) => SessionAction::SignInSucceeded {
                            correlation_id,
                            identity,
                        },
                        Err(error) => SessionAction::SignInFailed {
                            correlation_id,
                            error,
                        },
                    };
                    replies.complete(&answer);
                    Some(answer)
                }]
            },

            SessionAction::SignUpRequested {
                correlation_id,
                credentials,
            } => {
                let backend = env.backend.clone();
                let replies = env.replies.clone();
                smallvec![async_effect! {
                    let answer = match backend.sign_up(&credentials).await {
                        Ok(outcome) => SessionAction::SignUpSucceeded {
                            correlation_id,
                            outcome,
                        },
                        Err(error) => SessionAction::SignUpFailed {
                            correlation_id,
                            error,
                        },
                    };
                    replies.complete(&answer);
                    Some(answer)
                }]
            },

            SessionAction::SignOutRequested { correlation_id } => {
                let backend = env.backend.clone();
                let replies = env.replies.clone();
                smallvec![async_effect! {
                    let answer = match backend.sign_out().await {
                        Ok(()) => SessionAction::SignOutSucceeded { correlation_id },
                        Err(error) => SessionAction::SignOutFailed {
                            correlation_id,
                            error,
                        },
                    };
                    replies.complete(&answer);
                    Some(answer)
                }]
            },

            // Answers were already delivered to the caller; the view follows notifications only
            SessionAction::SignInSucceeded { correlation_id, .. }
            | SessionAction::SignUpSucceeded { correlation_id, .. }
            | SessionAction::SignOutSucceeded { correlation_id } => {
                tracing::debug!(%correlation_id, "Backend request succeeded");
                SmallVec::new()
            },

            SessionAction::SignInFailed {
                correlation_id,
                error,
            }
            | SessionAction::SignUpFailed {
                correlation_id,
                error,
            }
            | SessionAction::SignOutFailed {
                correlation_id,
                error,
            } => {
                tracing::warn!(%correlation_id, error = %error, "Backend request failed");
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Teardown: cancel the subscription, freeze the view
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Teardown => {
                if state.torn_down {
                    return SmallVec::new();
                }
                state.torn_down = true;
                tracing::info!("Tearing down session coordinator");
                smallvec![Effect::Cancel(SUBSCRIPTION)]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::mocks::MockIdentityBackend;
    use storefront_core::environment::Clock;
    use crate::state::{AuthChangeEvent, AuthStateChange, Credentials};
    use proptest::prelude::*;
    use storefront_testing::{ReducerTest, assertions, test_clock};
    use uuid::Uuid;

    fn test_env() -> SessionEnvironment<MockIdentityBackend> {
        SessionEnvironment::new(MockIdentityBackend::new()).with_clock(test_clock())
    }

    fn alice() -> Identity {
        Identity::new("user-alice", "alice@example.com")
    }

    #[test]
    fn start_fetches_and_subscribes() {
        ReducerTest::new(SessionReducer::new())
            .with_env(test_env())
            .given_state(SessionState::default())
            .when_action(SessionAction::Start)
            .then_state(|state| {
                assert!(state.started);
                assert!(!state.ready);
                assert!(state.identity.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_future_effect(effects);
                assertions::assert_has_stream_effect(effects);
                assertions::assert_has_cancellable_effect(effects, SUBSCRIPTION);
            })
            .run();
    }

    #[test]
    fn second_start_is_a_no_op() {
        ReducerTest::new(SessionReducer::new())
            .with_env(test_env())
            .given_state(SessionState {
                started: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::Start)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn fetch_resolution_marks_ready() {
        ReducerTest::new(SessionReducer::new())
            .with_env(test_env())
            .given_state(SessionState {
                started: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::SessionFetched {
                identity: Some(alice()),
            })
            .then_state(|state| {
                assert!(state.ready);
                assert_eq!(state.identity, Some(alice()));
                assert_eq!(state.updated_at, Some(test_clock().now()));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn signed_out_notification_clears_identity() {
        ReducerTest::new(SessionReducer::new())
            .with_env(test_env())
            .given_state(SessionState {
                identity: Some(alice()),
                ready: true,
                started: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::AuthStateChanged {
                change: AuthStateChange::signed_out(),
            })
            .then_state(|state| {
                assert!(state.ready);
                assert!(state.identity.is_none());
            })
            .run();
    }

    #[test]
    fn teardown_cancels_subscription() {
        ReducerTest::new(SessionReducer::new())
            .with_env(test_env())
            .given_state(SessionState {
                started: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::Teardown)
            .then_state(|state| assert!(state.torn_down))
            .then_effects(|effects| assertions::assert_has_cancel_effect(effects, SUBSCRIPTION))
            .run();
    }

    #[test]
    fn late_fetch_after_teardown_is_inert() {
        ReducerTest::new(SessionReducer::new())
            .with_env(test_env())
            .given_state(SessionState {
                started: true,
                torn_down: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::SessionFetched {
                identity: Some(alice()),
            })
            .then_state(|state| {
                assert!(!state.ready);
                assert!(state.identity.is_none());
            })
            .run();
    }

    #[test]
    fn sign_out_request_leaves_view_alone() {
        ReducerTest::new(SessionReducer::new())
            .with_env(test_env())
            .given_state(SessionState {
                identity: Some(alice()),
                ready: true,
                started: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::SignOutRequested {
                correlation_id: Uuid::new_v4(),
            })
            .then_state(|state| assert_eq!(state.identity, Some(alice())))
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn sign_in_success_does_not_touch_view() {
        ReducerTest::new(SessionReducer::new())
            .with_env(test_env())
            .given_state(SessionState {
                ready: true,
                started: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::SignInSucceeded {
                correlation_id: Uuid::new_v4(),
                identity: alice(),
            })
            .then_state(|state| assert!(state.identity.is_none()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn sign_in_effect_reports_backend_message() {
        let env = test_env();
        let mut state = SessionState::default();
        let correlation_id = Uuid::new_v4();

        let mut effects = SessionReducer::new().reduce(
            &mut state,
            SessionAction::SignInRequested {
                correlation_id,
                credentials: Credentials::new("nobody@example.com", "pw"),
            },
            &env,
        );

        let Some(Effect::Future(fut)) = effects.pop() else {
            panic!("expected a future effect");
        };
        assert_eq!(
            fut.await,
            Some(SessionAction::SignInFailed {
                correlation_id,
                error: crate::AuthError::backend("Invalid login credentials"),
            })
        );
    }

    #[tokio::test]
    async fn sign_out_effect_fills_reply_slot() {
        let env = test_env();
        let mut state = SessionState::default();
        let correlation_id = Uuid::new_v4();
        let reply = env.replies.register(correlation_id);

        let mut effects = SessionReducer::new().reduce(
            &mut state,
            SessionAction::SignOutRequested { correlation_id },
            &env,
        );

        let Some(Effect::Future(fut)) = effects.pop() else {
            panic!("expected a future effect");
        };
        let answer = fut.await;
        assert_eq!(answer, Some(SessionAction::SignOutSucceeded { correlation_id }));
        assert_eq!(reply.await.ok(), answer);
        assert!(env.replies.is_empty());
    }

    fn resolution() -> impl Strategy<Value = SessionAction> {
        let identity = prop::option::of("[a-z]{1,8}".prop_map(|id| Identity::new(id, "x@example.com")));
        (any::<bool>(), identity).prop_map(|(fetched, identity)| {
            if fetched {
                SessionAction::SessionFetched { identity }
            } else {
                SessionAction::AuthStateChanged {
                    change: AuthStateChange::new(AuthChangeEvent::UserUpdated, identity),
                }
            }
        })
    }

    proptest! {
        #[test]
        fn ready_never_reverts(actions in prop::collection::vec(resolution(), 1..20)) {
            let env = test_env();
            let reducer = SessionReducer::new();
            let mut state = SessionState::default();
            let _ = reducer.reduce(&mut state, SessionAction::Start, &env);

            prop_assert!(!state.ready);
            for action in actions {
                let _ = reducer.reduce(&mut state, action, &env);
                prop_assert!(state.ready);
            }
        }

        #[test]
        fn nothing_changes_after_teardown(actions in prop::collection::vec(resolution(), 0..20)) {
            let env = test_env();
            let reducer = SessionReducer::new();
            let mut state = SessionState::default();
            let _ = reducer.reduce(&mut state, SessionAction::Start, &env);
            let _ = reducer.reduce(&mut state, SessionAction::Teardown, &env);
            let before = state.view();

            for action in actions {
                let _ = reducer.reduce(&mut state, action, &env);
            }
            prop_assert_eq!(state.view(), before);
        }
    }
}
