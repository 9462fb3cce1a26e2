//! Integration tests for Store action broadcasting
//!
//! Observers of the action broadcast read state on receipt, so an action
//! must be reduced before it is broadcast. A receiver that falls behind is
//! told how much it missed.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;
use storefront_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use storefront_runtime::{Store, StoreConfig, StoreError};
use tokio::sync::broadcast::error::RecvError;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Request answered after `delay_ms`
    Request { id: u64, delay_ms: u64 },
    /// Answer to a request
    Answered { id: u64 },
    /// Burst of `count` answers
    Burst { count: u64 },
}

#[derive(Debug, Clone, Default)]
struct TestState {
    answered: Vec<u64>,
}

#[derive(Clone)]
struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Request { id, delay_ms } => {
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Some(TestAction::Answered { id })
                }))]
            },
            TestAction::Answered { id } => {
                state.answered.push(id);
                SmallVec::new()
            },
            TestAction::Burst { count } => (0..count)
                .map(|id| Effect::Future(Box::pin(async move { Some(TestAction::Answered { id }) })))
                .collect(),
        }
    }
}

/// Wait until every spawned effect has finished, broadcast included.
async fn wait_for_idle(store: &Store<TestState, TestAction, (), TestReducer>) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while store.pending_effects() > 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn answer_is_reduced_before_broadcast() {
    let store = Store::new(TestState::default(), TestReducer, ());
    let mut rx = store.subscribe_actions();

    store
        .send(TestAction::Request { id: 7, delay_ms: 5 })
        .await
        .unwrap();
    let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(received, TestAction::Answered { id: 7 });
    assert_eq!(store.state(|s| s.answered.clone()).await, vec![7]);
}

/// Answers arrive in completion order, not send order.
#[tokio::test]
async fn answers_arrive_as_effects_finish() {
    let store = Store::new(TestState::default(), TestReducer, ());
    let mut rx = store.subscribe_actions();

    store
        .send(TestAction::Request { id: 1, delay_ms: 40 })
        .await
        .unwrap();
    store
        .send(TestAction::Request { id: 2, delay_ms: 1 })
        .await
        .unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first, TestAction::Answered { id: 2 });
    assert_eq!(second, TestAction::Answered { id: 1 });
}

#[tokio::test]
async fn send_after_shutdown_is_rejected() {
    let store = Store::new(TestState::default(), TestReducer, ());
    store.shutdown(Duration::from_secs(1)).await.unwrap();

    let result = store.send(TestAction::Request { id: 4, delay_ms: 0 }).await;

    assert_eq!(result, Err(StoreError::ShutdownInProgress));
}

/// Direct sends are reduced but not broadcast.
#[tokio::test]
async fn only_effect_actions_are_broadcast() {
    let store = Store::new(TestState::default(), TestReducer, ());
    let mut rx = store.subscribe_actions();

    store.send(TestAction::Answered { id: 9 }).await.unwrap();
    store
        .send(TestAction::Request { id: 10, delay_ms: 0 })
        .await
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, TestAction::Answered { id: 10 });
}

/// A receiver that falls behind learns how many actions it lost.
#[tokio::test]
async fn lagging_receiver_is_told_what_it_missed() {
    let store = Store::with_config(
        TestState::default(),
        TestReducer,
        (),
        StoreConfig::default().with_broadcast_capacity(2),
    );
    let mut rx = store.subscribe_actions();

    store.send(TestAction::Burst { count: 8 }).await.unwrap();
    wait_for_idle(&store).await;

    assert_eq!(store.state(|s| s.answered.len()).await, 8);
    assert_eq!(rx.recv().await, Err(RecvError::Lagged(6)));
    assert!(rx.recv().await.is_ok());
    assert!(rx.recv().await.is_ok());
    assert_eq!(rx.try_recv(), Err(tokio::sync::broadcast::error::TryRecvError::Empty));
}
