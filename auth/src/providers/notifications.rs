//! Auth change fan-out.
//!
//! [`AuthEventHub`] delivers each published [`AuthStateChange`] to every live
//! [`AuthSubscription`], in publish order. Subscriptions deregister when
//! unsubscribed or dropped.

use crate::state::AuthStateChange;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    senders: HashMap<u64, mpsc::UnboundedSender<AuthStateChange>>,
}

fn lock(subscribers: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    match subscribers.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Subscriber registry for auth change notifications.
#[derive(Clone, Default)]
pub struct AuthEventHub {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl AuthEventHub {
    /// Empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        self.register(None)
    }

    /// Register a new subscriber whose first notification is `initial`.
    ///
    /// `initial` is queued before the subscriber becomes visible to
    /// [`publish`](Self::publish), so nothing can overtake it.
    #[must_use]
    pub fn subscribe_with_initial(&self, initial: AuthStateChange) -> AuthSubscription {
        self.register(Some(initial))
    }

    fn register(&self, initial: Option<AuthStateChange>) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(change) = initial {
            let _ = tx.send(change);
        }

        let id = {
            let mut subscribers = lock(&self.subscribers);
            let id = subscribers.next_id;
            subscribers.next_id += 1;
            subscribers.senders.insert(id, tx);
            id
        };

        tracing::debug!(subscription_id = id, "Auth change subscriber registered");

        AuthSubscription {
            id,
            receiver: rx,
            hub: Arc::downgrade(&self.subscribers),
            active: true,
        }
    }

    /// Deliver `change` to every live subscriber.
    ///
    /// Returns the number of subscribers it was delivered to.
    pub fn publish(&self, change: &AuthStateChange) -> usize {
        let mut subscribers = lock(&self.subscribers);
        subscribers
            .senders
            .retain(|_, sender| sender.send(change.clone()).is_ok());
        let delivered = subscribers.senders.len();
        drop(subscribers);

        tracing::debug!(event = ?change.event, delivered, "Published auth change");
        delivered
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).senders.len()
    }
}

impl std::fmt::Debug for AuthEventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEventHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Live subscription to auth change notifications.
///
/// A `Stream` of [`AuthStateChange`]. Ends after [`unsubscribe`](Self::unsubscribe)
/// once already-queued notifications are drained.
#[derive(Debug)]
pub struct AuthSubscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<AuthStateChange>,
    hub: Weak<Mutex<Subscribers>>,
    active: bool,
}

impl AuthSubscription {
    /// Stop receiving notifications. Idempotent.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(subscribers) = self.hub.upgrade() {
            lock(&subscribers).senders.remove(&self.id);
        }
        self.receiver.close();

        tracing::debug!(subscription_id = self.id, "Auth change subscriber removed");
    }

    /// Returns `true` until unsubscribed.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

impl Stream for AuthSubscription {
    type Item = AuthStateChange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
