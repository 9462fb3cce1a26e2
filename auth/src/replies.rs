//! Reply slots for backend requests.
//!
//! A caller registers a slot under its correlation id before sending the
//! request; the effect that talks to the backend fills the slot with the
//! answer. Each answer goes straight to its own caller, so a burst of
//! concurrent requests cannot crowd an answer out.

use crate::actions::SessionAction;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Callers waiting for a backend answer, keyed by correlation id.
///
/// Cheap to clone; clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct PendingReplies {
    slots: Arc<Mutex<HashMap<Uuid, oneshot::Sender<SessionAction>>>>,
}

impl PendingReplies {
    /// Create an empty set of slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a slot for `correlation_id`.
    ///
    /// Registering the same id twice replaces the earlier slot, whose
    /// receiver then sees the sender dropped.
    pub fn register(&self, correlation_id: Uuid) -> oneshot::Receiver<SessionAction> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(correlation_id, tx);
        rx
    }

    /// Deliver `answer` to the caller waiting on its correlation id.
    ///
    /// Returns `false` if `answer` is not a response, nobody is waiting, or
    /// the caller already gave up.
    pub fn complete(&self, answer: &SessionAction) -> bool {
        let Some(correlation_id) = answer.correlation_id() else {
            return false;
        };
        if !answer.is_response_to(correlation_id) {
            return false;
        }

        match self.lock().remove(&correlation_id) {
            Some(tx) => tx.send(answer.clone()).is_ok(),
            None => {
                tracing::debug!(%correlation_id, "No caller waiting for answer");
                false
            },
        }
    }

    /// Drop the slot for `correlation_id`, if any.
    pub fn forget(&self, correlation_id: Uuid) {
        self.lock().remove(&correlation_id);
    }

    /// Number of open slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nobody is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, oneshot::Sender<SessionAction>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
