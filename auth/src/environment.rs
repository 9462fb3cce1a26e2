//! Session environment.
//!
//! Dependencies injected into the session reducer.

use crate::providers::IdentityBackend;
use crate::replies::PendingReplies;
use std::sync::Arc;
use storefront_core::environment::{Clock, SystemClock};

/// Session environment.
///
/// # Type Parameters
///
/// - `B`: Identity backend
#[derive(Clone)]
pub struct SessionEnvironment<B>
where
    B: IdentityBackend + Clone,
{
    /// Identity backend.
    pub backend: B,

    /// Time source for `updated_at`.
    pub clock: Arc<dyn Clock>,

    /// Callers waiting for backend answers.
    pub replies: PendingReplies,
}

impl<B> SessionEnvironment<B>
where
    B: IdentityBackend + Clone,
{
    /// Environment using the wall clock.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            replies: PendingReplies::new(),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}
