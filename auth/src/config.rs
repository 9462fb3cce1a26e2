//! Session coordinator configuration.

use std::time::Duration;

/// Session coordinator configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long sign-in, sign-up and sign-out wait for the backend.
    ///
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// How long shutdown waits for in-flight effects.
    ///
    /// Default: 5 seconds
    pub shutdown_timeout: Duration,

    /// Buffered view updates per subscriber.
    ///
    /// Default: 16
    pub update_capacity: usize,
}

impl SessionConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the shutdown timeout.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the update buffer size.
    #[must_use]
    pub const fn with_update_capacity(mut self, capacity: usize) -> Self {
        self.update_capacity = capacity;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            update_capacity: 16,
        }
    }
}
