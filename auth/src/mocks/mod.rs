//! Mock provider implementations for testing.
//!
//! In-memory implementations of the provider traits for unit and
//! integration tests.

pub mod data;
pub mod identity;

pub use data::MockDataBackend;
pub use identity::MockIdentityBackend;
