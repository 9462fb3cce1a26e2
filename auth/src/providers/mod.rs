//! Backend providers.
//!
//! Traits for every external dependency of the session coordinator and the
//! product read, plus the Supabase implementation of both.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The reducer depends
//! on these traits, and the application wires in a concrete backend:
//!
//! - **Testing**: [`crate::mocks`] (in-memory, deterministic)
//! - **Production**: [`SupabaseClient`] (GoTrue + PostgREST over HTTP)

pub mod data;
pub mod identity;
pub mod notifications;
pub mod supabase;

pub use data::DataBackend;
pub use identity::IdentityBackend;
pub use notifications::{AuthEventHub, AuthSubscription};
pub use supabase::SupabaseClient;
