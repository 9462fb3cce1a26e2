//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod auth;
pub mod health;
pub mod products;

// Re-export common handler utilities
pub use health::{health_check, readiness};
