//! Reducers.

pub mod session;

pub use session::{SUBSCRIPTION, SessionReducer};
