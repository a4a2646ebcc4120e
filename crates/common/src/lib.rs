//! Shared identifiers for the payment reconciliation workspace.

pub mod types;

pub use types::{OrderRef, SessionId};
