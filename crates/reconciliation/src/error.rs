//! Reconciliation error types.

use thiserror::Error;

use crate::state::ReconciliationState;

/// Errors raised while asking the backend for a payment's status.
///
/// The reconciler never surfaces these to callers; any of them sends the
/// reconciliation down the provider-fallback path.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or no response arrived.
    #[error("Status request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status.
    #[error("Status endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body was not a valid status payload.
    #[error("Invalid status response: {0}")]
    Decode(String),

    /// The backend's own storage failed.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The HTTP client could not be built.
    #[error("Invalid fetcher configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Errors raised by a reconciliation session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session has not run yet.
    #[error("Reconciliation has not run yet")]
    NotStarted,

    /// The session is not in a state that allows the requested operation.
    #[error("Cannot {action} while reconciliation is {state}")]
    InvalidState {
        state: ReconciliationState,
        action: &'static str,
    },
}

/// Convenience type alias for session results.
pub type Result<T> = std::result::Result<T, SessionError>;
