//! Domain error types.

use common::OrderRef;
use thiserror::Error;

use crate::payment::RecordError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A record rejected the requested change.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// No payment record exists for the reference.
    #[error("Payment record not found: {0}")]
    RecordNotFound(OrderRef),

    /// A payment record already exists for the reference.
    #[error("Payment record already exists: {0}")]
    DuplicateOrderRef(OrderRef),
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
