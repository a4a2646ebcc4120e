//! Authoritative payment records and their storage.

mod record;
mod status;
mod store;

pub use record::{AuthoritativeRecord, NewPaymentRecord};
pub use status::{OrderStatus, PaymentStatus};
pub use store::{InMemoryPaymentRecordStore, PaymentRecordStore};

use thiserror::Error;

/// Errors raised when a record rejects a status change.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The payment is not in a state that allows the requested change.
    #[error("Invalid payment transition: cannot move from {from} to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}
