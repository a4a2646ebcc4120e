//! Domain layer for payment confirmation.
//!
//! This crate provides:
//! - Provider result-code conventions, scoped per payment gateway
//! - The authoritative payment record and its status state machine
//! - The `PaymentRecordStore` trait used by the backend, with an in-memory implementation

pub mod error;
pub mod payment;
pub mod provider;

pub use error::DomainError;
pub use payment::{
    AuthoritativeRecord, InMemoryPaymentRecordStore, NewPaymentRecord, OrderStatus,
    PaymentRecordStore, PaymentStatus, RecordError,
};
pub use provider::{CodeVerdict, Provider};
