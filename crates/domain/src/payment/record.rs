//! The backend's persisted view of one order payment.

use chrono::{DateTime, Utc};
use common::OrderRef;
use serde::{Deserialize, Serialize};

use super::{OrderStatus, PaymentStatus, RecordError};

/// Input for registering a freshly placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentRecord {
    pub order_ref: OrderRef,
    pub amount_cents: Option<i64>,
}

impl NewPaymentRecord {
    pub fn new(order_ref: OrderRef) -> Self {
        Self {
            order_ref,
            amount_cents: None,
        }
    }

    pub fn with_amount_cents(mut self, amount_cents: i64) -> Self {
        self.amount_cents = Some(amount_cents);
        self
    }
}

/// The source of truth for one order/payment.
///
/// Only the backend mutates a record. Clients read it through the payment
/// status endpoint and treat `payment_status` as authoritative whenever it
/// is anything other than [`PaymentStatus::Pending`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoritativeRecord {
    pub order_ref: OrderRef,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    /// Internal order row ID, present once the order row exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_db_id: Option<String>,
    /// Backend-side reason for a failed payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AuthoritativeRecord {
    /// Creates a record for an order that has been placed but not paid.
    pub fn pending(new: NewPaymentRecord) -> Self {
        Self {
            order_ref: new.order_ref,
            payment_status: PaymentStatus::Pending,
            order_status: Some(OrderStatus::Pending),
            order_db_id: None,
            message: None,
            amount_cents: new.amount_cents,
            updated_at: Some(Utc::now()),
        }
    }

    /// Moves the payment to `next`.
    ///
    /// Returns `Ok(false)` when the record is already in `next`, which keeps
    /// duplicate webhooks and repeated confirmations harmless.
    pub fn apply_status(
        &mut self,
        next: PaymentStatus,
        message: Option<String>,
    ) -> Result<bool, RecordError> {
        if self.payment_status == next {
            return Ok(false);
        }
        if !self.payment_status.can_transition_to(next) {
            return Err(RecordError::InvalidTransition {
                from: self.payment_status,
                to: next,
            });
        }

        self.payment_status = next;
        match next {
            PaymentStatus::Paid => {
                self.order_status = Some(OrderStatus::Confirmed);
                self.message = None;
            }
            PaymentStatus::Failed | PaymentStatus::Refunded => {
                self.order_status = Some(OrderStatus::Cancelled);
                self.message = message;
            }
            PaymentStatus::Pending => {}
        }
        self.updated_at = Some(Utc::now());
        Ok(true)
    }

    /// Returns true if the backend has reached a verdict on the payment.
    pub fn is_settled(&self) -> bool {
        self.payment_status != PaymentStatus::Pending
    }
}
