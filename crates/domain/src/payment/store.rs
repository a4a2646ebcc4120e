//! Payment record storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderRef;
use tokio::sync::RwLock;

use super::{AuthoritativeRecord, NewPaymentRecord, PaymentStatus, RecordError};
use crate::error::{DomainError, Result};
use crate::provider::Provider;

/// Backend storage for authoritative payment records.
#[async_trait]
pub trait PaymentRecordStore: Send + Sync {
    /// Registers a new pending record.
    async fn create(&self, new: NewPaymentRecord) -> Result<AuthoritativeRecord>;

    /// Loads the record for an order reference.
    async fn get(&self, order_ref: &OrderRef) -> Result<Option<AuthoritativeRecord>>;

    /// Moves a record to a new payment status and returns the updated record.
    async fn update_status(
        &self,
        order_ref: &OrderRef,
        status: PaymentStatus,
        message: Option<String>,
    ) -> Result<AuthoritativeRecord>;

    /// Loads a record, first finalizing it as paid when the caller relays a
    /// provider result code that means success and the record is still pending.
    ///
    /// A settled record is never changed by a relayed code. If the record
    /// settles between the read and the update, the settled record is
    /// returned instead of the transition error.
    async fn lookup_with_confirmation(
        &self,
        order_ref: &OrderRef,
        hint: Option<(Provider, &str)>,
    ) -> Result<Option<AuthoritativeRecord>> {
        let Some(record) = self.get(order_ref).await? else {
            return Ok(None);
        };
        if record.payment_status != PaymentStatus::Pending || !hint_confirms(hint) {
            return Ok(Some(record));
        }

        tracing::info!(%order_ref, "finalizing payment from confirmation hint");
        match self.update_status(order_ref, PaymentStatus::Paid, None).await {
            Ok(record) => Ok(Some(record)),
            Err(DomainError::Record(RecordError::InvalidTransition { from, .. })) => {
                tracing::info!(%order_ref, %from, "payment settled during confirmation");
                self.get(order_ref).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Returns true if the relayed code means success for its provider.
fn hint_confirms(hint: Option<(Provider, &str)>) -> bool {
    hint.is_some_and(|(provider, code)| provider.is_success(Some(code)))
}

#[derive(Debug, Default)]
struct InMemoryRecords {
    records: HashMap<OrderRef, AuthoritativeRecord>,
    next_db_id: u64,
}

/// In-memory payment record store.
///
/// Order rows are numbered sequentially the first time a payment is marked
/// paid, mirroring an order table that is only written after confirmation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentRecordStore {
    inner: Arc<RwLock<InMemoryRecords>>,
}

impl InMemoryPaymentRecordStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn record_count(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

#[async_trait]
impl PaymentRecordStore for InMemoryPaymentRecordStore {
    async fn create(&self, new: NewPaymentRecord) -> Result<AuthoritativeRecord> {
        let mut inner = self.inner.write().await;
        if inner.records.contains_key(&new.order_ref) {
            return Err(DomainError::DuplicateOrderRef(new.order_ref));
        }

        let record = AuthoritativeRecord::pending(new);
        inner
            .records
            .insert(record.order_ref.clone(), record.clone());
        tracing::debug!(order_ref = %record.order_ref, "payment record created");
        Ok(record)
    }

    async fn get(&self, order_ref: &OrderRef) -> Result<Option<AuthoritativeRecord>> {
        Ok(self.inner.read().await.records.get(order_ref).cloned())
    }

    async fn update_status(
        &self,
        order_ref: &OrderRef,
        status: PaymentStatus,
        message: Option<String>,
    ) -> Result<AuthoritativeRecord> {
        self.inner
            .write()
            .await
            .apply_status(order_ref, status, message)
    }

    /// Checks and finalizes under one write lock, so a webhook cannot
    /// settle the record in between.
    async fn lookup_with_confirmation(
        &self,
        order_ref: &OrderRef,
        hint: Option<(Provider, &str)>,
    ) -> Result<Option<AuthoritativeRecord>> {
        let mut inner = self.inner.write().await;
        let Some(status) = inner.records.get(order_ref).map(|r| r.payment_status) else {
            return Ok(None);
        };

        if status == PaymentStatus::Pending && hint_confirms(hint) {
            tracing::info!(%order_ref, "finalizing payment from confirmation hint");
            inner
                .apply_status(order_ref, PaymentStatus::Paid, None)
                .map(Some)
        } else {
            Ok(inner.records.get(order_ref).cloned())
        }
    }
}

impl InMemoryRecords {
    fn apply_status(
        &mut self,
        order_ref: &OrderRef,
        status: PaymentStatus,
        message: Option<String>,
    ) -> Result<AuthoritativeRecord> {
        let Self {
            records,
            next_db_id,
        } = self;

        let record = records
            .get_mut(order_ref)
            .ok_or_else(|| DomainError::RecordNotFound(order_ref.clone()))?;

        if record.apply_status(status, message)? {
            if status == PaymentStatus::Paid && record.order_db_id.is_none() {
                *next_db_id += 1;
                record.order_db_id = Some(next_db_id.to_string());
            }
            metrics::counter!("payment_records_finalized_total", "status" => status.as_str())
                .increment(1);
            tracing::info!(%order_ref, %status, "payment record updated");
        }
        Ok(record.clone())
    }
}
