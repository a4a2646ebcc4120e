//! Authoritative status lookup: the query, the response, and fetchers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use common::OrderRef;
use domain::{AuthoritativeRecord, PaymentRecordStore, Provider};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Tells the backend the provider already reported success, so it may
/// finalize the record now instead of waiting for the provider's webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationHint {
    pub provider: Provider,
    pub result_code: String,
}

impl ConfirmationHint {
    /// Query parameters appended to the status request.
    pub fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("confirm", "true"),
            ("provider", self.provider.as_str()),
            ("resultCode", self.result_code.as_str()),
        ]
    }
}

/// A status lookup keyed by order reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusQuery {
    pub order_ref: OrderRef,
    pub confirmation_hint: Option<ConfirmationHint>,
}

/// Body of the backend payment-status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AuthoritativeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn found(record: AuthoritativeRecord) -> Self {
        Self {
            success: true,
            data: Some(record),
            error: None,
        }
    }

    pub fn not_found(order_ref: &OrderRef) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(format!("Order {order_ref} not found")),
        }
    }

    /// The record, if the backend reported one.
    pub fn into_record(self) -> Option<AuthoritativeRecord> {
        if self.success { self.data } else { None }
    }
}

/// Fetches the backend's authoritative record for an order.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(&self, query: &StatusQuery) -> Result<StatusResponse, FetchError>;
}

#[async_trait]
impl<T: StatusFetcher + ?Sized> StatusFetcher for Arc<T> {
    async fn fetch_status(&self, query: &StatusQuery) -> Result<StatusResponse, FetchError> {
        (**self).fetch_status(query).await
    }
}

/// Fetcher that reads straight from a [`PaymentRecordStore`].
///
/// Applies the same confirmation-hint rule as the HTTP endpoint, which makes
/// it the in-process equivalent of the backend.
#[derive(Debug, Clone)]
pub struct StoreStatusFetcher<S: PaymentRecordStore> {
    store: S,
}

impl<S: PaymentRecordStore> StoreStatusFetcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: PaymentRecordStore> StatusFetcher for StoreStatusFetcher<S> {
    async fn fetch_status(&self, query: &StatusQuery) -> Result<StatusResponse, FetchError> {
        let hint = query
            .confirmation_hint
            .as_ref()
            .map(|hint| (hint.provider, hint.result_code.as_str()));

        let record = self
            .store
            .lookup_with_confirmation(&query.order_ref, hint)
            .await
            .map_err(|e| FetchError::Backend(e.to_string()))?;

        Ok(match record {
            Some(record) => StatusResponse::found(record),
            None => StatusResponse::not_found(&query.order_ref),
        })
    }
}

#[derive(Debug, Default)]
struct InMemoryFetcherState {
    responses: HashMap<OrderRef, StatusResponse>,
    queries: Vec<StatusQuery>,
    fail_on_fetch: bool,
}

/// Scripted status fetcher for testing.
///
/// Returns whatever response was registered for an order reference and
/// records every query it receives.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusFetcher {
    state: Arc<Mutex<InMemoryFetcherState>>,
}

impl InMemoryStatusFetcher {
    /// Creates a fetcher that knows no orders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `record` for its order reference.
    pub fn set_record(&self, record: AuthoritativeRecord) {
        let mut state = self.lock();
        state
            .responses
            .insert(record.order_ref.clone(), StatusResponse::found(record));
    }

    /// Serves an arbitrary response for an order reference.
    pub fn set_response(&self, order_ref: OrderRef, response: StatusResponse) {
        self.lock().responses.insert(order_ref, response);
    }

    /// Configures every fetch to fail as if the backend were unreachable.
    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.lock().fail_on_fetch = fail;
    }

    /// Returns the queries received so far.
    pub fn queries(&self) -> Vec<StatusQuery> {
        self.lock().queries.clone()
    }

    /// Returns the number of fetches made.
    pub fn fetch_count(&self) -> usize {
        self.lock().queries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryFetcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StatusFetcher for InMemoryStatusFetcher {
    async fn fetch_status(&self, query: &StatusQuery) -> Result<StatusResponse, FetchError> {
        let mut state = self.lock();
        state.queries.push(query.clone());

        if state.fail_on_fetch {
            return Err(FetchError::Transport("connection refused".to_string()));
        }

        Ok(state
            .responses
            .get(&query.order_ref)
            .cloned()
            .unwrap_or_else(|| StatusResponse::not_found(&query.order_ref)))
    }
}
