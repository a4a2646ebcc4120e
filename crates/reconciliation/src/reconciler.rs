//! Status reconciliation.
//!
//! Combines the provider's provisional signal with the backend's record:
//!
//! | Backend record            | Result                                  |
//! |---------------------------|-----------------------------------------|
//! | `paid`                    | `Success`                               |
//! | `failed`                  | `Failed` (even if the provider said ok) |
//! | `refunded`                | `Failed`                                |
//! | `pending`, missing, error | provider verdict: success, failed, or `Pending` |

use common::OrderRef;
use domain::{AuthoritativeRecord, CodeVerdict, PaymentStatus, Provider};
use serde::Serialize;

use crate::error::FetchError;
use crate::redirect::{NoSignalReason, ProviderSignal};
use crate::services::status::{ConfirmationHint, StatusFetcher, StatusQuery, StatusResponse};
use crate::state::ReconciliationState;

pub const MSG_ORDER_NOT_FOUND: &str = "Order reference not found";
pub const MSG_PAYMENT_FAILED: &str = "Payment failed";
pub const MSG_PAYMENT_REFUNDED: &str = "Payment was refunded";
pub const MSG_STILL_CONFIRMING: &str =
    "We are still confirming your payment. Check your order status again shortly.";

/// Which source decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The backend record was settled.
    Backend,
    /// The backend had no verdict; the provider's code was used.
    ProviderFallback,
    /// The return URL carried no usable signal.
    MissingSignal,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Backend => "backend",
            Resolution::ProviderFallback => "provider_fallback",
            Resolution::MissingSignal => "missing_signal",
        }
    }
}

/// The result page's view of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationOutcome {
    pub state: ReconciliationState,
    /// Customer-facing explanation for non-success states.
    pub message: Option<String>,
    /// Backend record, for showing order number and status.
    pub record: Option<AuthoritativeRecord>,
    pub order_ref: Option<OrderRef>,
    pub provider: Option<Provider>,
    pub resolution: Resolution,
}

impl ReconciliationOutcome {
    /// Outcome for a return URL without a usable signal.
    pub fn missing_signal(reason: &NoSignalReason) -> Self {
        let provider = match reason {
            NoSignalReason::MissingOrderReference { provider } => Some(*provider),
            _ => None,
        };
        Self {
            state: ReconciliationState::Failed,
            message: Some(MSG_ORDER_NOT_FOUND.to_string()),
            record: None,
            order_ref: None,
            provider,
            resolution: Resolution::MissingSignal,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == ReconciliationState::Success
    }
}

/// Resolves a provider signal against the backend's record.
pub struct Reconciler<F: StatusFetcher> {
    fetcher: F,
}

impl<F: StatusFetcher> Reconciler<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Builds the status query, attaching a confirmation hint when the
    /// provider's code means success under that provider's convention.
    pub fn build_query(signal: &ProviderSignal) -> StatusQuery {
        let confirmation_hint = match (signal.verdict(), &signal.raw_result_code) {
            (CodeVerdict::Success, Some(code)) => Some(ConfirmationHint {
                provider: signal.provider,
                result_code: code.clone(),
            }),
            _ => None,
        };
        StatusQuery {
            order_ref: signal.transaction_ref.clone(),
            confirmation_hint,
        }
    }

    /// Runs one reconciliation. Never fails: fetch errors fall back to the
    /// provider's signal.
    #[tracing::instrument(
        skip(self, signal),
        fields(order_ref = %signal.transaction_ref, provider = %signal.provider)
    )]
    pub async fn reconcile(&self, signal: &ProviderSignal) -> ReconciliationOutcome {
        metrics::counter!("reconciliation_runs_total").increment(1);
        let start = std::time::Instant::now();

        let query = Self::build_query(signal);
        let response = self.fetcher.fetch_status(&query).await;
        let outcome = resolve(signal, response);

        metrics::histogram!("reconciliation_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        metrics::counter!(
            "reconciliation_outcomes_total",
            "state" => outcome.state.as_str(),
            "resolution" => outcome.resolution.as_str()
        )
        .increment(1);
        tracing::info!(
            state = %outcome.state,
            resolution = outcome.resolution.as_str(),
            "reconciliation finished"
        );

        outcome
    }
}

/// Applies the precedence rule to a fetch result.
pub fn resolve(
    signal: &ProviderSignal,
    response: Result<StatusResponse, FetchError>,
) -> ReconciliationOutcome {
    let record = match response {
        Ok(response) => response.into_record(),
        Err(e) => {
            metrics::counter!("reconciliation_fetch_errors_total").increment(1);
            tracing::warn!(error = %e, "status fetch failed, using provider signal");
            None
        }
    };

    let (state, message, resolution) = match &record {
        Some(record) => match record.payment_status {
            PaymentStatus::Paid => (ReconciliationState::Success, None, Resolution::Backend),
            PaymentStatus::Failed => (
                ReconciliationState::Failed,
                Some(
                    record
                        .message
                        .clone()
                        .unwrap_or_else(|| provider_failure_message(signal)),
                ),
                Resolution::Backend,
            ),
            PaymentStatus::Refunded => (
                ReconciliationState::Failed,
                Some(MSG_PAYMENT_REFUNDED.to_string()),
                Resolution::Backend,
            ),
            PaymentStatus::Pending => provider_fallback(signal),
        },
        None => provider_fallback(signal),
    };

    ReconciliationOutcome {
        state,
        message,
        record,
        order_ref: Some(signal.transaction_ref.clone()),
        provider: Some(signal.provider),
        resolution,
    }
}

/// Reads the provider's own verdict when the backend has none.
fn provider_fallback(signal: &ProviderSignal) -> (ReconciliationState, Option<String>, Resolution) {
    let (state, message) = match signal.verdict() {
        CodeVerdict::Success => (ReconciliationState::Success, None),
        CodeVerdict::Failure => (
            ReconciliationState::Failed,
            Some(provider_failure_message(signal)),
        ),
        CodeVerdict::Indeterminate => (
            ReconciliationState::Pending,
            Some(MSG_STILL_CONFIRMING.to_string()),
        ),
    };
    (state, message, Resolution::ProviderFallback)
}

/// Provider message, else the provider's description of its code, else a generic text.
fn provider_failure_message(signal: &ProviderSignal) -> String {
    signal
        .message
        .clone()
        .or_else(|| {
            signal
                .raw_result_code
                .as_deref()
                .and_then(|code| signal.provider.describe(code))
                .map(str::to_string)
        })
        .unwrap_or_else(|| MSG_PAYMENT_FAILED.to_string())
}
