//! Redirect interpretation.
//!
//! Turns the query string of the payment return URL into a provisional,
//! untrusted [`ProviderSignal`]. Parsing is pure: nothing here talks to the
//! backend or touches page state.

use common::OrderRef;
use domain::provider::{CodeVerdict, Provider, momo, vnpay};
use thiserror::Error;

/// The untrusted outcome a provider embedded in its return redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSignal {
    pub provider: Provider,
    /// Merchant order reference echoed by the provider. Never empty.
    pub transaction_ref: OrderRef,
    /// Provider-specific result code. `None` is indeterminate, not a failure.
    pub raw_result_code: Option<String>,
    /// Provider-supplied text, shown to the customer only as a fallback.
    pub message: Option<String>,
}

impl ProviderSignal {
    /// Classifies the result code under this signal's own provider convention.
    pub fn verdict(&self) -> CodeVerdict {
        self.provider.classify(self.raw_result_code.as_deref())
    }
}

/// Why a return URL produced no usable signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoSignalReason {
    #[error("No payment provider parameters in the return URL")]
    NoProviderParameters,

    #[error("Missing order reference in {provider} return URL")]
    MissingOrderReference { provider: Provider },

    #[error("Malformed return URL query: {0}")]
    MalformedQuery(String),
}

/// Result of interpreting a return URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Signal(ProviderSignal),
    NoSignal(NoSignalReason),
}

impl RedirectOutcome {
    /// Returns the signal, if one was found.
    pub fn signal(&self) -> Option<&ProviderSignal> {
        match self {
            RedirectOutcome::Signal(signal) => Some(signal),
            RedirectOutcome::NoSignal(_) => None,
        }
    }
}

struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn has_key(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    fn has_key_prefix(&self, prefix: &str) -> bool {
        self.0.iter().any(|(key, _)| key.starts_with(prefix))
    }

    /// First non-blank value for `name`, trimmed.
    fn value(&self, name: &str) -> Option<String> {
        self.0
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Interprets the raw query string of the payment return URL.
///
/// VNPay is recognized by any `vnp_`-prefixed parameter, MoMo by `orderId`.
/// VNPay wins when both are present. A leading `?` is accepted.
pub fn interpret(query: &str) -> RedirectOutcome {
    let query = query.strip_prefix('?').unwrap_or(query);
    let params = match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => QueryParams(pairs),
        Err(e) => return RedirectOutcome::NoSignal(NoSignalReason::MalformedQuery(e.to_string())),
    };

    if params.has_key_prefix(vnpay::PARAM_PREFIX) {
        return build_signal(
            Provider::Vnpay,
            params.value(vnpay::PARAM_TXN_REF),
            params.value(vnpay::PARAM_RESPONSE_CODE),
            None,
        );
    }

    if params.has_key(momo::PARAM_ORDER_ID) {
        return build_signal(
            Provider::Momo,
            params.value(momo::PARAM_ORDER_ID),
            params.value(momo::PARAM_RESULT_CODE),
            params.value(momo::PARAM_MESSAGE),
        );
    }

    RedirectOutcome::NoSignal(NoSignalReason::NoProviderParameters)
}

fn build_signal(
    provider: Provider,
    reference: Option<String>,
    raw_result_code: Option<String>,
    message: Option<String>,
) -> RedirectOutcome {
    match reference.and_then(OrderRef::parse) {
        Some(transaction_ref) => RedirectOutcome::Signal(ProviderSignal {
            provider,
            transaction_ref,
            raw_result_code,
            message,
        }),
        None => RedirectOutcome::NoSignal(NoSignalReason::MissingOrderReference { provider }),
    }
}
