//! Payment status lookup and provider webhook endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use domain::{AuthoritativeRecord, PaymentRecordStore, PaymentStatus, Provider};
use reconciliation::StatusResponse;
use serde::Deserialize;

use super::parse_order_ref;
use crate::AppState;
use crate::error::ApiError;

/// Query of the status endpoint. All three fields together form the
/// confirmation hint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParams {
    #[serde(default)]
    pub confirm: bool,
    pub provider: Option<String>,
    pub result_code: Option<String>,
}

impl StatusParams {
    /// The relayed provider code, if the caller asked for confirmation.
    fn hint(&self) -> Result<Option<(Provider, &str)>, ApiError> {
        if !self.confirm {
            return Ok(None);
        }
        let (Some(provider), Some(code)) = (&self.provider, &self.result_code) else {
            tracing::debug!("confirmation requested without provider or result code");
            return Ok(None);
        };
        let provider = provider
            .parse::<Provider>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        Ok(Some((provider, code.as_str())))
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub status: PaymentStatus,
    pub message: Option<String>,
}

/// GET /payments/:order_ref/status: the authoritative payment status.
///
/// An unknown order is reported in the body (`success: false`), not as 404.
#[tracing::instrument(skip(state, params))]
pub async fn status<S: PaymentRecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_ref): Path<String>,
    Query(params): Query<StatusParams>,
) -> Result<Json<StatusResponse>, ApiError> {
    let parsed = parse_order_ref(&order_ref)?;
    let hint = if state.confirmation_hint_enabled {
        params.hint()?
    } else {
        None
    };

    metrics::counter!(
        "payment_status_requests_total",
        "hinted" => if hint.is_some() { "true" } else { "false" }
    )
    .increment(1);

    let record = state.store.lookup_with_confirmation(&parsed, hint).await?;

    Ok(Json(match record {
        Some(record) => StatusResponse::found(record),
        None => StatusResponse::not_found(&parsed),
    }))
}

/// POST /payments/:order_ref/webhook: settle a payment as the provider would.
#[tracing::instrument(skip(state, req))]
pub async fn webhook<S: PaymentRecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_ref): Path<String>,
    Json(req): Json<WebhookRequest>,
) -> Result<Json<AuthoritativeRecord>, ApiError> {
    let parsed = parse_order_ref(&order_ref)?;
    if req.status == PaymentStatus::Pending {
        return Err(ApiError::BadRequest(
            "Webhook status must be paid, failed or refunded".to_string(),
        ));
    }

    let record = state
        .store
        .update_status(&parsed, req.status, req.message)
        .await?;

    Ok(Json(record))
}
