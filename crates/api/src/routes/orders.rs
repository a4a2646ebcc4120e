//! Order registration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderRef;
use domain::{AuthoritativeRecord, NewPaymentRecord, PaymentRecordStore};
use serde::Deserialize;

use super::parse_order_ref;
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_ref: Option<String>,
    pub amount_cents: Option<i64>,
}

/// POST /orders: register a placed order with a pending payment.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: PaymentRecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<AuthoritativeRecord>), ApiError> {
    let order_ref = match req.order_ref.as_deref() {
        Some(raw) => parse_order_ref(raw)?,
        None => OrderRef::generate(),
    };

    let mut new = NewPaymentRecord::new(order_ref);
    if let Some(amount_cents) = req.amount_cents {
        if amount_cents < 0 {
            return Err(ApiError::BadRequest(format!(
                "Invalid amountCents: {amount_cents}"
            )));
        }
        new = new.with_amount_cents(amount_cents);
    }

    let record = state.store.create(new).await?;
    tracing::info!(order_ref = %record.order_ref, "order registered");

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /orders/:order_ref: load the payment record for an order.
#[tracing::instrument(skip(state))]
pub async fn get<S: PaymentRecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_ref): Path<String>,
) -> Result<Json<AuthoritativeRecord>, ApiError> {
    let parsed = parse_order_ref(&order_ref)?;
    let record = state
        .store
        .get(&parsed)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {parsed} not found")))?;

    Ok(Json(record))
}
