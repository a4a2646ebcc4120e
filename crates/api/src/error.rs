//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, RecordError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Payment record error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Record(RecordError::InvalidTransition { .. })
        | DomainError::DuplicateOrderRef(_) => (StatusCode::CONFLICT, err.to_string()),
        DomainError::RecordNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderRef;
    use domain::PaymentStatus;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_error_statuses() {
        let order_ref = OrderRef::parse("ORD-1").unwrap();
        assert_eq!(
            status_of(DomainError::RecordNotFound(order_ref.clone()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::DuplicateOrderRef(order_ref).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                DomainError::from(RecordError::InvalidTransition {
                    from: PaymentStatus::Failed,
                    to: PaymentStatus::Paid,
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(
            status_of(ApiError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::NotFound("missing".to_string())),
            StatusCode::NOT_FOUND
        );
    }
}
