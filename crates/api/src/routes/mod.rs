pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;

use common::OrderRef;

use crate::error::ApiError;

fn parse_order_ref(raw: &str) -> Result<OrderRef, ApiError> {
    OrderRef::parse(raw).ok_or_else(|| ApiError::BadRequest("Order reference is blank".to_string()))
}
