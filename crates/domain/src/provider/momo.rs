//! MoMo return-URL conventions.
//!
//! `resultCode` is numeric, so `"0"` and `"00"` are the same code.

use super::CodeVerdict;

/// Query parameter carrying the merchant order ID; its presence identifies MoMo.
pub const PARAM_ORDER_ID: &str = "orderId";

/// Query parameter carrying the numeric result code.
pub const PARAM_RESULT_CODE: &str = "resultCode";

/// Query parameter carrying MoMo's human-readable message.
pub const PARAM_MESSAGE: &str = "message";

/// Result code for a completed payment.
pub const SUCCESS_CODE: u32 = 0;

/// Codes meaning the transaction is initiated, processing or only authorized.
pub const PROCESSING_CODES: &[u32] = &[1000, 7000, 7002, 9000];

/// Codes that unambiguously mean the payment did not go through.
pub const FAILURE_CODES: &[u32] = &[
    1001, 1002, 1003, 1004, 1005, 1006, 1007, 1026, 1080, 1081, 1088, 2019, 4001, 4100,
];

pub(super) fn classify(code: &str) -> CodeVerdict {
    let Ok(value) = code.parse::<u32>() else {
        return CodeVerdict::Indeterminate;
    };
    if value == SUCCESS_CODE {
        CodeVerdict::Success
    } else if FAILURE_CODES.contains(&value) {
        CodeVerdict::Failure
    } else {
        CodeVerdict::Indeterminate
    }
}

pub(super) fn describe(code: &str) -> Option<&'static str> {
    let text = match code.parse::<u32>().ok()? {
        0 => "Payment completed",
        1000 => "Payment initiated, waiting for customer confirmation",
        1001 => "Insufficient balance",
        1002 => "Payment rejected by the issuer",
        1003 => "Payment cancelled",
        1004 => "Amount exceeds the payment limit",
        1005 => "Payment link or QR code expired",
        1006 => "Payment declined by customer",
        1007 => "Account is inactive",
        1026 => "Payment restricted by promotion rules",
        1080 | 1081 => "Payment could not be processed",
        1088 => "Payment is not eligible",
        2019 => "Invalid order group",
        4001 => "Account is restricted",
        4100 => "Customer is not signed in",
        7000 | 7002 => "Payment is being processed",
        9000 => "Payment authorized, awaiting capture",
        _ => return None,
    };
    Some(text)
}
