//! VNPay return-URL conventions.
//!
//! Codes are two-character strings and are compared exactly.

use super::CodeVerdict;

/// Query parameter carrying the response code.
pub const PARAM_RESPONSE_CODE: &str = "vnp_ResponseCode";

/// Query parameter carrying the merchant transaction reference.
pub const PARAM_TXN_REF: &str = "vnp_TxnRef";

/// Every VNPay return parameter carries this prefix; any one of them
/// identifies a VNPay redirect.
pub const PARAM_PREFIX: &str = "vnp_";

/// The only code VNPay uses for a completed payment.
pub const SUCCESS_CODE: &str = "00";

/// Codes that unambiguously mean the payment did not go through.
///
/// `07` (charged but flagged as suspicious) is deliberately absent: the money
/// may have moved, so it is left to the backend to decide.
pub const FAILURE_CODES: &[&str] = &[
    "09", "10", "11", "12", "13", "24", "51", "65", "75", "79", "99",
];

pub(super) fn classify(code: &str) -> CodeVerdict {
    if code == SUCCESS_CODE {
        CodeVerdict::Success
    } else if FAILURE_CODES.contains(&code) {
        CodeVerdict::Failure
    } else {
        CodeVerdict::Indeterminate
    }
}

pub(super) fn describe(code: &str) -> Option<&'static str> {
    let text = match code {
        "00" => "Payment completed",
        "07" => "Payment deducted but flagged as suspicious",
        "09" => "Card or account is not registered for internet banking",
        "10" => "Card or account verification failed too many times",
        "11" => "Payment window expired",
        "12" => "Card or account is locked",
        "13" => "Incorrect one-time password",
        "24" => "Payment cancelled by customer",
        "51" => "Insufficient balance",
        "65" => "Daily transaction limit exceeded",
        "75" => "Issuing bank is under maintenance",
        "79" => "Payment password entered incorrectly too many times",
        "99" => "Payment failed",
        _ => return None,
    };
    Some(text)
}
