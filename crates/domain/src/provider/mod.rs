//! Payment provider identities and their result-code conventions.
//!
//! Each gateway owns its own code table. Interpretation is always dispatched
//! on [`Provider`] first, so a VNPay code is never read against MoMo's table
//! and vice versa.

pub mod momo;
pub mod vnpay;

use serde::{Deserialize, Serialize};

/// What a provider's result code says about the payment, under that
/// provider's own convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeVerdict {
    /// The provider declared the payment successful.
    Success,
    /// The provider declared the payment failed or cancelled.
    Failure,
    /// Absent, unknown, or still-processing code.
    Indeterminate,
}

/// A payment gateway that redirects customers back to the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// VNPay: `vnp_ResponseCode` / `vnp_TxnRef`, success is `"00"`.
    Vnpay,
    /// MoMo: `orderId` / `resultCode` / `message`, success is numeric `0`.
    Momo,
}

impl Provider {
    /// Classifies a raw result code under this provider's convention.
    ///
    /// A missing code is always indeterminate.
    pub fn classify(&self, raw_code: Option<&str>) -> CodeVerdict {
        let Some(code) = raw_code.map(str::trim).filter(|c| !c.is_empty()) else {
            return CodeVerdict::Indeterminate;
        };
        match self {
            Provider::Vnpay => vnpay::classify(code),
            Provider::Momo => momo::classify(code),
        }
    }

    /// Returns true if the code means success for this provider.
    pub fn is_success(&self, raw_code: Option<&str>) -> bool {
        self.classify(raw_code) == CodeVerdict::Success
    }

    /// Returns a customer-facing description of a result code, if known.
    pub fn describe(&self, raw_code: &str) -> Option<&'static str> {
        match self {
            Provider::Vnpay => vnpay::describe(raw_code.trim()),
            Provider::Momo => momo::describe(raw_code.trim()),
        }
    }

    /// Returns the provider name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Vnpay => "vnpay",
            Provider::Momo => "momo",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vnpay" => Ok(Provider::Vnpay),
            "momo" => Ok(Provider::Momo),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// Returned when a provider name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown payment provider: {0}")]
pub struct UnknownProvider(pub String);
