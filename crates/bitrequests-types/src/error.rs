//! Error taxonomy for the 402 payment cycle.
//!
//! Every failure aborts the cycle immediately: nothing is retried and no
//! other payment method is attempted. Transport failures are not part of this
//! taxonomy and are surfaced by the HTTP layer unchanged.

use crate::method::PaymentMethodKind;
use crate::wallet::WalletError;

/// Errors that can occur while answering a 402 challenge.
#[derive(Debug, thiserror::Error)]
pub enum BitRequestsError {
    /// The 402 response carries no parseable, positive `price` header.
    #[error("Malformed payment challenge: {0}")]
    MalformedChallenge(String),
    /// The challenge lacks a header the configured payment method needs,
    /// meaning the server does not support that method.
    #[error("Server does not support {method} payments: missing `{missing}` header")]
    UnsupportedMethod {
        method: PaymentMethodKind,
        missing: &'static str,
    },
    /// The challenge price is above the caller's ceiling. Raised before the
    /// wallet is touched.
    #[error("Resource price {price} exceeds max price {max_price}")]
    PriceExceedsMax { price: u64, max_price: u64 },
    /// The wallet could not produce the payment.
    #[error("Payment failed: {0}")]
    PaymentFailed(#[source] WalletError),
    /// The original request could not be cloned for the paid retry.
    #[error("Request is not cloneable (streaming body?)")]
    RequestNotCloneable,
    /// The payment artifact could not be serialized to JSON.
    #[error("Failed to encode payment to JSON")]
    JsonEncode(#[source] serde_json::Error),
    /// The payment artifact is not a valid HTTP header value.
    #[error("Failed to encode payment as an HTTP header value")]
    HeaderValue(#[source] http::header::InvalidHeaderValue),
}

impl From<WalletError> for BitRequestsError {
    fn from(error: WalletError) -> Self {
        BitRequestsError::PaymentFailed(error)
    }
}
