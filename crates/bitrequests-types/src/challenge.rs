//! Parsing of the payment challenge carried by a 402 response.
//!
//! A server that wants to be paid answers with `402 Payment Required` and
//! describes the payment it expects in plain response headers:
//!
//! | Header            | Meaning                          |
//! |-------------------|----------------------------------|
//! | `price`           | Price in satoshis, positive      |
//! | `bitcoin-address` | Address the payment goes to      |
//! | `username`        | Payee username for bit-transfers |
//!
//! Only `price` is mandatory at parse time. Which of the other headers are
//! required depends on the payment method, and is checked by the method itself.

use http::HeaderMap;
use http::header::HeaderName;
use serde::{Deserialize, Serialize};

use crate::error::BitRequestsError;

/// Response header carrying the price in satoshis.
pub const PRICE: HeaderName = HeaderName::from_static("price");
/// Response header carrying the payee bitcoin address.
pub const BITCOIN_ADDRESS: HeaderName = HeaderName::from_static("bitcoin-address");
/// Response header carrying the payee username.
pub const USERNAME: HeaderName = HeaderName::from_static("username");

/// Payment terms advertised by a 402 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChallenge {
    /// Price in the smallest currency unit (satoshis). Always positive.
    pub price: u64,
    /// Payee address, if the server advertised one.
    pub address: Option<String>,
    /// Payee username, if the server advertised one.
    pub username: Option<String>,
}

impl PaymentChallenge {
    /// Parses the challenge from 402 response headers.
    ///
    /// Header names are matched case-insensitively. Empty `bitcoin-address` or
    /// `username` values are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`BitRequestsError::MalformedChallenge`] if `price` is missing,
    /// is not a valid integer, or is zero.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, BitRequestsError> {
        let price = headers
            .get(PRICE)
            .ok_or_else(|| BitRequestsError::MalformedChallenge("missing `price` header".into()))?;
        let price = price
            .to_str()
            .map_err(|_| BitRequestsError::MalformedChallenge("`price` is not valid text".into()))?
            .trim();
        let price = price.parse::<u64>().map_err(|_| {
            BitRequestsError::MalformedChallenge(format!("`price` is not an integer: {price:?}"))
        })?;
        if price == 0 {
            return Err(BitRequestsError::MalformedChallenge(
                "`price` must be positive".into(),
            ));
        }
        Ok(Self {
            price,
            address: optional_header(headers, &BITCOIN_ADDRESS),
            username: optional_header(headers, &USERNAME),
        })
    }
}

impl TryFrom<&HeaderMap> for PaymentChallenge {
    type Error = BitRequestsError;

    fn try_from(headers: &HeaderMap) -> Result<Self, Self::Error> {
        Self::from_headers(headers)
    }
}

fn optional_header(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_parse_full_challenge() {
        let challenge = PaymentChallenge::from_headers(&headers(&[
            ("price", "1000"),
            ("bitcoin-address", "test_bitserv_host_address"),
            ("username", "test_username"),
        ]))
        .unwrap();
        assert_eq!(challenge.price, 1000);
        assert_eq!(challenge.address.as_deref(), Some("test_bitserv_host_address"));
        assert_eq!(challenge.username.as_deref(), Some("test_username"));
    }

    #[test]
    fn test_parse_header_names_case_insensitive() {
        let challenge = PaymentChallenge::from_headers(&headers(&[
            ("Price", "5"),
            ("Bitcoin-Address", "addr"),
        ]))
        .unwrap();
        assert_eq!(challenge.price, 5);
        assert_eq!(challenge.address.as_deref(), Some("addr"));
        assert_eq!(challenge.username, None);
    }

    #[test]
    fn test_parse_price_only() {
        let challenge = PaymentChallenge::from_headers(&headers(&[("price", " 42 ")])).unwrap();
        assert_eq!(challenge.price, 42);
        assert_eq!(challenge.address, None);
        assert_eq!(challenge.username, None);
    }

    #[test]
    fn test_empty_optional_headers_are_absent() {
        let challenge = PaymentChallenge::from_headers(&headers(&[
            ("price", "1"),
            ("bitcoin-address", ""),
            ("username", "  "),
        ]))
        .unwrap();
        assert_eq!(challenge.address, None);
        assert_eq!(challenge.username, None);
    }

    #[test]
    fn test_missing_price_is_malformed() {
        let result = PaymentChallenge::from_headers(&headers(&[("bitcoin-address", "addr")]));
        assert!(matches!(result, Err(BitRequestsError::MalformedChallenge(_))));
    }

    #[test]
    fn test_non_numeric_price_is_malformed() {
        for price in ["abc", "10.5", "-1", ""] {
            let result = PaymentChallenge::from_headers(&headers(&[("price", price)]));
            assert!(
                matches!(result, Err(BitRequestsError::MalformedChallenge(_))),
                "price {price:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_price_is_malformed() {
        let result = PaymentChallenge::from_headers(&headers(&[("price", "0")]));
        assert!(matches!(result, Err(BitRequestsError::MalformedChallenge(_))));
    }
}
