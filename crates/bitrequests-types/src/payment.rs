//! Payment artifacts and the request headers that carry them.
//!
//! | Header                  | Method      | Content                     |
//! |-------------------------|-------------|-----------------------------|
//! | `Bitcoin-Transaction`   | OnChain     | raw signed transaction      |
//! | `Return-Wallet-Address` | OnChain     | payer's address             |
//! | `Bitcoin-Transfer`      | BitTransfer | JSON [`BitTransferVoucher`] |

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::BitRequestsError;

/// Request header carrying a raw on-chain transaction.
pub const BITCOIN_TRANSACTION: HeaderName = HeaderName::from_static("bitcoin-transaction");
/// Request header carrying the payer's refund address.
pub const RETURN_WALLET_ADDRESS: HeaderName = HeaderName::from_static("return-wallet-address");
/// Request header carrying a JSON bit-transfer voucher.
pub const BITCOIN_TRANSFER: HeaderName = HeaderName::from_static("bitcoin-transfer");

/// Headers proving a payment, with the id of the transaction behind them.
///
/// `Debug` lists header names only, since the values carry the transaction.
#[derive(Clone)]
pub struct PaymentProof {
    pub txid: String,
    pub headers: HeaderMap,
}

impl std::fmt::Debug for PaymentProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentProof")
            .field("txid", &self.txid)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Proof of an on-chain payment.
///
/// The raw transaction moves real funds once broadcast. Do not log it.
#[derive(Clone, PartialEq, Eq)]
pub struct OnChainPayment {
    pub raw_transaction: String,
    pub return_address: String,
}

impl std::fmt::Debug for OnChainPayment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnChainPayment")
            .field("raw_transaction", &"<redacted>")
            .field("return_address", &self.return_address)
            .finish()
    }
}

impl OnChainPayment {
    /// Renders the payment as `Bitcoin-Transaction` and `Return-Wallet-Address` headers.
    pub fn to_headers(&self) -> Result<HeaderMap, BitRequestsError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(BITCOIN_TRANSACTION, header_value(&self.raw_transaction)?);
        headers.insert(RETURN_WALLET_ADDRESS, header_value(&self.return_address)?);
        Ok(headers)
    }
}

/// A signed but not broadcast payment promise, settled later by the payee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitTransferVoucher {
    pub payee_address: String,
    pub payee_username: Option<String>,
    pub amount: u64,
    /// The purchased resource's URL, kept by the payee as an audit trail.
    pub description: String,
    /// The wallet's signed transaction backing the promise.
    pub signed_transaction: String,
}

impl BitTransferVoucher {
    /// Renders the voucher as a JSON `Bitcoin-Transfer` header.
    pub fn to_headers(&self) -> Result<HeaderMap, BitRequestsError> {
        let json = serde_json::to_string(self).map_err(BitRequestsError::JsonEncode)?;
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(BITCOIN_TRANSFER, header_value(&json)?);
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, BitRequestsError> {
    HeaderValue::from_str(value).map_err(BitRequestsError::HeaderValue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_chain_debug_hides_transaction() {
        let payment = OnChainPayment {
            raw_transaction: "0100000001deadbeef".into(),
            return_address: "payer".into(),
        };
        let debug = format!("{payment:?}");
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("payer"));
    }

    #[test]
    fn test_voucher_header_is_json() {
        let voucher = BitTransferVoucher {
            payee_address: "addr".into(),
            payee_username: Some("alice".into()),
            amount: 7,
            description: "http://example.com/a?b=c".into(),
            signed_transaction: "00ff".into(),
        };
        let headers = voucher.to_headers().unwrap();
        let value = headers.get("Bitcoin-Transfer").unwrap().to_str().unwrap();
        let json: serde_json::Value = serde_json::from_str(value).unwrap();
        assert_eq!(json["payee_address"], "addr");
        assert_eq!(json["payee_username"], "alice");
        assert_eq!(json["amount"], 7);
        assert_eq!(json["description"], "http://example.com/a?b=c");
    }

    #[test]
    fn test_proof_debug_hides_header_values() {
        let proof = PaymentProof {
            txid: "abcd".into(),
            headers: OnChainPayment {
                raw_transaction: "0100000001deadbeef".into(),
                return_address: "payer".into(),
            }
            .to_headers()
            .unwrap(),
        };
        let debug = format!("{proof:?}");
        assert!(debug.contains("abcd"));
        assert!(debug.contains("bitcoin-transaction"));
        assert!(!debug.contains("deadbeef"));
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let payment = OnChainPayment {
            raw_transaction: "line\nbreak".into(),
            return_address: "payer".into(),
        };
        assert!(matches!(
            payment.to_headers(),
            Err(BitRequestsError::HeaderValue(_))
        ));
    }
}
