//! Payment methods: strategies that turn a [`PaymentChallenge`] into request headers.
//!
//! Two methods exist:
//!
//! - [`OnChain`] - pays with a raw transaction the payee broadcasts
//! - [`BitTransfer`] - hands the payee a signed voucher to settle later
//!
//! A client picks one with [`PaymentMethodKind`], which itself implements
//! [`PaymentMethod`] by dispatching to the matching strategy.

pub mod bit_transfer;
pub mod on_chain;

pub use bit_transfer::BitTransfer;
pub use on_chain::OnChain;

use async_trait::async_trait;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::challenge::PaymentChallenge;
use crate::error::BitRequestsError;
use crate::payment::PaymentProof;
use crate::wallet::Wallet;

/// A way of paying a 402 challenge.
///
/// Implementations must validate that the challenge carries every header they
/// need *before* calling the wallet, so a rejected challenge never produces a
/// signed transaction.
#[async_trait]
pub trait PaymentMethod: Send + Sync {
    /// Pays `challenge` using `wallet` and returns the headers that carry the
    /// proof of payment, with the txid of the transaction behind them.
    /// `request_url` is the URL of the resource being bought.
    async fn pay(
        &self,
        challenge: &PaymentChallenge,
        wallet: &dyn Wallet,
        request_url: &Url,
    ) -> Result<PaymentProof, BitRequestsError>;

    /// Like [`PaymentMethod::pay`], keeping only the headers.
    async fn build(
        &self,
        challenge: &PaymentChallenge,
        wallet: &dyn Wallet,
        request_url: &Url,
    ) -> Result<HeaderMap, BitRequestsError> {
        let proof = self.pay(challenge, wallet, request_url).await?;
        Ok(proof.headers)
    }
}

/// Selector for the payment method a client uses for every 402 it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethodKind {
    #[default]
    OnChain,
    BitTransfer,
}

impl PaymentMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodKind::OnChain => "on-chain",
            PaymentMethodKind::BitTransfer => "bit-transfer",
        }
    }
}

impl fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown payment method {0:?}, expected `on-chain` or `bit-transfer`")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethodKind {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on-chain" | "onchain" | "on_chain" => Ok(PaymentMethodKind::OnChain),
            "bit-transfer" | "bittransfer" | "bit_transfer" => Ok(PaymentMethodKind::BitTransfer),
            _ => Err(UnknownPaymentMethod(s.to_string())),
        }
    }
}

#[async_trait]
impl PaymentMethod for PaymentMethodKind {
    async fn pay(
        &self,
        challenge: &PaymentChallenge,
        wallet: &dyn Wallet,
        request_url: &Url,
    ) -> Result<PaymentProof, BitRequestsError> {
        match self {
            PaymentMethodKind::OnChain => OnChain.pay(challenge, wallet, request_url).await,
            PaymentMethodKind::BitTransfer => BitTransfer.pay(challenge, wallet, request_url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "on-chain".parse::<PaymentMethodKind>().unwrap(),
            PaymentMethodKind::OnChain
        );
        assert_eq!(
            "BitTransfer".parse::<PaymentMethodKind>().unwrap(),
            PaymentMethodKind::BitTransfer
        );
        assert!("lightning".parse::<PaymentMethodKind>().is_err());
    }

    #[test]
    fn test_kind_serde() {
        let kind: PaymentMethodKind = serde_json::from_str("\"bit-transfer\"").unwrap();
        assert_eq!(kind, PaymentMethodKind::BitTransfer);
        assert_eq!(
            serde_json::to_string(&PaymentMethodKind::OnChain).unwrap(),
            "\"on-chain\""
        );
    }
}
