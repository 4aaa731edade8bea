//! On-chain payments: hand the payee a raw signed transaction to broadcast.
//!
//! # Usage
//!
//! ```ignore
//! use bitrequests_types::method::{OnChain, PaymentMethod};
//!
//! let headers = OnChain.build(&challenge, &wallet, &url).await?;
//! ```

use async_trait::async_trait;
use url::Url;

use crate::challenge::PaymentChallenge;
use crate::error::BitRequestsError;
use crate::method::{PaymentMethod, PaymentMethodKind};
use crate::payment::{OnChainPayment, PaymentProof};
use crate::wallet::{Wallet, WalletError};

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

/// Pays with a transaction the payee broadcasts to the network.
///
/// Requires the challenge to carry `bitcoin-address`. Produces
/// `Bitcoin-Transaction` and `Return-Wallet-Address` headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnChain;

#[async_trait]
impl PaymentMethod for OnChain {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "bitrequests.on_chain.pay", skip_all, err, fields(price = challenge.price))
    )]
    async fn pay(
        &self,
        challenge: &PaymentChallenge,
        wallet: &dyn Wallet,
        _request_url: &Url,
    ) -> Result<PaymentProof, BitRequestsError> {
        let address = challenge
            .address
            .as_deref()
            .ok_or(BitRequestsError::UnsupportedMethod {
                method: PaymentMethodKind::OnChain,
                missing: "bitcoin-address",
            })?;

        let return_address = wallet.current_address().await?;
        // Unconfirmed inputs are fine: the payee should not wait on our confirmations.
        let signed = wallet.sign_payment(address, challenge.price, true).await?;
        let transaction = signed
            .into_iter()
            .next()
            .ok_or(WalletError::NoTransaction)?;

        #[cfg(feature = "telemetry")]
        debug!(txid = %transaction.txid, payee = %address, "Signed on-chain payment");

        let payment = OnChainPayment {
            raw_transaction: transaction.raw_tx,
            return_address,
        };
        Ok(PaymentProof {
            txid: transaction.txid,
            headers: payment.to_headers()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockWallet;

    fn url() -> Url {
        "http://localhost:8000/resource".parse().unwrap()
    }

    #[tokio::test]
    async fn test_on_chain_payment_headers() {
        let wallet = MockWallet::new();
        let challenge = PaymentChallenge {
            price: 1000,
            address: Some("test_bitserv_host_address".into()),
            username: None,
        };
        let headers = OnChain.build(&challenge, &wallet, &url()).await.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Bitcoin-Transaction"], MockWallet::TXN);
        assert_eq!(headers["Return-Wallet-Address"], MockWallet::ADDR);
        assert_eq!(
            wallet.payments(),
            vec![("test_bitserv_host_address".to_string(), 1000, true)]
        );
    }

    #[tokio::test]
    async fn test_on_chain_proof_carries_txid() {
        let wallet = MockWallet::new();
        let challenge = PaymentChallenge {
            price: 1000,
            address: Some("test_bitserv_host_address".into()),
            username: None,
        };
        let proof = OnChain.pay(&challenge, &wallet, &url()).await.unwrap();
        assert_eq!(proof.txid, MockWallet::TXID);
        assert_eq!(proof.headers["Bitcoin-Transaction"], MockWallet::TXN);
    }

    #[tokio::test]
    async fn test_on_chain_requires_address() {
        let wallet = MockWallet::new();
        let challenge = PaymentChallenge {
            price: 1000,
            address: None,
            username: Some("test_username".into()),
        };
        let result = OnChain.build(&challenge, &wallet, &url()).await;
        assert!(matches!(
            result,
            Err(BitRequestsError::UnsupportedMethod {
                method: PaymentMethodKind::OnChain,
                missing: "bitcoin-address",
            })
        ));
        assert_eq!(wallet.calls(), 0);
    }

    #[tokio::test]
    async fn test_on_chain_wallet_failure() {
        let wallet = MockWallet::rejecting();
        let challenge = PaymentChallenge {
            price: 1000,
            address: Some("addr".into()),
            username: None,
        };
        let result = OnChain.build(&challenge, &wallet, &url()).await;
        assert!(matches!(
            result,
            Err(BitRequestsError::PaymentFailed(WalletError::Rejected(_)))
        ));
    }
}
