//! Bit-transfers: hand the payee a signed voucher instead of broadcasting.
//!
//! The voucher names the payee, the amount and the URL being bought. The
//! payee settles it later; nothing is broadcast by the client.

use async_trait::async_trait;
use url::Url;

use crate::challenge::PaymentChallenge;
use crate::error::BitRequestsError;
use crate::method::{PaymentMethod, PaymentMethodKind};
use crate::payment::{BitTransferVoucher, PaymentProof};
use crate::wallet::{Wallet, WalletError};

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

/// Pays with an off-chain voucher carried in the `Bitcoin-Transfer` header.
///
/// Requires the challenge to carry both `bitcoin-address` and `username`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitTransfer;

impl BitTransfer {
    fn unsupported(missing: &'static str) -> BitRequestsError {
        BitRequestsError::UnsupportedMethod {
            method: PaymentMethodKind::BitTransfer,
            missing,
        }
    }
}

#[async_trait]
impl PaymentMethod for BitTransfer {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "bitrequests.bit_transfer.pay", skip_all, err, fields(price = challenge.price))
    )]
    async fn pay(
        &self,
        challenge: &PaymentChallenge,
        wallet: &dyn Wallet,
        request_url: &Url,
    ) -> Result<PaymentProof, BitRequestsError> {
        let address = challenge
            .address
            .as_deref()
            .ok_or_else(|| Self::unsupported("bitcoin-address"))?;
        let username = challenge
            .username
            .as_deref()
            .ok_or_else(|| Self::unsupported("username"))?;

        let signed = wallet.sign_payment(address, challenge.price, true).await?;
        let transaction = signed
            .into_iter()
            .next()
            .ok_or(WalletError::NoTransaction)?;

        #[cfg(feature = "telemetry")]
        debug!(txid = %transaction.txid, payee = %username, "Signed bit-transfer voucher");

        let voucher = BitTransferVoucher {
            payee_address: address.to_string(),
            payee_username: Some(username.to_string()),
            amount: challenge.price,
            description: request_url.to_string(),
            signed_transaction: transaction.raw_tx,
        };
        Ok(PaymentProof {
            txid: transaction.txid,
            headers: voucher.to_headers()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockWallet;

    const URL: &str = "http://localhost:8000/weather/current-temperature?place=94102";

    fn url() -> Url {
        URL.parse().unwrap()
    }

    #[tokio::test]
    async fn test_bit_transfer_voucher() {
        let wallet = MockWallet::new();
        let challenge = PaymentChallenge {
            price: 1000,
            address: Some("test_bitserv_host_address".into()),
            username: Some("test_username".into()),
        };
        let headers = BitTransfer.build(&challenge, &wallet, &url()).await.unwrap();
        assert_eq!(headers.len(), 1);
        let transfer = headers["Bitcoin-Transfer"].to_str().unwrap();
        let voucher: BitTransferVoucher = serde_json::from_str(transfer).unwrap();
        assert_eq!(voucher.payee_address, "test_bitserv_host_address");
        assert_eq!(voucher.payee_username.as_deref(), Some("test_username"));
        assert_eq!(voucher.amount, 1000);
        assert_eq!(voucher.description, URL);
        assert_eq!(voucher.signed_transaction, MockWallet::TXN);
        assert_eq!(
            wallet.payments(),
            vec![("test_bitserv_host_address".to_string(), 1000, true)]
        );
    }

    #[tokio::test]
    async fn test_bit_transfer_requires_username() {
        let wallet = MockWallet::new();
        let challenge = PaymentChallenge {
            price: 1000,
            address: Some("test_bitserv_host_address".into()),
            username: None,
        };
        let result = BitTransfer.build(&challenge, &wallet, &url()).await;
        assert!(matches!(
            result,
            Err(BitRequestsError::UnsupportedMethod {
                method: PaymentMethodKind::BitTransfer,
                missing: "username",
            })
        ));
        assert_eq!(wallet.calls(), 0);
    }

    #[tokio::test]
    async fn test_bit_transfer_requires_address() {
        let wallet = MockWallet::new();
        let challenge = PaymentChallenge {
            price: 1000,
            address: None,
            username: Some("test_username".into()),
        };
        let result = BitTransfer.build(&challenge, &wallet, &url()).await;
        assert!(matches!(
            result,
            Err(BitRequestsError::UnsupportedMethod {
                missing: "bitcoin-address",
                ..
            })
        ));
        assert_eq!(wallet.calls(), 0);
    }

    #[tokio::test]
    async fn test_kind_dispatches_to_bit_transfer() {
        let wallet = MockWallet::new();
        let challenge = PaymentChallenge {
            price: 10,
            address: Some("addr".into()),
            username: Some("bob".into()),
        };
        let headers = PaymentMethodKind::BitTransfer
            .build(&challenge, &wallet, &url())
            .await
            .unwrap();
        assert!(headers.contains_key("Bitcoin-Transfer"));
        assert!(!headers.contains_key("Bitcoin-Transaction"));
    }
}
