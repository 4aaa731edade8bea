//! The wallet capability consumed by payment methods.
//!
//! Key management, coin selection and fees all live behind this trait. The
//! payment code only asks for an address to be refunded to and for a signed
//! transaction paying a given address a given amount.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A transaction signed by the wallet, not yet broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Transaction id, safe to log.
    pub txid: String,
    /// Hex-encoded raw transaction. Spends real funds once broadcast.
    pub raw_tx: String,
}

/// Errors reported by a [`Wallet`].
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// The wallet backend failed (I/O, RPC, locked wallet and so on).
    #[error("Wallet backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The wallet refused to build the payment, e.g. for lack of funds.
    #[error("Wallet rejected payment: {0}")]
    Rejected(String),
    /// The wallet returned an empty list of signed transactions.
    #[error("Wallet produced no signed transaction")]
    NoTransaction,
}

impl WalletError {
    /// Wraps any backend error.
    pub fn backend<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        WalletError::Backend(error.into())
    }
}

/// Signing capability used to pay 402 challenges.
///
/// Implementations shared between several clients must make concurrent
/// `sign_payment` calls safe themselves; callers do no locking.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// The address the payee may use to refund or identify the payer.
    async fn current_address(&self) -> Result<String, WalletError>;

    /// Produces signed transactions paying `amount` satoshis to `address`.
    ///
    /// When `allow_unconfirmed` is set the wallet may spend outputs that are
    /// not yet confirmed. Only the first returned transaction is used.
    async fn sign_payment(
        &self,
        address: &str,
        amount: u64,
        allow_unconfirmed: bool,
    ) -> Result<Vec<SignedTransaction>, WalletError>;
}

#[async_trait]
impl<W> Wallet for Arc<W>
where
    W: Wallet + ?Sized,
{
    async fn current_address(&self) -> Result<String, WalletError> {
        self.as_ref().current_address().await
    }

    async fn sign_payment(
        &self,
        address: &str,
        amount: u64,
        allow_unconfirmed: bool,
    ) -> Result<Vec<SignedTransaction>, WalletError> {
        self.as_ref()
            .sign_payment(address, amount, allow_unconfirmed)
            .await
    }
}
