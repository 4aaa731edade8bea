use async_trait::async_trait;
use bitrequests_types::{SignedTransaction, Wallet, WalletError};

/// A wallet with a fixed address and a fixed pre-signed transaction.
///
/// Nothing is signed on demand, so the requested address and amount are
/// ignored. Only useful against servers that do not validate payments.
#[derive(Debug, Clone)]
pub struct StaticWallet {
    address: String,
    transaction: String,
    txid: String,
}

impl StaticWallet {
    pub fn new(address: impl Into<String>, transaction: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            transaction: transaction.into(),
            txid: String::new(),
        }
    }

    pub fn with_txid(mut self, txid: impl Into<String>) -> Self {
        self.txid = txid.into();
        self
    }
}

#[async_trait]
impl Wallet for StaticWallet {
    async fn current_address(&self) -> Result<String, WalletError> {
        Ok(self.address.clone())
    }

    async fn sign_payment(
        &self,
        _address: &str,
        _amount: u64,
        _allow_unconfirmed: bool,
    ) -> Result<Vec<SignedTransaction>, WalletError> {
        Ok(vec![SignedTransaction {
            txid: self.txid.clone(),
            raw_tx: self.transaction.clone(),
        }])
    }
}
