//! Test doubles for code that consumes a [`Wallet`].

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::wallet::{SignedTransaction, Wallet, WalletError};

/// A wallet that signs nothing real and counts how often it is used.
#[derive(Debug, Default)]
pub struct MockWallet {
    calls: AtomicUsize,
    payments: Mutex<Vec<(String, u64, bool)>>,
    reject: bool,
}

impl MockWallet {
    pub const ADDR: &'static str = "test_21_user_address";
    pub const TXID: &'static str = "test_txid";
    pub const TXN: &'static str = "test_transaction_hex";

    pub fn new() -> Self {
        Self::default()
    }

    /// A wallet whose `sign_payment` always fails.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Number of calls to any wallet operation.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(address, amount, allow_unconfirmed)` of every `sign_payment` call.
    pub fn payments(&self) -> Vec<(String, u64, bool)> {
        self.payments.lock().unwrap().clone()
    }
}

#[async_trait]
impl Wallet for MockWallet {
    async fn current_address(&self) -> Result<String, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::ADDR.to_string())
    }

    async fn sign_payment(
        &self,
        address: &str,
        amount: u64,
        allow_unconfirmed: bool,
    ) -> Result<Vec<SignedTransaction>, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payments
            .lock()
            .unwrap()
            .push((address.to_string(), amount, allow_unconfirmed));
        if self.reject {
            return Err(WalletError::Rejected("insufficient funds".into()));
        }
        Ok(vec![SignedTransaction {
            txid: Self::TXID.to_string(),
            raw_tx: Self::TXN.to_string(),
        }])
    }
}
