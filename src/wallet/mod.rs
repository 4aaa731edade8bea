//! Concrete [`Wallet`] implementations for `bitcurl`.
//!
//! - [`StaticWallet`] - always answers with the same address and transaction,
//!   for exercising payment-gated development servers
//! - [`RpcWallet`] - signs real payments through a Bitcoin Core wallet over JSON-RPC

mod rpc;
mod static_wallet;

pub use rpc::*;
pub use static_wallet::*;

use bitrequests_types::Wallet;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Wallet section of the configuration file, tagged by `type`.
///
/// ```json
/// {"type": "rpc", "url": "http://127.0.0.1:8332/wallet/main", "user": "rpcuser", "password": "rpcpass"}
/// ```
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WalletConfig {
    Static {
        address: String,
        transaction: String,
        #[serde(default)]
        txid: Option<String>,
    },
    Rpc {
        url: Url,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl WalletConfig {
    /// Instantiates the configured wallet.
    pub fn build(&self) -> Arc<dyn Wallet> {
        match self {
            WalletConfig::Static {
                address,
                transaction,
                txid,
            } => {
                let wallet = StaticWallet::new(address, transaction);
                match txid {
                    Some(txid) => Arc::new(wallet.with_txid(txid)),
                    None => Arc::new(wallet),
                }
            }
            WalletConfig::Rpc {
                url,
                user,
                password,
                timeout_secs,
            } => {
                let mut wallet = RpcWallet::new(url.clone());
                if let Some(user) = user {
                    wallet = wallet.with_auth(user, password.as_deref());
                }
                if let Some(timeout_secs) = timeout_secs {
                    wallet = wallet.with_timeout(Duration::from_secs(*timeout_secs));
                }
                Arc::new(wallet)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_wallet_from_config() {
        let config: WalletConfig = serde_json::from_str(
            r#"{"type": "static", "address": "1payer", "transaction": "0100ff", "txid": "abcd"}"#,
        )
        .unwrap();
        let wallet = config.build();
        assert_eq!(wallet.current_address().await.unwrap(), "1payer");
        let signed = wallet.sign_payment("1payee", 1000, true).await.unwrap();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].raw_tx, "0100ff");
        assert_eq!(signed[0].txid, "abcd");
    }

    #[test]
    fn test_unknown_wallet_type_is_rejected() {
        let result = serde_json::from_str::<WalletConfig>(r#"{"type": "hardware"}"#);
        assert!(result.is_err());
    }
}
