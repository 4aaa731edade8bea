//! A [`Wallet`] backed by a Bitcoin Core node's wallet over JSON-RPC.
//!
//! Payments are built with the node's own coin selection and fee estimation:
//!
//! 1. `createrawtransaction` with the single payee output
//! 2. `fundrawtransaction`, allowing unconfirmed inputs when asked to
//! 3. `signrawtransactionwithwallet`
//! 4. `decoderawtransaction` to learn the txid
//!
//! Nothing is broadcast. For multi-wallet nodes point the URL at
//! `/wallet/<name>`.

use async_trait::async_trait;
use bitrequests_types::{SignedTransaction, Wallet, WalletError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use url::Url;

use tracing::instrument;

/// Bitcoin Core `RPC_WALLET_INSUFFICIENT_FUNDS`.
const RPC_WALLET_INSUFFICIENT_FUNDS: i64 = -6;

const SATOSHIS_PER_BITCOIN: u64 = 100_000_000;

/// Errors that can occur while talking to the node.
#[derive(Debug, thiserror::Error)]
pub enum RpcWalletError {
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("RPC error {code}: {context}: {message}")]
    Rpc {
        context: &'static str,
        code: i64,
        message: String,
    },
    #[error("Empty RPC result: {context}")]
    EmptyResult { context: &'static str },
}

impl From<RpcWalletError> for WalletError {
    fn from(error: RpcWalletError) -> Self {
        match error {
            RpcWalletError::Rpc {
                code: RPC_WALLET_INSUFFICIENT_FUNDS,
                message,
                ..
            } => WalletError::Rejected(message),
            error => WalletError::backend(error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct FundedTransaction {
    hex: String,
}

#[derive(Debug, Deserialize)]
struct SignedRawTransaction {
    hex: String,
    complete: bool,
}

#[derive(Debug, Deserialize)]
struct DecodedTransaction {
    txid: String,
}

/// A client for a Bitcoin Core wallet's JSON-RPC interface.
#[derive(Clone)]
pub struct RpcWallet {
    url: Url,
    client: Client,
    auth: Option<(String, Option<String>)>,
    timeout: Option<Duration>,
}

impl RpcWallet {
    /// Constructs a new [`RpcWallet`] talking to `url`.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            client: Client::new(),
            auth: None,
            timeout: None,
        }
    }

    /// Uses HTTP basic authentication (`rpcuser`/`rpcpassword`).
    pub fn with_auth(mut self, user: &str, password: Option<&str>) -> Self {
        self.auth = Some((user.to_string(), password.map(ToOwned::to_owned)));
        self
    }

    /// Sets a timeout for every RPC call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sends one JSON-RPC call and unwraps its `result`.
    ///
    /// Bitcoin Core reports RPC failures with a non-200 status *and* a JSON
    /// body, so the body is parsed before the status is looked at.
    async fn call<R>(
        &self,
        context: &'static str,
        method: &'static str,
        params: Value,
    ) -> Result<R, RpcWalletError>
    where
        R: DeserializeOwned,
    {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "bitrequests",
            "method": method,
            "params": params,
        });
        let mut req = self.client.post(self.url.clone()).json(&body);
        if let Some((user, password)) = &self.auth {
            req = req.basic_auth(user, password.as_ref());
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| RpcWalletError::Http { context, source: e })?;
        let status = http_response.status();
        let bytes = http_response
            .bytes()
            .await
            .map_err(|e| RpcWalletError::Http { context, source: e })?;

        let response = match serde_json::from_slice::<RpcResponse<R>>(&bytes) {
            Ok(response) => response,
            Err(_) if status != StatusCode::OK => {
                return Err(RpcWalletError::HttpStatus {
                    context,
                    status,
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            Err(e) => return Err(RpcWalletError::JsonDeserialization { context, source: e }),
        };
        if let Some(error) = response.error {
            return Err(RpcWalletError::Rpc {
                context,
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or(RpcWalletError::EmptyResult { context })
    }
}

#[async_trait]
impl Wallet for RpcWallet {
    #[instrument(name = "bitcurl.rpc_wallet.current_address", skip_all, err)]
    async fn current_address(&self) -> Result<String, WalletError> {
        let address: String = self
            .call("Failed to get a return address", "getnewaddress", json!([]))
            .await?;
        Ok(address)
    }

    #[instrument(name = "bitcurl.rpc_wallet.sign_payment", skip(self), err)]
    async fn sign_payment(
        &self,
        address: &str,
        amount: u64,
        allow_unconfirmed: bool,
    ) -> Result<Vec<SignedTransaction>, WalletError> {
        let mut outputs = Map::new();
        outputs.insert(address.to_string(), Value::String(format_btc(amount)));
        let raw: String = self
            .call(
                "Failed to create payment transaction",
                "createrawtransaction",
                json!([[], outputs]),
            )
            .await?;
        let funded: FundedTransaction = self
            .call(
                "Failed to fund payment transaction",
                "fundrawtransaction",
                json!([raw, { "include_unsafe": allow_unconfirmed }]),
            )
            .await?;
        let signed: SignedRawTransaction = self
            .call(
                "Failed to sign payment transaction",
                "signrawtransactionwithwallet",
                json!([funded.hex]),
            )
            .await?;
        if !signed.complete {
            return Err(WalletError::Rejected(
                "wallet could not sign every input".into(),
            ));
        }
        let decoded: DecodedTransaction = self
            .call(
                "Failed to decode payment transaction",
                "decoderawtransaction",
                json!([signed.hex]),
            )
            .await?;
        Ok(vec![SignedTransaction {
            txid: decoded.txid,
            raw_tx: signed.hex,
        }])
    }
}

/// Formats satoshis as a decimal bitcoin amount, e.g. `1000` as `"0.00001000"`.
fn format_btc(amount: u64) -> String {
    format!(
        "{}.{:08}",
        amount / SATOSHIS_PER_BITCOIN,
        amount % SATOSHIS_PER_BITCOIN
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "result": result,
            "error": null,
            "id": "bitrequests",
        }))
    }

    async fn mock_rpc(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[test]
    fn test_format_btc() {
        assert_eq!(format_btc(1000), "0.00001000");
        assert_eq!(format_btc(100_000_000), "1.00000000");
        assert_eq!(format_btc(123_456_789), "1.23456789");
    }

    #[tokio::test]
    async fn test_current_address() {
        let server = MockServer::start().await;
        mock_rpc(&server, "getnewaddress", rpc_result(json!("bc1qreturn"))).await;

        let wallet = RpcWallet::new(server.uri().parse().unwrap()).with_auth("user", Some("pass"));
        assert_eq!(wallet.current_address().await.unwrap(), "bc1qreturn");
    }

    #[tokio::test]
    async fn test_sign_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "createrawtransaction",
                "params": [[], { "bc1qpayee": "0.00001000" }],
            })))
            .respond_with(rpc_result(json!("0200unfunded")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "fundrawtransaction",
                "params": ["0200unfunded", { "include_unsafe": true }],
            })))
            .respond_with(rpc_result(json!({ "hex": "0200funded", "fee": 0.0001, "changepos": 1 })))
            .mount(&server)
            .await;
        mock_rpc(
            &server,
            "signrawtransactionwithwallet",
            rpc_result(json!({ "hex": "0200signed", "complete": true })),
        )
        .await;
        mock_rpc(
            &server,
            "decoderawtransaction",
            rpc_result(json!({ "txid": "abcd", "version": 2 })),
        )
        .await;

        let wallet = RpcWallet::new(server.uri().parse().unwrap());
        let signed = wallet.sign_payment("bc1qpayee", 1000, true).await.unwrap();
        assert_eq!(
            signed,
            vec![SignedTransaction {
                txid: "abcd".into(),
                raw_tx: "0200signed".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_insufficient_funds_is_rejected() {
        let server = MockServer::start().await;
        mock_rpc(&server, "createrawtransaction", rpc_result(json!("0200"))).await;
        mock_rpc(
            &server,
            "fundrawtransaction",
            ResponseTemplate::new(500).set_body_json(json!({
                "result": null,
                "error": { "code": -6, "message": "Insufficient funds" },
                "id": "bitrequests",
            })),
        )
        .await;

        let wallet = RpcWallet::new(server.uri().parse().unwrap());
        let error = wallet.sign_payment("bc1qpayee", 1000, true).await.unwrap_err();
        assert!(matches!(error, WalletError::Rejected(message) if message == "Insufficient funds"));
    }

    #[tokio::test]
    async fn test_incomplete_signature_is_rejected() {
        let server = MockServer::start().await;
        mock_rpc(&server, "createrawtransaction", rpc_result(json!("0200"))).await;
        mock_rpc(&server, "fundrawtransaction", rpc_result(json!({ "hex": "0200" }))).await;
        mock_rpc(
            &server,
            "signrawtransactionwithwallet",
            rpc_result(json!({ "hex": "0200", "complete": false })),
        )
        .await;

        let wallet = RpcWallet::new(server.uri().parse().unwrap());
        let error = wallet.sign_payment("bc1qpayee", 1000, false).await.unwrap_err();
        assert!(matches!(error, WalletError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let wallet = RpcWallet::new(server.uri().parse().unwrap());
        let error = wallet.current_address().await.unwrap_err();
        assert!(matches!(error, WalletError::Backend(_)));
    }
}
