//! Client-side 402 payment handling for reqwest.
//!
//! This module provides [`BitRequests`], which pays 402 challenges with a
//! [`Wallet`] and a fixed [`PaymentMethodKind`], and [`get_402_info`], which
//! reads a challenge without paying it.

use bitrequests_types::payment::PaymentProof;
use bitrequests_types::{
    BitRequestsError, PaymentChallenge, PaymentMethod, PaymentMethodKind, Wallet,
};
use http::{Extensions, HeaderMap, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use std::sync::Arc;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace, warn};

/// Ceiling applied to a challenge when neither [`BitRequests::with_max_price`]
/// nor a [`MaxPrice`] extension says otherwise, in satoshis.
pub const DEFAULT_MAX_PRICE: u64 = 10_000;

/// Per-request spending ceiling in satoshis.
///
/// Attach it with `RequestBuilder::with_extension` to override the client's
/// ceiling for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPrice(pub u64);

/// The payment dispatcher.
///
/// [`BitRequests`] acts as middleware for reqwest. A non-402 response is
/// passed through untouched. A 402 response is parsed into a
/// [`PaymentChallenge`], checked against the spending ceiling, paid with the
/// configured method and the request is sent exactly once more with the
/// payment headers attached.
///
/// ## Creating a BitRequests
///
/// ```rust,ignore
/// use bitrequests_reqwest::BitRequests;
/// use bitrequests_types::PaymentMethodKind;
///
/// let bit_requests = BitRequests::new(wallet, PaymentMethodKind::BitTransfer);
/// ```
///
/// ## Using with Reqwest
///
/// See the [`ReqwestWithPayments`](crate::ReqwestWithPayments) trait for integrating with reqwest.
#[derive(Clone)]
pub struct BitRequests {
    wallet: Arc<dyn Wallet>,
    method: PaymentMethodKind,
    max_price: u64,
}

impl BitRequests {
    /// Creates a dispatcher paying with `wallet` using `method`.
    ///
    /// The spending ceiling starts at [`DEFAULT_MAX_PRICE`].
    pub fn new<W>(wallet: W, method: PaymentMethodKind) -> Self
    where
        W: Wallet + 'static,
    {
        Self {
            wallet: Arc::new(wallet),
            method,
            max_price: DEFAULT_MAX_PRICE,
        }
    }

    /// Creates a dispatcher paying on-chain.
    pub fn on_chain<W: Wallet + 'static>(wallet: W) -> Self {
        Self::new(wallet, PaymentMethodKind::OnChain)
    }

    /// Creates a dispatcher paying with bit-transfer vouchers.
    pub fn bit_transfer<W: Wallet + 'static>(wallet: W) -> Self {
        Self::new(wallet, PaymentMethodKind::BitTransfer)
    }

    /// Sets the default spending ceiling, in satoshis.
    pub fn with_max_price(mut self, max_price: u64) -> Self {
        self.max_price = max_price;
        self
    }

    /// The payment method used for every 402.
    pub fn method(&self) -> PaymentMethodKind {
        self.method
    }

    /// The default spending ceiling, in satoshis.
    pub fn max_price(&self) -> u64 {
        self.max_price
    }

    /// Creates payment headers from the headers of a 402 response.
    ///
    /// `url` is the URL of the request that was answered with 402.
    ///
    /// # Errors
    ///
    /// - [`BitRequestsError::MalformedChallenge`] if `price` is missing or invalid.
    /// - [`BitRequestsError::PriceExceedsMax`] if the price is above `max_price`.
    ///   The wallet is not called.
    /// - [`BitRequestsError::UnsupportedMethod`] if the challenge lacks a header
    ///   the configured method needs. The wallet is not called.
    /// - [`BitRequestsError::PaymentFailed`] if the wallet fails.
    pub async fn make_402_payment(
        &self,
        headers: &HeaderMap,
        url: &Url,
        max_price: u64,
    ) -> Result<HeaderMap, BitRequestsError> {
        let challenge = self.accept_challenge(headers, max_price)?;
        let proof = self.pay(&challenge, url).await?;
        Ok(proof.headers)
    }

    /// Parses the challenge and enforces the spending ceiling.
    fn accept_challenge(
        &self,
        headers: &HeaderMap,
        max_price: u64,
    ) -> Result<PaymentChallenge, BitRequestsError> {
        let challenge = PaymentChallenge::from_headers(headers)?;

        #[cfg(feature = "telemetry")]
        debug!(
            price = challenge.price,
            address = ?challenge.address,
            username = ?challenge.username,
            max_price,
            "Parsed payment challenge"
        );

        if challenge.price > max_price {
            return Err(BitRequestsError::PriceExceedsMax {
                price: challenge.price,
                max_price,
            });
        }
        Ok(challenge)
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "bitrequests.reqwest.pay", skip_all, err, fields(method = %self.method, price = challenge.price))
    )]
    async fn pay(
        &self,
        challenge: &PaymentChallenge,
        url: &Url,
    ) -> Result<PaymentProof, BitRequestsError> {
        self.method.pay(challenge, self.wallet.as_ref(), url).await
    }
}

/// Receipt of a paid 402 cycle.
///
/// Attached to the extensions of the response to the paid retry, whatever its
/// status. Holds the txid only, never the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub url: Url,
    pub price: u64,
    pub payee: Option<String>,
    pub method: PaymentMethodKind,
    pub txid: String,
}

#[async_trait::async_trait]
impl rqm::Middleware for BitRequests {
    /// Handles a request, paying for it if the server answers 402.
    ///
    /// When a 402 response is received, this middleware:
    /// 1. Parses the challenge from the response headers
    /// 2. Enforces the spending ceiling
    /// 3. Pays with the configured method
    /// 4. Retries the request once with the payment headers
    /// 5. Records the [`Purchase`] on the retry's response
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "bitrequests.reqwest.handle", skip_all, err, fields(method = %req.method(), url = %req.url()))
    )]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let max_price = extensions
            .get::<MaxPrice>()
            .map(|max| max.0)
            .unwrap_or(self.max_price);
        let url = req.url().clone();
        let retry_req = req.try_clone();
        let res = next.clone().run(req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "No payment required, returning response");
            return Ok(res);
        }

        #[cfg(feature = "telemetry")]
        info!(url = %url, "Received 402 Payment Required, processing payment");

        let challenge = self
            .accept_challenge(res.headers(), max_price)
            .map_err(middleware_error)?;
        let mut retry =
            retry_req.ok_or_else(|| middleware_error(BitRequestsError::RequestNotCloneable))?;
        let PaymentProof { txid, headers } =
            self.pay(&challenge, &url).await.map_err(middleware_error)?;
        drop(res);

        // Replaces any same-named headers so the retry carries one proof.
        retry.headers_mut().extend(headers);

        #[cfg(feature = "telemetry")]
        trace!(url = %url, "Retrying request with payment headers");

        let mut res = next.run(retry, extensions).await?;

        let purchase = Purchase {
            url,
            price: challenge.price,
            payee: challenge.address,
            method: self.method,
            txid,
        };

        #[cfg(feature = "telemetry")]
        {
            info!(
                url = %purchase.url,
                price = purchase.price,
                payee = ?purchase.payee,
                method = %purchase.method,
                txid = %purchase.txid,
                status = %res.status(),
                monotonic_counter.bitrequests.payments = 1_u64,
                "Paid for resource"
            );
            if res.status() == StatusCode::PAYMENT_REQUIRED {
                warn!(url = %purchase.url, "Paid retry was answered with 402 again, not retrying");
            }
        }

        res.extensions_mut().insert(purchase);
        Ok(res)
    }
}

/// Reads the payment challenge of `url` without paying it.
///
/// Sends a plain `GET` with `client`, which should not carry the payment
/// middleware. Returns `None` if the server does not answer 402.
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "bitrequests.reqwest.get_402_info", skip(client), err)
)]
pub async fn get_402_info(
    client: &reqwest::Client,
    url: Url,
) -> rqm::Result<Option<PaymentChallenge>> {
    let res = client.get(url).send().await?;
    if res.status() != StatusCode::PAYMENT_REQUIRED {
        return Ok(None);
    }
    PaymentChallenge::from_headers(res.headers())
        .map(Some)
        .map_err(middleware_error)
}

fn middleware_error(error: BitRequestsError) -> rqm::Error {
    rqm::Error::Middleware(error.into())
}
