#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Reqwest middleware that pays HTTP `402 Payment Required` challenges with bitcoin.
//!
//! This crate provides [`BitRequests`], a `reqwest-middleware` middleware that
//! watches for 402 responses. When one arrives it reads the price and payee from
//! the response headers, pays with the configured
//! [`PaymentMethodKind`](bitrequests_types::PaymentMethodKind) and retries the
//! request once with the proof of payment attached.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use bitrequests_reqwest::{BitRequests, MaxPrice, ReqwestWithPayments, ReqwestWithPaymentsBuild};
//! use bitrequests_types::PaymentMethodKind;
//! use reqwest::Client;
//!
//! let bit_requests = BitRequests::new(wallet, PaymentMethodKind::OnChain).with_max_price(5_000);
//!
//! let http_client = Client::new().with_payments(bit_requests).build();
//!
//! // Payments are handled automatically, up to the per-request ceiling.
//! let response = http_client
//!     .get("http://localhost:8000/weather/current-temperature?place=94102")
//!     .with_extension(MaxPrice(2_000))
//!     .send()
//!     .await?;
//! ```
//!
//! ## Spending limits
//!
//! Every 402 is checked against a ceiling before the wallet is touched. The
//! ceiling is [`DEFAULT_MAX_PRICE`] unless set with [`BitRequests::with_max_price`]
//! or overridden for one request with a [`MaxPrice`] extension.
//!
//! ## Retries
//!
//! A request is retried at most once. If the paid retry is answered with
//! another 402, that response is returned to the caller as is. Either way the
//! response to a paid retry carries a [`Purchase`] in its extensions.

mod builder;
mod client;

pub use builder::*;
pub use client::*;
