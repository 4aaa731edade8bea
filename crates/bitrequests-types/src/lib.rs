#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for paying HTTP `402 Payment Required` challenges with bitcoin.
//!
//! This crate holds everything that does not depend on a particular HTTP client:
//! the challenge a server sends, the payment artifacts a client sends back, the
//! wallet capability used to sign payments, and the payment methods that turn a
//! challenge into request headers.
//!
//! # Overview
//!
//! A payment-gated server answers an unpaid request with status 402 and three
//! headers: `price` (in satoshis), `bitcoin-address` and, for off-chain transfers,
//! `username`. The client parses those into a [`PaymentChallenge`], asks a
//! [`PaymentMethod`](method::PaymentMethod) to produce proof of payment using a
//! [`Wallet`](wallet::Wallet), and retries the request with the resulting headers.
//!
//! # Modules
//!
//! - [`challenge`] - Parsing of the 402 challenge headers
//! - [`error`] - The [`BitRequestsError`] taxonomy shared by all payment code
//! - [`method`] - The [`PaymentMethod`](method::PaymentMethod) trait with the `OnChain` and `BitTransfer` methods
//! - [`payment`] - Payment artifacts and the header names that carry them
//! - [`wallet`] - The wallet capability consumed by payment methods
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation of payment building
//! - `test-utils` - Exposes a counting [`MockWallet`](test_utils::MockWallet) for downstream tests

pub mod challenge;
pub mod error;
pub mod method;
pub mod payment;
pub mod wallet;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use challenge::PaymentChallenge;
pub use error::BitRequestsError;
pub use method::{PaymentMethod, PaymentMethodKind};
pub use wallet::{SignedTransaction, Wallet, WalletError};
