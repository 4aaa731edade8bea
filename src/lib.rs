//! `bitcurl`: a command-line HTTP client that pays `402 Payment Required`
//! challenges with bitcoin.
//!
//! The payment logic lives in the workspace crates:
//!
//! - `bitrequests-types` - challenges, payment methods, the [`Wallet`](bitrequests_types::Wallet) trait and errors
//! - `bitrequests-reqwest` - the reqwest middleware that pays and retries
//!
//! This crate adds what the binary needs around them.
//!
//! # Modules
//!
//! - [`config`] - CLI flags and the JSON configuration file
//! - [`wallet`] - concrete wallets: a static one for development and a Bitcoin Core RPC wallet
//! - [`util`] - logging and OpenTelemetry setup

pub mod config;
pub mod util;
pub mod wallet;
