//! `bitcurl` entrypoint.
//!
//! Sends one HTTP request. If the server answers `402 Payment Required`, the
//! challenge is paid with the configured wallet and the request is retried.
//! The response body is written to stdout; logs go to stderr.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `BITCURL_CONFIG` points at the JSON configuration file
//! - `BITCURL_MAX_PRICE`, `BITCURL_PAYMENT_METHOD` set defaults the config file may override
//! - `RUST_LOG` controls log filtering
//! - `OTEL_*` variables enable OTLP export

use bitrequests::config::{CliArgs, Config};
use bitrequests::util::Telemetry;
use bitrequests_reqwest::{
    BitRequests, ReqwestWithPayments, ReqwestWithPaymentsBuild, get_402_info,
};
use clap::Parser;
use dotenvy::dotenv;
use std::io::Write;
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env variables
    dotenv().ok();

    let cli_args = CliArgs::parse();

    let _telemetry = Telemetry::new()
        .with_name("bitcurl")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_verbose(cli_args.verbose)
        .register()?;

    let config = Config::load(&cli_args)?;

    if cli_args.info {
        let challenge = get_402_info(&reqwest::Client::new(), cli_args.url.clone()).await?;
        let mut stdout = std::io::stdout().lock();
        match challenge {
            Some(challenge) => writeln!(stdout, "{}", serde_json::to_string_pretty(&challenge)?)?,
            None => writeln!(stdout, "No payment required")?,
        }
        return Ok(());
    }

    let wallet = config.wallet()?.build();
    let bit_requests =
        BitRequests::new(wallet, config.payment_method()).with_max_price(config.max_price());
    let client = reqwest::Client::new().with_payments(bit_requests).build();

    let mut request = client
        .request(cli_args.method.clone(), cli_args.url.clone())
        .headers(cli_args.header_map()?);
    if let Some(data) = &cli_args.data {
        request = request.body(data.clone());
    }
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%status, url = %cli_args.url, "Request did not succeed");
    }
    let body = response.bytes().await?;
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&body).await?;
    stdout.flush().await?;
    Ok(())
}
