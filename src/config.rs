//! Configuration for the `bitcurl` client.
//!
//! Settings come from three places, later ones winning:
//!
//! 1. Hardcoded defaults, or environment variables when set
//! 2. A JSON configuration file
//! 3. Command-line flags

use bitrequests_reqwest::DEFAULT_MAX_PRICE;
use bitrequests_types::PaymentMethodKind;
use clap::Parser;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::wallet::WalletConfig;

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "bitcurl.json";

/// CLI arguments for `bitcurl`.
#[derive(Parser, Debug)]
#[command(name = "bitcurl")]
#[command(about = "HTTP client that pays 402 Payment Required challenges with bitcoin")]
pub struct CliArgs {
    /// URL to request
    pub url: Url,
    /// HTTP method
    #[arg(short = 'X', long = "request", default_value = "GET")]
    pub method: Method,
    /// Extra request header, as "Name: value". May be repeated
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,
    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,
    /// Highest price to pay for this request, in satoshis
    #[arg(long)]
    pub max_price: Option<u64>,
    /// Payment method: on-chain or bit-transfer
    #[arg(long)]
    pub payment_method: Option<PaymentMethodKind>,
    /// Path to the JSON configuration file
    #[arg(long, short, env = "BITCURL_CONFIG")]
    pub config: Option<PathBuf>,
    /// Print the payment challenge of the URL instead of paying it
    #[arg(long)]
    pub info: bool,
    /// Log debug output to stderr
    #[arg(long, short)]
    pub verbose: bool,
}

impl CliArgs {
    /// Parses the repeated `-H "Name: value"` flags.
    pub fn header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for raw in &self.headers {
            let (name, value) = raw
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidHeader(raw.clone()))?;
            let name = HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|_| ConfigError::InvalidHeader(raw.clone()))?;
            let value = HeaderValue::from_str(value.trim())
                .map_err(|_| ConfigError::InvalidHeader(raw.clone()))?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

/// Client configuration.
///
/// Fields use serde defaults that fall back to environment variables,
/// then to hardcoded defaults.
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_max_price")]
    max_price: u64,
    #[serde(default = "config_defaults::default_payment_method")]
    payment_method: PaymentMethodKind,
    #[serde(default)]
    wallet: Option<WalletConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_price: config_defaults::default_max_price(),
            payment_method: config_defaults::default_payment_method(),
            wallet: None,
        }
    }
}

pub mod config_defaults {
    use bitrequests_types::PaymentMethodKind;
    use std::env;

    use super::DEFAULT_MAX_PRICE;

    /// Returns the default max price with fallback: $BITCURL_MAX_PRICE env var -> 10000
    pub fn default_max_price() -> u64 {
        env::var("BITCURL_MAX_PRICE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_PRICE)
    }

    /// Returns the default payment method with fallback: $BITCURL_PAYMENT_METHOD env var -> on-chain
    pub fn default_payment_method() -> PaymentMethodKind {
        env::var("BITCURL_PAYMENT_METHOD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Invalid header {0:?}, expected \"Name: value\"")]
    InvalidHeader(String),
    #[error("No wallet configured, add a \"wallet\" section to the config file")]
    NoWallet,
}

impl Config {
    /// Highest price to pay per request, in satoshis.
    pub fn max_price(&self) -> u64 {
        self.max_price
    }

    /// Payment method used for every 402.
    pub fn payment_method(&self) -> PaymentMethodKind {
        self.payment_method
    }

    /// The configured wallet.
    pub fn wallet(&self) -> Result<&WalletConfig, ConfigError> {
        self.wallet.as_ref().ok_or(ConfigError::NoWallet)
    }

    /// Load configuration for the given CLI arguments.
    ///
    /// The config file path is determined by:
    /// 1. `--config <path>` CLI argument (or `$BITCURL_CONFIG`), which must exist
    /// 2. `./bitcurl.json`, if it exists
    ///
    /// Flags given on the command line override file values.
    pub fn load(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let config = match &cli_args.config {
            Some(path) => Self::load_from_path(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load_from_path(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        Ok(config.with_overrides(cli_args))
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn with_overrides(mut self, cli_args: &CliArgs) -> Self {
        if let Some(max_price) = cli_args.max_price {
            self.max_price = max_price;
        }
        if let Some(payment_method) = cli_args.payment_method {
            self.payment_method = payment_method;
        }
        self
    }
}
