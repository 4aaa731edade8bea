//! Utilities for the `bitcurl` binary.
//!
//! - [`telemetry`] - stderr logging and OpenTelemetry export

pub mod telemetry;

pub use telemetry::*;
