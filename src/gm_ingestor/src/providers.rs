//! Provider abstraction for gm market data sources.
//!
//! This module defines the [`DataProvider`] trait, the unified interface for
//! fetching time-series bar data, plus the two concrete gm clients:
//!
//! - [`gm_api::GmApiProvider`]: the JSON endpoints (calendar, snapshots, history).
//! - [`gm_archive::GmArchiveProvider`]: the yearly/monthly CSV archive downloads.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn DataProvider`) for runtime selection of providers.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use gm_ingestor::models::{
//!     bar_series::BarSeries,
//!     request_params::BarsRequestParams,
//! };
//! use gm_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         _params: BarsRequestParams,
//!     ) -> Result<Vec<BarSeries>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod gm_api;
pub mod gm_archive;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::{
    decode::DecodeError,
    fetch::FetchError,
    models::{bar_series::BarSeries, request_params::BarsRequestParams},
};

/// Trait for fetching time-series bar data from a market data provider.
#[async_trait]
pub trait DataProvider {
    /// Fetches time-series bar data for the given request parameters.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<BarSeries>)` - One series per symbol that returned data.
    /// * `Err(ProviderError)` - If the request fails or the payload is malformed.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        #[snafu(backtrace)]
        source: FetchError,
    },

    /// Invalid settings (time zone, URL, ...).
    #[snafu(display("Invalid provider configuration: {message}"))]
    Config {
        message: String,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// The HTTP exchange failed (network, timeout, non-2xx status).
    #[snafu(display("API request failed: {source}"))]
    Fetch {
        #[snafu(backtrace)]
        source: FetchError,
    },

    /// The payload could not be decoded into records or bars.
    #[snafu(display("Malformed payload from {endpoint}: {source}"))]
    Decode {
        endpoint: String,
        source: DecodeError,
        backtrace: Backtrace,
    },

    /// A compressed archive file could not be unpacked.
    #[snafu(display("Failed to decompress {path}: {source}"))]
    Decompress {
        path: String,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// Nothing could be retrieved for the requested range.
    #[snafu(display("No data: {message}"))]
    NoData {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}
