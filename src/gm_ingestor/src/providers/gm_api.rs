//! Client for the gm-api JSON service.
//!
//! What this module provides:
//! - [`GmApiProvider`]: trading calendar, neighbouring trading days, live
//!   snapshots and historical K-bars, plus a [`DataProvider`](super::DataProvider)
//!   implementation over the history endpoints.
//! - [`GmBarsParams`]: gm-specific knobs carried in
//!   [`ProviderParams::GmApi`](crate::models::request_params::ProviderParams).
//! - [`TradeDate`]: one trading-calendar entry.
//!
//! Requests go through [`HttpFetcher::get_with_retry`](crate::fetch::HttpFetcher::get_with_retry).

pub mod client;
pub mod params;
pub mod response;

pub use client::GmApiProvider;
pub use params::GmBarsParams;
pub use response::TradeDate;
