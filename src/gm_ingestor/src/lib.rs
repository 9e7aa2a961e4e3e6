//! Thin async clients for the gm market-data services.
//!
//! What this crate provides:
//! - Bar, tick and timeframe models ([`models`]).
//! - Timestamp parsing and market-zone helpers ([`tz`]).
//! - TOML configuration with env overrides ([`config`]).
//! - A retrying HTTP GET fetcher ([`fetch`]).
//! - Payload decoding for columnar JSON and CSV ([`decode`]).
//! - gm-api and gm-csv archive clients behind [`providers::DataProvider`].
//! - Archive-plus-API 1-minute history ([`feed`]).

pub mod config;
pub mod decode;
pub mod feed;
pub mod fetch;
pub mod models;
pub mod providers;
pub mod tz;
