//! K-bar aggregation and daily indicators for China A-share minute data.
//!
//! Modules:
//! - [`session`]: trading hours, market-local clock, next open.
//! - [`bucket`] / [`rollup`] / [`timeframe`]: daily and session-aligned N-minute roll-ups.
//! - [`price`] / [`volume`]: golden prices, VWAP, volume percentiles, gap counts.
//! - [`markers`] / [`cost_basis`] / [`summary`]: per-day indicator groups and records.
//! - [`keyed`]: timestamp-keyed JSON for charting.
//!
//! Everything here is synchronous and pure; bars come from [`gm_ingestor`].

#![deny(missing_docs)]

pub mod bucket;
pub mod cost_basis;
pub mod error;
pub mod keyed;
pub mod markers;
pub mod price;
pub mod rollup;
pub mod session;
pub mod summary;
pub mod timeframe;
pub mod volume;

pub use error::{AggregateError, KeyedError};
pub use rollup::{RollupStamp, rollup, to_daily, to_minutes};
pub use session::SessionCalendar;
pub use summary::{DailySummary, IndicatorSet, Summarizer, TimestampFormat};
