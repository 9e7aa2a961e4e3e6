//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is the standard output of every [`DataProvider`](crate::providers::DataProvider)
//! and the standard input of the aggregation code in `kbar_stats`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invariant violations detected by [`Bar::validate`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BarError {
    /// A price field is NaN or infinite.
    #[error("{field} is not a finite price: {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// `high` lies below the open or the close.
    #[error("high {high} is below max(open {open}, close {close})")]
    HighBelowBody { high: f64, open: f64, close: f64 },

    /// `low` lies above the open or the close.
    #[error("low {low} is above min(open {open}, close {close})")]
    LowAboveBody { low: f64, open: f64, close: f64 },

    /// Share counts cannot be negative.
    #[error("negative volume: {0}")]
    NegativeVolume(i64),
}

/// A single time-series bar (OHLCV) for a given timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The timestamp for this bar (UTC). For minute bars this is the bar end (`eob`).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Shares traded during the bar interval.
    pub volume: i64,

    /// Turnover (traded value). Not every gm endpoint supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Bar {
    /// Build a bar and check the OHLC envelope.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Result<Self, BarError> {
        let bar = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            amount: None,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Attach a turnover figure.
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// `high >= max(open, close)`, `low <= min(open, close)`, `volume >= 0`, finite prices.
    pub fn validate(&self) -> Result<(), BarError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() {
                return Err(BarError::NonFinite { field, value });
            }
        }
        if self.high < self.open.max(self.close) {
            return Err(BarError::HighBelowBody {
                high: self.high,
                open: self.open,
                close: self.close,
            });
        }
        if self.low > self.open.min(self.close) {
            return Err(BarError::LowAboveBody {
                low: self.low,
                open: self.open,
                close: self.close,
            });
        }
        if self.volume < 0 {
            return Err(BarError::NegativeVolume(self.volume));
        }
        Ok(())
    }
}
