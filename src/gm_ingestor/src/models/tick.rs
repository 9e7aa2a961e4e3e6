use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One trade print from an intraday (分时) feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: i64,
}

impl Tick {
    pub fn new(timestamp: DateTime<Utc>, price: f64, volume: i64) -> Self {
        Self {
            timestamp,
            price,
            volume,
        }
    }

    /// Positive price and non-negative volume.
    pub fn is_valid(&self) -> bool {
        self.price > 0.0 && self.volume >= 0
    }
}
