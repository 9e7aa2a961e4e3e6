//! Weighted ("golden") prices.
//!
//! The golden price of a bar blends its four prices with fixed weights; the
//! canonical blend is `(4·close + 2·open + high + low) / 8`. Volume-weighting
//! golden prices over a run of bars gives the cost-basis figures in
//! [`crate::cost_basis`].

use gm_ingestor::models::bar::Bar;
use serde::{Deserialize, Serialize};

use crate::error::AggregateError;

/// Per-price weights of a golden price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceWeights {
    /// Weight of the close.
    pub close: f64,
    /// Weight of the open.
    pub open: f64,
    /// Weight of the high.
    pub high: f64,
    /// Weight of the low.
    pub low: f64,
}

impl Default for PriceWeights {
    fn default() -> Self {
        Self::CANONICAL
    }
}

impl PriceWeights {
    /// `close 4, open 2, high 1, low 1`.
    pub const CANONICAL: PriceWeights = PriceWeights {
        close: 4.0,
        open: 2.0,
        high: 1.0,
        low: 1.0,
    };

    /// Finite, non-negative weights with a positive sum.
    pub fn new(close: f64, open: f64, high: f64, low: f64) -> Result<Self, AggregateError> {
        let weights = Self {
            close,
            open,
            high,
            low,
        };
        for (name, w) in [("close", close), ("open", open), ("high", high), ("low", low)] {
            if !w.is_finite() || w < 0.0 {
                return Err(AggregateError::InvalidWeights {
                    reason: format!("{name} weight {w} must be finite and non-negative"),
                });
            }
        }
        if weights.total() <= 0.0 {
            return Err(AggregateError::InvalidWeights {
                reason: "weights sum to zero".into(),
            });
        }
        Ok(weights)
    }

    /// Sum of the four weights.
    pub fn total(&self) -> f64 {
        self.close + self.open + self.high + self.low
    }
}

/// `(wc·C + wo·O + wh·H + wl·L) / (wc + wo + wh + wl)`.
pub fn golden_price(bar: &Bar, w: &PriceWeights) -> f64 {
    (w.close * bar.close + w.open * bar.open + w.high * bar.high + w.low * bar.low) / w.total()
}

/// [`golden_price`] of every bar.
pub fn golden_prices(bars: &[Bar], w: &PriceWeights) -> Vec<f64> {
    bars.iter().map(|b| golden_price(b, w)).collect()
}

/// Volume-weighted golden price; `0.0` when the bars traded nothing.
pub fn volume_weighted_price<'a, I>(bars: I, w: &PriceWeights) -> f64
where
    I: IntoIterator<Item = &'a Bar>,
{
    let (mut value, mut volume) = (0.0, 0i64);
    for bar in bars {
        value += bar.volume as f64 * golden_price(bar, w);
        volume += bar.volume;
    }
    if volume == 0 {
        return 0.0;
    }
    value / volume as f64
}
