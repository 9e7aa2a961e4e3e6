//! Volume percentiles and bar-to-bar gap counts.

use gm_ingestor::models::bar::Bar;
use serde::{Deserialize, Serialize};

/// Midpoint percentile of ascending `sorted` data.
///
/// With `r = pct / 100` and `n = sorted.len()` this averages the
/// `min(n, ceil(n·r))`-th and `max(0, floor(n·r))`-th values (1-based), both
/// clamped into `1..=n`. Empty input gives `0.0`.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let pos = n as f64 * pct / 100.0;
    let rank = |r: f64| -> usize {
        // NaN casts to 0 and lands on the first element
        (r as usize).clamp(1, n) - 1
    };
    let hi = rank(pos.ceil().min(n as f64));
    let lo = rank(pos.floor().max(0.0));
    (sorted[hi] + sorted[lo]) / 2.0
}

/// Volume level that `pct` percent of the bars trade above.
///
/// Sorts the volumes and takes [`percentile`] at `100 - pct`, truncated.
pub fn volume_median(bars: &[Bar], pct: f64) -> i64 {
    let mut volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    volumes.sort_by(f64::total_cmp);
    percentile(&volumes, 100.0 - pct) as i64
}

/// Gaps between consecutive bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCounts {
    /// Bars that opened below the previous close.
    pub up: i64,
    /// Bars that opened above the previous close.
    pub down: i64,
}

/// Compares each bar's open with the previous close.
///
/// A previous close above the current open counts as `up`, below as `down`;
/// the names follow the gm indicator columns `nup` and `ndown`.
pub fn up_down_counts(bars: &[Bar]) -> TickCounts {
    let mut counts = TickCounts::default();
    for pair in bars.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if prev.close > cur.open {
            counts.up += 1;
        } else if prev.close < cur.open {
            counts.down += 1;
        }
    }
    counts
}
