//! Daily cost-basis estimates from 1-minute bars.
//!
//! For each trading day:
//! - `vmed`: the volume level the busiest 12.5% of bars trade above
//!   ([`volume_median`]).
//! - `cbj`: canonical golden-price VWAP over the bars busier than `vmed`.
//! - `cb1` / `cb2`: the same VWAP over every bar up to the cutoff (10:00:00 by
//!   default) and after it.
//! - `nup` / `ndown`: gap counts from [`up_down_counts`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use gm_ingestor::models::bar::Bar;
use serde::{Deserialize, Serialize};

use crate::{
    price::{PriceWeights, volume_weighted_price},
    rollup::daily_groups,
    session::SessionCalendar,
    volume::{up_down_counts, volume_median},
};

/// Percent of bars that lie above `vmed`.
pub const BUSY_PCT: f64 = 12.5;

/// Default split between the early and late windows.
pub const DEFAULT_CUTOFF: NaiveTime = match NaiveTime::from_hms_opt(10, 0, 0) {
    Some(t) => t,
    None => NaiveTime::MIN,
};

/// Cost-basis figures of one local date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBasis {
    /// Local trading date.
    pub date: NaiveDate,
    /// Busy-bar volume threshold.
    pub vmed: i64,
    /// VWAP of bars above `vmed`.
    pub cbj: f64,
    /// VWAP up to the cutoff.
    pub cb1: f64,
    /// VWAP after the cutoff.
    pub cb2: f64,
    /// Bars opening below the previous close.
    pub nup: i64,
    /// Bars opening above the previous close.
    pub ndown: i64,
}

impl CostBasis {
    /// Midnight of [`date`](Self::date) in the session zone.
    pub fn timestamp(&self, session: &SessionCalendar) -> DateTime<Utc> {
        session.day_start(self.date)
    }
}

/// Cost basis of one day's bars, dated by the first bar.
///
/// Bars at or before `cutoff` (local wall time) feed `cb1`. Returns `None` for
/// an empty slice.
pub fn cost_basis(
    day_bars: &[Bar],
    cutoff: NaiveTime,
    session: &SessionCalendar,
) -> Option<CostBasis> {
    let first = day_bars.first()?;
    let w = PriceWeights::CANONICAL;
    let vmed = volume_median(day_bars, BUSY_PCT);
    let (early, late): (Vec<&Bar>, Vec<&Bar>) = day_bars
        .iter()
        .partition(|b| session.time_of_day(b.timestamp) <= cutoff);
    let counts = up_down_counts(day_bars);
    Some(CostBasis {
        date: session.local_date(first.timestamp),
        vmed,
        cbj: volume_weighted_price(day_bars.iter().filter(|b| b.volume > vmed), &w),
        cb1: volume_weighted_price(early, &w),
        cb2: volume_weighted_price(late, &w),
        nup: counts.up,
        ndown: counts.down,
    })
}

/// [`cost_basis`] for every local date, ascending.
pub fn cost_basis_daily(
    bars: &[Bar],
    cutoff: NaiveTime,
    session: &SessionCalendar,
) -> Vec<CostBasis> {
    daily_groups(bars, session)
        .iter()
        .filter_map(|day| cost_basis(day, cutoff, session))
        .collect()
}
