//! Bar and tick roll-ups.
//!
//! Every roll-up folds a chronological run of inputs into one [`Bar`]:
//! first open, highest high, lowest low, last close, summed volume. Daily
//! roll-ups are stamped at local midnight; intraday roll-ups carry the
//! timestamp of their last input bar.
//!
//! Inputs are sorted by timestamp before bucketing. Empty input gives empty
//! output everywhere except [`ticks_to_daily_checked`].

use std::num::NonZeroU32;

use gm_ingestor::models::{bar::Bar, tick::Tick};

use crate::{
    bucket::{bucketize, day_key, slot_key},
    error::AggregateError,
    session::SessionCalendar,
    timeframe::RollupFrame,
};

/// Where a roll-up bar is stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupStamp {
    /// Local midnight of the first input bar's date.
    DayStart,
    /// Timestamp of the last input bar.
    LastBar,
}

/// Folds `bars` into one bar, or `None` when there is nothing to fold.
///
/// Bars are taken in the order given.
pub fn rollup(bars: &[Bar], stamp: RollupStamp, session: &SessionCalendar) -> Option<Bar> {
    let (first, last) = (bars.first()?, bars.last()?);
    let timestamp = match stamp {
        RollupStamp::DayStart => session.day_start(session.local_date(first.timestamp)),
        RollupStamp::LastBar => last.timestamp,
    };
    let mut out = Bar {
        timestamp,
        open: first.open,
        high: first.high,
        low: first.low,
        close: last.close,
        volume: 0,
        amount: None,
    };
    for bar in bars {
        out.high = out.high.max(bar.high);
        out.low = out.low.min(bar.low);
        out.volume += bar.volume;
        if let Some(amount) = bar.amount {
            out.amount = Some(out.amount.unwrap_or(0.0) + amount);
        }
    }
    Some(out)
}

fn sorted(bars: &[Bar]) -> Vec<Bar> {
    let mut bars = bars.to_vec();
    bars.sort_by_key(|b| b.timestamp);
    bars
}

/// Groups bars by local calendar date (market zone), ascending.
pub fn daily_groups(bars: &[Bar], session: &SessionCalendar) -> Vec<Vec<Bar>> {
    bucketize(sorted(bars), |b| day_key(b.timestamp, session))
        .into_values()
        .collect()
}

/// One midnight-stamped bar per local date.
pub fn to_daily(bars: &[Bar], session: &SessionCalendar) -> Vec<Bar> {
    daily_groups(bars, session)
        .iter()
        .filter_map(|day| rollup(day, RollupStamp::DayStart, session))
        .collect()
}

/// Session-aligned `n`-minute bars, each stamped with its last input bar.
pub fn to_minutes(
    bars: &[Bar],
    n: u32,
    session: &SessionCalendar,
) -> Result<Vec<Bar>, AggregateError> {
    let n = NonZeroU32::new(n).ok_or(AggregateError::ZeroInterval)?;
    Ok(minute_rollup(bars, n, session))
}

fn minute_rollup(bars: &[Bar], n: NonZeroU32, session: &SessionCalendar) -> Vec<Bar> {
    let out: Vec<Bar> = bucketize(sorted(bars), |b| slot_key(b.timestamp, n, session))
        .into_values()
        .filter_map(|slot| rollup(&slot, RollupStamp::LastBar, session))
        .collect();
    tracing::debug!(input = bars.len(), output = out.len(), n = n.get(), "minute roll-up");
    out
}

/// Rolls `bars` up to `frame`.
pub fn rollup_frame(bars: &[Bar], frame: RollupFrame, session: &SessionCalendar) -> Vec<Bar> {
    match frame {
        RollupFrame::Daily => to_daily(bars, session),
        RollupFrame::Minutes(n) => minute_rollup(bars, n, session),
    }
}

/// Daily bars built from trade prints; prices are taken as-is.
pub fn ticks_to_daily(ticks: &[Tick], session: &SessionCalendar) -> Vec<Bar> {
    let mut ticks = ticks.to_vec();
    ticks.sort_by_key(|t| t.timestamp);
    bucketize(ticks, |t| day_key(t.timestamp, session))
        .into_iter()
        .filter_map(|(date, day)| {
            let (first, last) = (day.first()?, day.last()?);
            let (mut high, mut low, mut volume) = (first.price, first.price, 0);
            for tick in &day {
                high = high.max(tick.price);
                low = low.min(tick.price);
                volume += tick.volume;
            }
            Some(Bar {
                timestamp: session.day_start(date),
                open: first.price,
                high,
                low,
                close: last.price,
                volume,
                amount: None,
            })
        })
        .collect()
}

/// [`ticks_to_daily`] that drops prints with a non-positive price or negative
/// volume, and fails when there is nothing left to aggregate.
pub fn ticks_to_daily_checked(
    ticks: &[Tick],
    session: &SessionCalendar,
) -> Result<Vec<Bar>, AggregateError> {
    if ticks.is_empty() {
        return Err(AggregateError::EmptyTicks);
    }
    let valid: Vec<Tick> = ticks.iter().filter(|t| t.is_valid()).cloned().collect();
    let dropped = ticks.len() - valid.len();
    if valid.is_empty() {
        return Err(AggregateError::NoValidTicks { dropped });
    }
    if dropped > 0 {
        tracing::warn!(dropped, kept = valid.len(), "dropping invalid ticks");
    }
    Ok(ticks_to_daily(&valid, session))
}
