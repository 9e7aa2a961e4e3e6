//! Opening and closing volume markers of a trading day.
//!
//! Markers are picked by exact market-local wall time (to the second):
//!
//! | field  | bars                             |
//! |--------|----------------------------------|
//! | `v931` | the 09:31:00 bar                 |
//! | `v932` | the 09:32:00 bar                 |
//! | `v935` | every bar up to 09:35:00         |
//! | `v940` | bars after 09:35:00 to 09:40:00  |
//! | `v150` | the 15:00:00 bar                 |
//!
//! A marker with no matching bar is 0. The single-minute markers take the
//! last bar stamped at that minute; the window markers sum.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use gm_ingestor::models::bar::Bar;
use serde::{Deserialize, Serialize};

use crate::{rollup::daily_groups, session::SessionCalendar};

/// Volume markers of one local date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionVolumes {
    /// Local trading date.
    pub date: NaiveDate,
    /// Volume of the first continuous-trading minute.
    pub v931: i64,
    /// Volume of the second minute.
    pub v932: i64,
    /// Volume up to and including 09:35.
    pub v935: i64,
    /// Volume from 09:36 through 09:40.
    pub v940: i64,
    /// Volume of the closing minute.
    pub v150: i64,
}

impl SessionVolumes {
    /// All-zero markers for `date`.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            v931: 0,
            v932: 0,
            v935: 0,
            v940: 0,
            v150: 0,
        }
    }

    /// Midnight of [`date`](Self::date) in the session zone.
    pub fn timestamp(&self, session: &SessionCalendar) -> DateTime<Utc> {
        session.day_start(self.date)
    }
}

const fn secs(h: u32, m: u32) -> u32 {
    h * 3600 + m * 60
}

const AT_931: u32 = secs(9, 31);
const AT_932: u32 = secs(9, 32);
const AT_935: u32 = secs(9, 35);
const AT_940: u32 = secs(9, 40);
const AT_1500: u32 = secs(15, 0);

fn wall_secs(t: NaiveTime) -> u32 {
    t.num_seconds_from_midnight()
}

/// Markers of one day's bars, dated by the first bar.
///
/// Returns `None` for an empty slice.
pub fn session_volumes(day_bars: &[Bar], session: &SessionCalendar) -> Option<SessionVolumes> {
    let first = day_bars.first()?;
    let mut out = SessionVolumes::empty(session.local_date(first.timestamp));
    for bar in day_bars {
        let at = wall_secs(session.time_of_day(bar.timestamp));
        match at {
            AT_931 => out.v931 = bar.volume,
            AT_932 => out.v932 = bar.volume,
            AT_1500 => out.v150 = bar.volume,
            _ => {}
        }
        if at <= AT_935 {
            out.v935 += bar.volume;
        } else if at <= AT_940 {
            out.v940 += bar.volume;
        }
    }
    Some(out)
}

/// [`session_volumes`] for every local date, ascending.
pub fn session_volumes_daily(bars: &[Bar], session: &SessionCalendar) -> Vec<SessionVolumes> {
    daily_groups(bars, session)
        .iter()
        .filter_map(|day| session_volumes(day, session))
        .collect()
}
