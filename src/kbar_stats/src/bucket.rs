//! Market-local bucket keys.
//!
//! - Daily buckets are local calendar dates in the session zone.
//! - N-minute buckets are `(date, slot minute)`, where the slot minute is the
//!   minute-of-day the bucket closes on (it may reach 1440).
//! - Morning bars are shifted by the session offset before rounding up, so a
//!   09:30 open lines 5-minute slots up on 09:35, 09:40, ... and 11:30 closes the
//!   morning exactly.
//!
//! Seconds are ignored when computing slots; the morning test uses the full
//! wall time.

use std::{collections::BTreeMap, fmt, num::NonZeroU32};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::session::{SessionCalendar, minute_of_day};

/// Number of minutes in a day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Key of an N-minute bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    /// Local trading date.
    pub date: NaiveDate,
    /// Minute-of-day the slot ends on, `0..=1440`.
    pub minute: u32,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:{:02}", self.date, self.minute / 60, self.minute % 60)
    }
}

/// Daily bucket of an instant.
pub fn day_key(ts: DateTime<Utc>, session: &SessionCalendar) -> NaiveDate {
    session.local_date(ts)
}

/// Closing minute-of-day of the `n`-minute slot that holds wall time `t`.
pub fn slot_minute(t: NaiveTime, n: NonZeroU32, session: &SessionCalendar) -> u32 {
    let n = n.get();
    let shift = if session.is_morning(t) {
        session.morning_offset()
    } else {
        0
    };
    let shifted = minute_of_day(t) + shift;
    shifted.div_ceil(n) * n - shift
}

/// N-minute bucket of an instant.
pub fn slot_key(ts: DateTime<Utc>, n: NonZeroU32, session: &SessionCalendar) -> SlotKey {
    let local = session.local_datetime(ts);
    SlotKey {
        date: local.date(),
        minute: slot_minute(local.time(), n, session),
    }
}

/// Groups `items` by `key`, keeping input order inside each bucket.
pub fn bucketize<K, T, I, F>(items: I, key: F) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> K,
{
    let mut buckets: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        buckets.entry(key(&item)).or_default().push(item);
    }
    buckets
}
