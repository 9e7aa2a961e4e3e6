#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use gm_ingestor::{models::bar::Bar, tz::MARKET_TZ};

/// Shanghai wall time on a March 2024 day.
pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    MARKET_TZ
        .with_ymd_and_hms(2024, 3, day, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// A bar whose high and low hug the body.
pub fn bar(ts: DateTime<Utc>, open: f64, close: f64, volume: i64) -> Bar {
    Bar::new(ts, open, open.max(close), open.min(close), close, volume).unwrap()
}

/// Every minute of one A-share trading day (09:31..=11:30, 13:01..=15:00).
pub fn session_minutes(day: u32) -> Vec<DateTime<Utc>> {
    let morning = (0..120).map(move |i| at(day, 9, 31) + Duration::minutes(i));
    let afternoon = (0..120).map(move |i| at(day, 13, 1) + Duration::minutes(i));
    morning.chain(afternoon).collect()
}

/// A minute CSV as the archive serves it.
pub fn minute_csv(rows: &[(&str, f64, f64, i64)]) -> String {
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for (ts, open, close, volume) in rows {
        csv.push_str(&format!(
            "{ts},{open},{},{},{close},{volume}\n",
            open.max(*close),
            open.min(*close)
        ));
    }
    csv
}
