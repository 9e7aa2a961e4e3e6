//! Timestamp parsing and time zone helpers.
//!
//! What this module provides:
//! - [`parse_timestamp`]: accept the many shapes the gm endpoints and CSV archives
//!   use for time values (RFC-3339, naive date/time strings, US-style dates, Unix
//!   seconds or milliseconds as numbers or strings) and resolve them to UTC.
//! - [`from_local_naive_with_policy`]: convert a naive wall time in an IANA zone to
//!   UTC, choosing how DST gaps and ambiguities are resolved via [`DstPolicy`].
//! - Epoch millisecond conversions ([`to_epoch_millis`], [`from_epoch_millis`]) that
//!   round-trip the same instant.
//! - Local calendar helpers ([`day_start`], [`day_end_exclusive`], [`format_local`]).
//!
//! Notes:
//! - Naive wall times carry no offset. They are interpreted in the market zone the
//!   caller passes in (normally [`MARKET_TZ`], Asia/Shanghai), never in UTC.
//! - Integers greater than [`MILLIS_THRESHOLD`] are taken as milliseconds, anything
//!   smaller as seconds. 1e12 ms is 2001-09-09, 1e12 s is far past year 9999, so the
//!   two ranges never overlap for market data.
//!
//! Examples
//! - "2024-03-11T09:31:00+08:00" -> 2024-03-11T01:31:00Z
//! - "2024-03-11 09:31:00" in Asia/Shanghai -> 2024-03-11T01:31:00Z
//! - 1710120660000 -> 2024-03-11T01:31:00Z (milliseconds)
//! - "1710120660" -> 2024-03-11T01:31:00Z (seconds)

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use thiserror::Error;

/// Exchange zone for SHSE/SZSE symbols.
pub const MARKET_TZ: Tz = chrono_tz::Asia::Shanghai;

/// Integers above this are epoch milliseconds; at or below, epoch seconds.
pub const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Naive date-time layouts tried in order after RFC-3339.
const NAIVE_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Date-only layouts; they resolve to local midnight.
const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Errors raised while turning a raw value into an instant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimestampError {
    /// The string matched none of the supported layouts.
    #[error("unrecognized timestamp format: {0:?}")]
    Unrecognized(String),

    /// The epoch number is outside chrono's representable range.
    #[error("epoch value out of range: {0}")]
    OutOfRange(i64),

    /// The JSON value is neither a string nor a number.
    #[error("unsupported timestamp value: {0}")]
    Unsupported(String),

    /// The wall time is skipped or repeated in the zone and the policy did not resolve it.
    #[error("local time {naive} cannot be resolved in {tz}: {reason}")]
    Local {
        naive: NaiveDateTime,
        tz: Tz,
        reason: &'static str,
    },
}

/// Policy for handling DST edge cases when converting local naive timestamps to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstPolicy {
    /// Error on ambiguous (fall-back) or nonexistent (spring-forward) local times.
    Strict,
    /// For ambiguous local times pick the earlier instant.
    PreferEarliest,
    /// For ambiguous local times pick the later instant.
    PreferLatest,
    /// For nonexistent local times step forward minute by minute (capped at 2 hours);
    /// ambiguous times take the earlier instant.
    ShiftForward,
}

/// Convert a naive local timestamp to UTC in `tz` under the given DST policy.
pub fn from_local_naive_with_policy(
    naive: NaiveDateTime,
    tz: Tz,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TimestampError> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(a, b) => match policy {
            DstPolicy::PreferEarliest | DstPolicy::ShiftForward => Ok(a.with_timezone(&Utc)),
            DstPolicy::PreferLatest => Ok(b.with_timezone(&Utc)),
            DstPolicy::Strict => Err(TimestampError::Local {
                naive,
                tz,
                reason: "ambiguous",
            }),
        },
        None => {
            if policy == DstPolicy::ShiftForward {
                let mut t = naive;
                for _ in 0..120 {
                    t += Duration::minutes(1);
                    if let Single(dt) = tz.from_local_datetime(&t) {
                        return Ok(dt.with_timezone(&Utc));
                    }
                }
            }
            Err(TimestampError::Local {
                naive,
                tz,
                reason: "nonexistent",
            })
        }
    }
}

/// Parse a JSON scalar (string or number) into a UTC instant.
///
/// Floats are truncated to whole units before the seconds/millis decision.
pub fn parse_timestamp(value: &Value, tz: Tz) -> Result<DateTime<Utc>, TimestampError> {
    match value {
        Value::String(s) => parse_timestamp_str(s, tz),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                from_epoch_number(i)
            } else if let Some(f) = n.as_f64() {
                from_epoch_number(f.trunc() as i64)
            } else {
                Err(TimestampError::Unsupported(n.to_string()))
            }
        }
        other => Err(TimestampError::Unsupported(other.to_string())),
    }
}

/// Parse a textual timestamp; see the module docs for the accepted layouts.
pub fn parse_timestamp_str(raw: &str, tz: Tz) -> Result<DateTime<Utc>, TimestampError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return from_local_naive_with_policy(naive, tz, DstPolicy::ShiftForward);
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(day_start(date, tz));
        }
    }
    if let Ok(n) = s.parse::<i64>() {
        return from_epoch_number(n);
    }

    Err(TimestampError::Unrecognized(raw.to_string()))
}

/// Interpret an integer as epoch milliseconds or seconds (see [`MILLIS_THRESHOLD`]).
pub fn from_epoch_number(n: i64) -> Result<DateTime<Utc>, TimestampError> {
    if n > MILLIS_THRESHOLD {
        from_epoch_millis(n)
    } else {
        DateTime::from_timestamp(n, 0).ok_or(TimestampError::OutOfRange(n))
    }
}

/// Milliseconds since the Unix epoch.
pub fn to_epoch_millis(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Inverse of [`to_epoch_millis`].
pub fn from_epoch_millis(ms: i64) -> Result<DateTime<Utc>, TimestampError> {
    DateTime::from_timestamp_millis(ms).ok_or(TimestampError::OutOfRange(ms))
}

/// Local midnight of `date` in `tz`, as UTC.
///
/// In zones where midnight is skipped the first valid instant after it is used.
pub fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    from_local_naive_with_policy(naive, tz, DstPolicy::ShiftForward)
        .unwrap_or_else(|_| Utc.from_utc_datetime(&naive))
}

/// Start of the day after `date`; the exclusive upper bound of `date`.
pub fn day_end_exclusive(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    match date.succ_opt() {
        Some(next) => day_start(next, tz),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Calendar date of `dt` in `tz`.
pub fn local_date(dt: DateTime<Utc>, tz: Tz) -> NaiveDate {
    dt.with_timezone(&tz).date_naive()
}

/// Format `dt` in `tz` with a strftime pattern.
pub fn format_local(dt: DateTime<Utc>, tz: Tz, fmt: &str) -> String {
    dt.with_timezone(&tz).format(fmt).to_string()
}

/// Format a UTC datetime as an RFC-3339 string with millisecond precision.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
    }

    #[test]
    fn rfc3339_with_offset() {
        let got = parse_timestamp_str("2024-03-11T09:31:00+08:00", MARKET_TZ).unwrap();
        assert_eq!(got, utc(2024, 3, 11, 1, 31, 0));
    }

    #[test]
    fn naive_strings_are_market_local() {
        let want = utc(2024, 3, 11, 1, 31, 0);
        for s in [
            "2024-03-11 09:31:00",
            "2024-03-11T09:31:00",
            "03/11/2024 09:31:00",
        ] {
            assert_eq!(parse_timestamp_str(s, MARKET_TZ).unwrap(), want, "{s}");
        }
    }

    #[test]
    fn date_only_is_local_midnight() {
        let want = utc(2024, 3, 10, 16, 0, 0);
        assert_eq!(parse_timestamp_str("2024-03-11", MARKET_TZ).unwrap(), want);
        assert_eq!(parse_timestamp_str("03/11/2024", MARKET_TZ).unwrap(), want);
    }

    #[test]
    fn numbers_pick_seconds_or_millis() {
        let want = utc(2024, 3, 11, 1, 31, 0);
        assert_eq!(parse_timestamp(&json!(1710120660000_i64), MARKET_TZ).unwrap(), want);
        assert_eq!(parse_timestamp(&json!(1710120660), MARKET_TZ).unwrap(), want);
        assert_eq!(parse_timestamp(&json!("1710120660000"), MARKET_TZ).unwrap(), want);
        assert_eq!(parse_timestamp(&json!(1710120660.9), MARKET_TZ).unwrap(), want);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_timestamp_str("yesterday", MARKET_TZ),
            Err(TimestampError::Unrecognized(_))
        ));
        assert!(matches!(
            parse_timestamp(&json!(true), MARKET_TZ),
            Err(TimestampError::Unsupported(_))
        ));
        assert!(parse_timestamp(&json!(null), MARKET_TZ).is_err());
    }

    #[test]
    fn epoch_millis_round_trip() {
        let t = Utc.timestamp_millis_opt(1_710_120_660_123).unwrap();
        assert_eq!(from_epoch_millis(to_epoch_millis(t)).unwrap(), t);
    }

    #[test]
    fn day_bounds_in_market_zone() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert_eq!(day_start(d, MARKET_TZ), utc(2024, 3, 10, 16, 0, 0));
        assert_eq!(day_end_exclusive(d, MARKET_TZ), utc(2024, 3, 11, 16, 0, 0));
        assert_eq!(local_date(utc(2024, 3, 10, 16, 0, 0), MARKET_TZ), d);
    }

    #[test]
    fn ny_spring_forward_gap() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(from_local_naive_with_policy(naive, tz, DstPolicy::Strict).is_err());
        let got = from_local_naive_with_policy(naive, tz, DstPolicy::ShiftForward).unwrap();
        assert_eq!(got, utc(2024, 3, 10, 7, 0, 0));
    }

    #[test]
    fn ny_fall_back_ambiguity() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        assert!(from_local_naive_with_policy(naive, tz, DstPolicy::Strict).is_err());
        assert_eq!(
            from_local_naive_with_policy(naive, tz, DstPolicy::PreferEarliest).unwrap(),
            utc(2024, 11, 3, 5, 30, 0)
        );
        assert_eq!(
            from_local_naive_with_policy(naive, tz, DstPolicy::PreferLatest).unwrap(),
            utc(2024, 11, 3, 6, 30, 0)
        );
    }

    #[test]
    fn rfc3339_millis_format() {
        assert_eq!(
            to_rfc3339_millis(utc(2024, 3, 11, 1, 31, 0)),
            "2024-03-11T01:31:00.000Z"
        );
        assert_eq!(
            format_local(utc(2024, 3, 11, 1, 31, 0), MARKET_TZ, "%H:%M:%S"),
            "09:31:00"
        );
    }
}
