//! Exchange trading sessions and market-local clock helpers.
//!
//! What this module provides:
//! - [`SessionCalendar`]: a split trading day (morning and afternoon session)
//!   in one IANA time zone, defaulting to the China A-share hours
//!   (`Asia/Shanghai`, 09:30–11:30 and 13:00–15:00).
//! - Conversions from UTC instants to market-local dates and wall times, used by
//!   every bucketing routine in this crate.
//! - Open/closed checks and the next session open.
//!
//! Notes:
//! - Comparisons happen at minute precision: 11:30:59 still counts as the
//!   morning session, matching how the exchange stamps its last bar.
//! - Weekends are closed. Exchange holidays are not known here; use the gm
//!   trading calendar when they matter.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use gm_ingestor::{config::MarketCfg, tz};

/// Split trading day in a fixed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCalendar {
    /// Zone of every wall time below.
    pub tz: Tz,
    /// First minute of the morning session.
    pub morning_open: NaiveTime,
    /// Last minute of the morning session.
    pub morning_close: NaiveTime,
    /// First minute of the afternoon session.
    pub afternoon_open: NaiveTime,
    /// Last minute of the afternoon session.
    pub afternoon_close: NaiveTime,
}

const fn hm(hour: u32, minute: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(t) => t,
        None => NaiveTime::MIN,
    }
}

impl Default for SessionCalendar {
    fn default() -> Self {
        Self::A_SHARE
    }
}

impl SessionCalendar {
    /// Shanghai and Shenzhen continuous trading hours.
    pub const A_SHARE: SessionCalendar = SessionCalendar {
        tz: tz::MARKET_TZ,
        morning_open: hm(9, 30),
        morning_close: hm(11, 30),
        afternoon_open: hm(13, 0),
        afternoon_close: hm(15, 0),
    };

    /// A-share hours in the zone named by `[market].timezone`.
    pub fn from_market_cfg(cfg: &MarketCfg) -> anyhow::Result<Self> {
        Ok(Self {
            tz: cfg.tz()?,
            ..Self::A_SHARE
        })
    }

    /// Market-local calendar date of an instant.
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        tz::local_date(ts, self.tz)
    }

    /// Market-local wall clock of an instant.
    pub fn local_datetime(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        ts.with_timezone(&self.tz).naive_local()
    }

    /// Market-local time of day of an instant.
    pub fn time_of_day(&self, ts: DateTime<Utc>) -> NaiveTime {
        self.local_datetime(ts).time()
    }

    /// Midnight of `date` in the market zone.
    pub fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        tz::day_start(date, self.tz)
    }

    /// Whether `t` belongs to the morning half for slot alignment.
    pub fn is_morning(&self, t: NaiveTime) -> bool {
        t <= self.morning_close
    }

    /// Minutes that shift the morning open onto a whole hour (30 for a 09:30 open).
    pub fn morning_offset(&self) -> u32 {
        (60 - self.morning_open.minute()) % 60
    }

    /// Monday to Friday.
    pub fn is_trading_weekday(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Whether either session is running at `ts` (both ends inclusive).
    pub fn is_open_at(&self, ts: DateTime<Utc>) -> bool {
        let local = self.local_datetime(ts);
        if !self.is_trading_weekday(local.date()) {
            return false;
        }
        let now = minute_of_day(local.time());
        let within = |open: NaiveTime, close: NaiveTime| {
            now >= minute_of_day(open) && now <= minute_of_day(close)
        };
        within(self.morning_open, self.morning_close)
            || within(self.afternoon_open, self.afternoon_close)
    }

    /// Whether the trading day of `ts` has started (false on weekends).
    pub fn has_opened(&self, ts: DateTime<Utc>) -> bool {
        let local = self.local_datetime(ts);
        self.is_trading_weekday(local.date())
            && minute_of_day(local.time()) >= minute_of_day(self.morning_open)
    }

    /// Whether the trading day of `ts` has ended (false on weekends).
    pub fn has_closed(&self, ts: DateTime<Utc>) -> bool {
        let local = self.local_datetime(ts);
        self.is_trading_weekday(local.date())
            && minute_of_day(local.time()) >= minute_of_day(self.afternoon_close)
    }

    /// The first session open strictly after `ts`.
    pub fn next_open_after(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let local = self.local_datetime(ts);
        let mut date = local.date();
        if self.is_trading_weekday(date) {
            for open in [self.morning_open, self.afternoon_open] {
                if local.time() < open {
                    return self.at(date, open);
                }
            }
        }
        loop {
            date = match date.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => return self.at(date, self.morning_open),
            };
            if self.is_trading_weekday(date) {
                return self.at(date, self.morning_open);
            }
        }
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        tz::from_local_naive_with_policy(date.and_time(time), self.tz, tz::DstPolicy::ShiftForward)
            .unwrap_or_else(|_| date.and_time(time).and_utc())
    }
}

/// `60 * hour + minute`.
pub fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sh(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        tz::MARKET_TZ
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn sessions_are_inclusive_at_minute_precision() {
        let cal = SessionCalendar::default();
        // 2024-03-11 is a Monday
        assert!(!cal.is_open_at(sh(2024, 3, 11, 9, 29)));
        assert!(cal.is_open_at(sh(2024, 3, 11, 9, 30)));
        assert!(cal.is_open_at(sh(2024, 3, 11, 11, 30) + chrono::Duration::seconds(59)));
        assert!(!cal.is_open_at(sh(2024, 3, 11, 12, 0)));
        assert!(cal.is_open_at(sh(2024, 3, 11, 15, 0)));
        assert!(!cal.is_open_at(sh(2024, 3, 11, 15, 1)));
        assert!(!cal.is_open_at(sh(2024, 3, 9, 10, 0)));
    }

    #[test]
    fn next_open_walks_sessions_and_weekends() {
        let cal = SessionCalendar::default();
        assert_eq!(cal.next_open_after(sh(2024, 3, 11, 8, 0)), sh(2024, 3, 11, 9, 30));
        assert_eq!(cal.next_open_after(sh(2024, 3, 11, 10, 0)), sh(2024, 3, 11, 13, 0));
        assert_eq!(cal.next_open_after(sh(2024, 3, 11, 12, 0)), sh(2024, 3, 11, 13, 0));
        assert_eq!(cal.next_open_after(sh(2024, 3, 11, 16, 0)), sh(2024, 3, 12, 9, 30));
        // Friday evening -> Monday morning
        assert_eq!(cal.next_open_after(sh(2024, 3, 15, 15, 30)), sh(2024, 3, 18, 9, 30));
        assert_eq!(cal.next_open_after(sh(2024, 3, 16, 10, 0)), sh(2024, 3, 18, 9, 30));
    }

    #[test]
    fn opened_and_closed_flags() {
        let cal = SessionCalendar::default();
        assert!(!cal.has_opened(sh(2024, 3, 11, 9, 0)));
        assert!(cal.has_opened(sh(2024, 3, 11, 9, 30)));
        assert!(!cal.has_closed(sh(2024, 3, 11, 14, 59)));
        assert!(cal.has_closed(sh(2024, 3, 11, 15, 0)));
        assert!(!cal.has_opened(sh(2024, 3, 10, 10, 0)));
    }

    #[test]
    fn local_clock_and_offset() {
        let cal = SessionCalendar::default();
        let ts = sh(2024, 3, 11, 0, 30);
        assert_eq!(cal.local_date(ts), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(cal.time_of_day(ts), hm(0, 30));
        assert_eq!(cal.morning_offset(), 30);
        assert!(cal.is_morning(hm(11, 30)));
        assert!(!cal.is_morning(hm(11, 31)));
    }

    #[test]
    fn zone_comes_from_market_config() {
        let cfg = MarketCfg {
            timezone: "Asia/Hong_Kong".into(),
            ..MarketCfg::default()
        };
        let cal = SessionCalendar::from_market_cfg(&cfg).unwrap();
        assert_eq!(cal.tz, chrono_tz::Asia::Hong_Kong);
        assert_eq!(cal.morning_open, hm(9, 30));
    }
}
