//! Bars reshaped into JSON objects keyed by timestamp, for chart front ends.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use gm_ingestor::{models::bar::Bar, tz::MARKET_TZ};
//! use kbar_stats::keyed::{KeyStyle, KeyedOptions, to_keyed_json};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 3, 11, 1, 31, 0).unwrap();
//! let bar = Bar::new(ts, 10.0, 10.5, 9.9, 10.2, 1200).unwrap();
//! let opts = KeyedOptions { style: KeyStyle::UnixMillis, pretty: false };
//! let json = to_keyed_json(&[bar], &opts, MARKET_TZ).unwrap();
//! assert!(json.starts_with(r#"{"1710120660000":{"open":10.0"#));
//! ```

use chrono::{DateTime, SecondsFormat, Utc, format::{Item, StrftimeItems}};
use chrono_tz::Tz;
use gm_ingestor::{models::bar::Bar, tz};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::KeyedError;

/// How bars are keyed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// `2024-03-11T09:31:00+08:00`
    #[default]
    Rfc3339,
    /// Unix seconds as a decimal string.
    UnixSeconds,
    /// Unix milliseconds as a decimal string.
    UnixMillis,
    /// A strftime pattern rendered in the market zone.
    Custom(String),
    /// RFC 3339 keys with `[open, high, low, close, volume]` arrays.
    Compact,
    /// `date -> HH:MM:SS -> bar`.
    NestedByDate,
}

/// Rendering options for [`to_keyed_json`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyedOptions {
    /// Key layout.
    pub style: KeyStyle,
    /// Two-space indented output.
    pub pretty: bool,
}

/// Price and volume of one keyed bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Shares traded.
    pub volume: i64,
}

impl From<&Bar> for Ohlcv {
    fn from(bar: &Bar) -> Self {
        Self {
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// One value of a keyed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyedEntry {
    /// Object form.
    Bar(Ohlcv),
    /// `[open, high, low, close, volume]`.
    Compact(f64, f64, f64, f64, i64),
    /// Bars of one date keyed by wall time.
    Day(IndexMap<String, Ohlcv>),
}

fn check_format(fmt: &str) -> Result<(), KeyedError> {
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(KeyedError::BadFormat(fmt.to_string()));
    }
    Ok(())
}

fn rfc3339(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Bars keyed per `style`, in chronological order. Later bars win on key clashes.
pub fn to_keyed(
    bars: &[Bar],
    style: &KeyStyle,
    tz: Tz,
) -> Result<IndexMap<String, KeyedEntry>, KeyedError> {
    let mut bars: Vec<&Bar> = bars.iter().collect();
    bars.sort_by_key(|b| b.timestamp);

    let mut out = IndexMap::with_capacity(bars.len());
    if let KeyStyle::NestedByDate = style {
        let mut days: IndexMap<String, IndexMap<String, Ohlcv>> = IndexMap::new();
        for bar in bars {
            days.entry(tz::format_local(bar.timestamp, tz, "%Y-%m-%d"))
                .or_default()
                .insert(tz::format_local(bar.timestamp, tz, "%H:%M:%S"), bar.into());
        }
        out.extend(days.into_iter().map(|(d, m)| (d, KeyedEntry::Day(m))));
        return Ok(out);
    }

    if let KeyStyle::Custom(fmt) = style {
        check_format(fmt)?;
    }
    for bar in bars {
        let key = match style {
            KeyStyle::Rfc3339 | KeyStyle::Compact => rfc3339(bar.timestamp, tz),
            KeyStyle::UnixSeconds => bar.timestamp.timestamp().to_string(),
            KeyStyle::UnixMillis => tz::to_epoch_millis(bar.timestamp).to_string(),
            KeyStyle::Custom(fmt) => tz::format_local(bar.timestamp, tz, fmt),
            KeyStyle::NestedByDate => continue,
        };
        let entry = match style {
            KeyStyle::Compact => {
                KeyedEntry::Compact(bar.open, bar.high, bar.low, bar.close, bar.volume)
            }
            _ => KeyedEntry::Bar(bar.into()),
        };
        out.insert(key, entry);
    }
    Ok(out)
}

/// [`to_keyed`] rendered as a JSON string; no bars gives `{}`.
pub fn to_keyed_json(bars: &[Bar], opts: &KeyedOptions, tz: Tz) -> Result<String, KeyedError> {
    if bars.is_empty() {
        return Ok("{}".to_string());
    }
    let doc = to_keyed(bars, &opts.style, tz)?;
    let json = if opts.pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    Ok(json)
}

/// Finds the bar stored under `key` in a flat keyed document.
pub fn lookup(json: &str, key: &str) -> Result<Ohlcv, KeyedError> {
    let mut doc: IndexMap<String, Ohlcv> = serde_json::from_str(json)?;
    doc.swap_remove(key)
        .ok_or_else(|| KeyedError::MissingKey(key.to_string()))
}

/// Candle in the shape klinecharts expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KLine {
    /// Unix milliseconds.
    pub timestamp: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Shares traded.
    pub volume: i64,
    /// Traded value, needed by the EMV and AVP overlays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnover: Option<f64>,
}

impl From<&Bar> for KLine {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: tz::to_epoch_millis(bar.timestamp),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            turnover: bar.amount,
        }
    }
}

/// [`KLine`] of every bar, in input order.
pub fn klines(bars: &[Bar]) -> Vec<KLine> {
    bars.iter().map(KLine::from).collect()
}
