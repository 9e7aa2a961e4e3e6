use chrono::NaiveDate;
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde_json::Value;

use super::{DecodeError, Record, TimestampMode};
use crate::{
    models::bar::Bar,
    tz::{self, TimestampError},
};

/// Column names gm uses for a row's time; all are renamed to `timestamp`.
pub const TIMESTAMP_ALIASES: [&str; 3] = ["timestamp", "eob", "trade_date"];

const DATE_TEXT: &str = "%Y-%m-%d";
const DATETIME_TEXT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn render_timestamp(
    value: &Value,
    mode: TimestampMode,
    tz: Tz,
) -> Result<Value, TimestampError> {
    match mode {
        TimestampMode::Raw => Ok(value.clone()),
        TimestampMode::EpochMillis => {
            let dt = tz::parse_timestamp(value, tz)?;
            Ok(Value::from(tz::to_epoch_millis(dt)))
        }
        TimestampMode::LocalText => {
            let dt = tz::parse_timestamp(value, tz)?;
            let date_only = matches!(value, Value::String(s) if s.trim().len() <= 10);
            let fmt = if date_only { DATE_TEXT } else { DATETIME_TEXT };
            Ok(Value::String(tz::format_local(dt, tz, fmt)))
        }
    }
}

/// Rename `eob` / `trade_date` to `timestamp` and render the value per `mode`.
///
/// Column order is preserved. An unparseable time value fails the whole batch.
pub fn normalize_timestamps(
    records: Vec<Record>,
    mode: TimestampMode,
    tz: Tz,
) -> Result<Vec<Record>, DecodeError> {
    records
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            let mut out = Record::with_capacity(record.len());
            for (key, value) in record {
                if TIMESTAMP_ALIASES.contains(&key.as_str()) {
                    let rendered = render_timestamp(&value, mode, tz).map_err(|source| {
                        DecodeError::Timestamp {
                            row,
                            column: key.clone(),
                            source,
                        }
                    })?;
                    out.insert("timestamp".to_string(), rendered);
                } else {
                    out.insert(key, value);
                }
            }
            Ok(out)
        })
        .collect()
}

fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Group rows by their `symbol` column, dropping that column from each row.
pub fn group_by_symbol(records: Vec<Record>) -> Result<IndexMap<String, Vec<Record>>, DecodeError> {
    let mut grouped: IndexMap<String, Vec<Record>> = IndexMap::new();
    for (row, mut record) in records.into_iter().enumerate() {
        let symbol = record
            .shift_remove("symbol")
            .ok_or_else(|| DecodeError::MissingColumn {
                row,
                column: "symbol".into(),
            })?;
        grouped.entry(key_text(&symbol)).or_default().push(record);
    }
    Ok(grouped)
}

/// Index rows as `symbol -> timestamp -> fields`, dropping both key columns.
///
/// Timestamps are keyed by their textual form (epoch millis become digit strings).
/// A later row with the same key replaces an earlier one.
pub fn index_by_symbol_timestamp(
    records: Vec<Record>,
) -> Result<IndexMap<String, IndexMap<String, Record>>, DecodeError> {
    let mut indexed: IndexMap<String, IndexMap<String, Record>> = IndexMap::new();
    for (row, mut record) in records.into_iter().enumerate() {
        let missing = |column: &str| DecodeError::MissingColumn {
            row,
            column: column.into(),
        };
        let symbol = record.shift_remove("symbol").ok_or_else(|| missing("symbol"))?;
        let ts = record
            .shift_remove("timestamp")
            .ok_or_else(|| missing("timestamp"))?;
        indexed
            .entry(key_text(&symbol))
            .or_default()
            .insert(key_text(&ts), record);
    }
    Ok(indexed)
}

/// Keep rows whose `key` time falls on a local date in `[start, end]`.
///
/// Rows lacking the column or holding an unparseable value are skipped with a warning.
pub fn filter_by_date(
    records: Vec<Record>,
    key: &str,
    start: NaiveDate,
    end: NaiveDate,
    tz: Tz,
) -> Vec<Record> {
    let lo = tz::day_start(start, tz);
    let hi = tz::day_end_exclusive(end, tz);
    records
        .into_iter()
        .filter(|record| {
            let Some(value) = record.get(key) else {
                return false;
            };
            match tz::parse_timestamp(value, tz) {
                Ok(ts) => ts >= lo && ts < hi,
                Err(err) => {
                    tracing::warn!(key, %value, error = %err, "skipping row with unusable timestamp");
                    false
                }
            }
        })
        .collect()
}

/// Project rows onto `columns`, in that order. Absent columns are left out.
pub fn select_columns(records: Vec<Record>, columns: &[&str]) -> Vec<Record> {
    records
        .into_iter()
        .map(|mut record| {
            columns
                .iter()
                .filter_map(|c| record.shift_remove(*c).map(|v| (c.to_string(), v)))
                .collect()
        })
        .collect()
}

fn number(record: &Record, row: usize, column: &str) -> Result<f64, DecodeError> {
    let not_numeric = |found: String| DecodeError::NotNumeric {
        row,
        column: column.into(),
        found,
    };
    match record.get(column) {
        None => Err(DecodeError::MissingColumn {
            row,
            column: column.into(),
        }),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| not_numeric(n.to_string())),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| not_numeric(s.clone())),
        Some(other) => Err(not_numeric(other.to_string())),
    }
}

fn share_count(record: &Record, row: usize, column: &str) -> Result<i64, DecodeError> {
    if let Some(Value::Number(n)) = record.get(column) {
        if let Some(i) = n.as_i64() {
            return Ok(i);
        }
    }
    Ok(number(record, row, column)?.trunc() as i64)
}

/// Turn rows with `timestamp|eob|trade_date, open, high, low, close, volume`
/// (plus optional `amount`) into validated bars.
pub fn bars_from_records(records: &[Record], tz: Tz) -> Result<Vec<Bar>, DecodeError> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let (column, value) = TIMESTAMP_ALIASES
                .iter()
                .find_map(|k| record.get(*k).map(|v| (*k, v)))
                .ok_or_else(|| DecodeError::MissingColumn {
                    row,
                    column: "timestamp".into(),
                })?;
            let timestamp =
                tz::parse_timestamp(value, tz).map_err(|source| DecodeError::Timestamp {
                    row,
                    column: column.into(),
                    source,
                })?;

            let mut bar = Bar::new(
                timestamp,
                number(record, row, "open")?,
                number(record, row, "high")?,
                number(record, row, "low")?,
                number(record, row, "close")?,
                share_count(record, row, "volume")?,
            )
            .map_err(|source| DecodeError::InvalidBar { row, source })?;
            if record.contains_key("amount") {
                bar.amount = Some(number(record, row, "amount")?);
            }
            Ok(bar)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tz::MARKET_TZ;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn rec(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn eob_becomes_epoch_timestamp() {
        let rows = vec![rec(&[
            ("symbol", json!("SHSE.600000")),
            ("eob", json!("2024-03-11T09:31:00+08:00")),
            ("close", json!(10.2)),
        ])];
        let out = normalize_timestamps(rows, TimestampMode::EpochMillis, MARKET_TZ).unwrap();
        let keys: Vec<_> = out[0].keys().cloned().collect();
        assert_eq!(keys, ["symbol", "timestamp", "close"]);
        assert_eq!(out[0]["timestamp"], json!(1_710_120_660_000_i64));
    }

    #[test]
    fn local_text_keeps_date_only_values_short() {
        let rows = vec![
            rec(&[("trade_date", json!("2024-03-11"))]),
            rec(&[("eob", json!("2024-03-11T09:31:00+08:00"))]),
        ];
        let out = normalize_timestamps(rows, TimestampMode::LocalText, MARKET_TZ).unwrap();
        assert_eq!(out[0]["timestamp"], json!("2024-03-11"));
        assert_eq!(out[1]["timestamp"], json!("2024-03-11 09:31:00"));
    }

    #[test]
    fn unparseable_time_fails_normalization() {
        let rows = vec![rec(&[("eob", json!("soon"))])];
        assert!(matches!(
            normalize_timestamps(rows, TimestampMode::EpochMillis, MARKET_TZ),
            Err(DecodeError::Timestamp { row: 0, .. })
        ));
    }

    #[test]
    fn grouping_and_indexing_drop_key_columns() {
        let rows = || {
            vec![
                rec(&[("symbol", json!("A")), ("timestamp", json!(1)), ("v", json!(10))]),
                rec(&[("symbol", json!("B")), ("timestamp", json!(1)), ("v", json!(20))]),
                rec(&[("symbol", json!("A")), ("timestamp", json!(2)), ("v", json!(30))]),
            ]
        };
        let grouped = group_by_symbol(rows()).unwrap();
        assert_eq!(grouped["A"].len(), 2);
        assert!(!grouped["A"][0].contains_key("symbol"));

        let indexed = index_by_symbol_timestamp(rows()).unwrap();
        assert_eq!(indexed["A"]["2"]["v"], json!(30));
        assert_eq!(indexed["B"]["1"].len(), 1);

        let missing = vec![rec(&[("v", json!(1))])];
        assert!(group_by_symbol(missing).is_err());
    }

    #[test]
    fn date_filter_is_inclusive_and_lenient() {
        let rows = vec![
            rec(&[("timestamp", json!("2024-03-10 15:00:00"))]),
            rec(&[("timestamp", json!("2024-03-11 00:00:00"))]),
            rec(&[("timestamp", json!("2024-03-12 23:59:59"))]),
            rec(&[("timestamp", json!("2024-03-13 09:31:00"))]),
            rec(&[("timestamp", json!("garbage"))]),
            rec(&[("other", json!(1))]),
        ];
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let kept = filter_by_date(rows, "timestamp", d(11), d(12), MARKET_TZ);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn bars_from_rows() {
        let rows = vec![rec(&[
            ("timestamp", json!(1_710_120_660_000_i64)),
            ("open", json!(10.0)),
            ("high", json!(10.5)),
            ("low", json!("9.9")),
            ("close", json!(10.2)),
            ("volume", json!(1200.0)),
            ("amount", json!(12_240.0)),
        ])];
        let bars = bars_from_records(&rows, MARKET_TZ).unwrap();
        assert_eq!(
            bars[0].timestamp,
            Utc.with_ymd_and_hms(2024, 3, 11, 1, 31, 0).unwrap()
        );
        assert_eq!(bars[0].low, 9.9);
        assert_eq!(bars[0].volume, 1200);
        assert_eq!(bars[0].amount, Some(12_240.0));
    }

    #[test]
    fn invalid_bar_is_reported_with_row() {
        let rows = vec![rec(&[
            ("eob", json!("2024-03-11 09:31:00")),
            ("open", json!(10.0)),
            ("high", json!(9.0)),
            ("low", json!(8.0)),
            ("close", json!(10.2)),
            ("volume", json!(1)),
        ])];
        assert!(matches!(
            bars_from_records(&rows, MARKET_TZ),
            Err(DecodeError::InvalidBar { row: 0, .. })
        ));
        let no_volume = vec![rec(&[
            ("eob", json!("2024-03-11 09:31:00")),
            ("open", json!(1.0)),
            ("high", json!(1.0)),
            ("low", json!(1.0)),
            ("close", json!(1.0)),
        ])];
        assert!(matches!(
            bars_from_records(&no_volume, MARKET_TZ),
            Err(DecodeError::MissingColumn { .. })
        ));
    }

    #[test]
    fn select_keeps_requested_order() {
        let rows = vec![rec(&[
            ("symbol", json!("A")),
            ("close", json!(1.0)),
            ("timestamp", json!(5)),
        ])];
        let out = select_columns(rows, &["timestamp", "close", "volume"]);
        let keys: Vec<_> = out[0].keys().cloned().collect();
        assert_eq!(keys, ["timestamp", "close"]);
    }
}
