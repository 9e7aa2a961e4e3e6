use chrono_tz::Tz;

use super::{reshape::render_timestamp, scalar::parse_scalar, DecodeError, Record, TimestampMode};

/// Decode a CSV payload whose first row is the header.
///
/// Every cell goes through [`parse_scalar`]. When `mode` is not
/// [`TimestampMode::Raw`], the `ts_key` column and a `timestamp` column (if
/// present) are rewritten accordingly; a cell that cannot be read as a
/// timestamp fails the whole payload. Error rows are zero-based data rows,
/// so row 0 is the line after the header.
///
/// Errors: empty payload, ragged rows, unparseable timestamps.
pub fn decode_csv(
    bytes: &[u8],
    mode: TimestampMode,
    ts_key: &str,
    tz: Tz,
) -> Result<Vec<Record>, DecodeError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(::csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(DecodeError::EmptyCsv);
    }
    let ts_cols: Vec<usize> = if mode == TimestampMode::Raw {
        Vec::new()
    } else {
        headers
            .iter()
            .enumerate()
            .filter(|(_, h)| *h == ts_key || *h == "timestamp")
            .map(|(idx, _)| idx)
            .collect()
    };
    if ts_cols.is_empty() && mode != TimestampMode::Raw {
        tracing::debug!(ts_key, "CSV has no timestamp column to normalize");
    }

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let raw = result?;
        let mut record = Record::with_capacity(headers.len());
        for (idx, (name, cell)) in headers.iter().zip(raw.iter()).enumerate() {
            let mut value = parse_scalar(cell);
            if ts_cols.contains(&idx) {
                value = render_timestamp(&value, mode, tz).map_err(|source| {
                    DecodeError::Timestamp {
                        row,
                        column: name.clone(),
                        source,
                    }
                })?;
            }
            record.insert(name.clone(), value);
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tz::MARKET_TZ;
    use serde_json::json;

    const SAMPLE: &str = "\
timestamp,open,high,low,close,volume
2024-03-11 09:31:00,10.0,10.5,9.9,10.2,1200
2024-03-11 09:32:00,10.2,10.4,10.1,10.3,800
";

    #[test]
    fn raw_mode_keeps_text_and_types_numbers() {
        let records =
            decode_csv(SAMPLE.as_bytes(), TimestampMode::Raw, "timestamp", MARKET_TZ).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["timestamp"], json!("2024-03-11 09:31:00"));
        assert_eq!(records[0]["volume"], json!(1200));
        assert_eq!(records[1]["close"], json!(10.3));
    }

    #[test]
    fn epoch_mode_rewrites_the_key_column() {
        let records = decode_csv(
            SAMPLE.as_bytes(),
            TimestampMode::EpochMillis,
            "timestamp",
            MARKET_TZ,
        )
        .unwrap();
        assert_eq!(records[0]["timestamp"], json!(1_710_120_660_000_i64));
    }

    #[test]
    fn epoch_mode_rewrites_key_and_timestamp_columns() {
        let csv = "\
eob,timestamp,close
2024-03-11 09:31:00,2024-03-11 09:30:00,10.2
";
        let records =
            decode_csv(csv.as_bytes(), TimestampMode::EpochMillis, "eob", MARKET_TZ).unwrap();
        assert_eq!(records[0]["eob"], json!(1_710_120_660_000_i64));
        assert_eq!(records[0]["timestamp"], json!(1_710_120_600_000_i64));
        assert_eq!(records[0]["close"], json!(10.2));

        let bad = "eob,timestamp\n2024-03-11 09:31:00,later\n";
        let err = decode_csv(bad.as_bytes(), TimestampMode::EpochMillis, "eob", MARKET_TZ)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Timestamp { row: 0, ref column, .. } if column == "timestamp"
        ));
    }

    #[test]
    fn custom_key_for_pe_files() {
        let csv = "trade_date,pe_ttm\n2024-03-11,5.1\n";
        let records = decode_csv(
            csv.as_bytes(),
            TimestampMode::LocalText,
            "trade_date",
            MARKET_TZ,
        )
        .unwrap();
        assert_eq!(records[0]["trade_date"], json!("2024-03-11"));
    }

    #[test]
    fn empty_payload_fails() {
        assert!(matches!(
            decode_csv(b"", TimestampMode::Raw, "timestamp", MARKET_TZ),
            Err(DecodeError::EmptyCsv)
        ));
    }

    #[test]
    fn ragged_row_fails() {
        let csv = "a,b\n1,2\n3\n";
        assert!(matches!(
            decode_csv(csv.as_bytes(), TimestampMode::Raw, "timestamp", MARKET_TZ),
            Err(DecodeError::Csv(_))
        ));
    }

    #[test]
    fn bad_timestamp_reports_row() {
        let csv = "timestamp,close\n2024-03-11 09:31:00,1\nnot-a-time,2\n";
        let err = decode_csv(
            csv.as_bytes(),
            TimestampMode::EpochMillis,
            "timestamp",
            MARKET_TZ,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Timestamp { row: 1, .. }));
    }
}
