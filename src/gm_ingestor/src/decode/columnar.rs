use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DecodeError, Record};

/// Column-oriented table as returned by `get_his` / `get_his_n`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnarPayload {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl ColumnarPayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Zip every row with the column names.
    ///
    /// Errors when rows exist without columns, or when any row length differs
    /// from the column count.
    pub fn into_records(self) -> Result<Vec<Record>, DecodeError> {
        if self.columns.is_empty() && !self.data.is_empty() {
            return Err(DecodeError::MissingColumns {
                rows: self.data.len(),
            });
        }
        let expected = self.columns.len();
        if let Some((row, found)) = self
            .data
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(DecodeError::RowLength {
                row,
                found,
                expected,
            });
        }

        let columns = self.columns;
        Ok(self
            .data
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zips_rows_in_column_order() {
        let payload = ColumnarPayload::from_slice(
            br#"{"columns":["symbol","eob","close"],
                 "data":[["SHSE.600000","2024-03-11T09:31:00+08:00",10.2],
                         ["SHSE.600000","2024-03-11T09:32:00+08:00",10.3]]}"#,
        )
        .unwrap();
        let records = payload.into_records().unwrap();
        assert_eq!(records.len(), 2);
        let keys: Vec<_> = records[0].keys().cloned().collect();
        assert_eq!(keys, ["symbol", "eob", "close"]);
        assert_eq!(records[1]["close"], json!(10.3));
    }

    #[test]
    fn empty_payload_is_empty() {
        let records = ColumnarPayload::default().into_records().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn rows_without_columns_fail() {
        let payload = ColumnarPayload {
            columns: vec![],
            data: vec![vec![json!(1)]],
        };
        assert!(matches!(
            payload.into_records(),
            Err(DecodeError::MissingColumns { rows: 1 })
        ));
    }

    #[test]
    fn ragged_row_rejects_everything() {
        let payload = ColumnarPayload {
            columns: vec!["a".into(), "b".into()],
            data: vec![vec![json!(1), json!(2)], vec![json!(3)]],
        };
        assert!(matches!(
            payload.into_records(),
            Err(DecodeError::RowLength {
                row: 1,
                found: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(
            ColumnarPayload::from_slice(b"{not json"),
            Err(DecodeError::Json(_))
        ));
    }
}
