//! Payload decoding: raw bytes from gm into row [`Record`]s and typed [`Bar`]s.
//!
//! gm serves two payload shapes:
//! - column-oriented JSON, `{"columns": [...], "data": [[...], ...]}`, from the
//!   history endpoints ([`ColumnarPayload`]);
//! - CSV with a header row from the archive downloads ([`decode_csv`]).
//!
//! CSV cells are typed best-effort by [`parse_scalar`] (int, then float, then
//! bool, then string). Time columns can be normalized to epoch milliseconds or
//! to market-local text with [`TimestampMode`].
//!
//! Error policy: decoding is all-or-nothing. A ragged row or an unparseable
//! timestamp rejects the whole payload. Only [`filter_by_date`] is lenient, it
//! skips rows it cannot place and logs a warning.
//!
//! [`Bar`]: crate::models::bar::Bar

mod columnar;
mod csv_rows;
mod reshape;
mod scalar;

use thiserror::Error;

use crate::{models::bar::BarError, tz::TimestampError};

pub use crate::models::Record;
pub use columnar::ColumnarPayload;
pub use csv_rows::decode_csv;
pub use reshape::{
    bars_from_records, filter_by_date, group_by_symbol, index_by_symbol_timestamp,
    normalize_timestamps, select_columns, TIMESTAMP_ALIASES,
};
pub use scalar::parse_scalar;

/// How time columns are rendered after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampMode {
    /// Leave values exactly as received.
    #[default]
    Raw,
    /// Replace with integer milliseconds since the Unix epoch.
    EpochMillis,
    /// Replace with market-local text: `YYYY-MM-DD` for date-only sources,
    /// `YYYY-MM-DD HH:MM:SS` otherwise.
    LocalText,
}

/// Errors raised while decoding a payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload has {rows} data rows but no columns")]
    MissingColumns { rows: usize },

    #[error("row {row} has {found} values, expected {expected}")]
    RowLength {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("empty CSV payload")]
    EmptyCsv,

    #[error("CSV parse failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// `row` is the zero-based data row; a CSV header is not counted.
    #[error("row {row}, column {column:?}: {source}")]
    Timestamp {
        row: usize,
        column: String,
        #[source]
        source: TimestampError,
    },

    #[error("row {row}: missing column {column:?}")]
    MissingColumn { row: usize, column: String },

    #[error("row {row}, column {column:?}: expected a number, found {found}")]
    NotNumeric {
        row: usize,
        column: String,
        found: String,
    },

    #[error("row {row}: {source}")]
    InvalidBar {
        row: usize,
        #[source]
        source: BarError,
    },
}
