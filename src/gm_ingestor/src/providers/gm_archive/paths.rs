//! Archive file layout, relative to `<base>/download/`.
//!
//! ```text
//! kbars-year/year-2023/year-2023--SH-60/kbars-1m--SHSE.600000--2023-.csv.xz
//! kbars-vv/vv-2023/vv-2023--SH-60/kbars-vv--SHSE.600000--2023-.csv.xz
//! kbars-month/month-2024/month-2024-03--SH-60/kbars-1m--SHSE.600000--2024-03-.csv.xz
//! ```

use chrono::{Datelike, NaiveDate};

use super::ArchiveTag;
use crate::providers::{ProviderError, ValidationSnafu};

/// Shard key: exchange prefix plus the first two digits of the code,
/// `SHSE.600000` -> `SH-60`.
pub fn symbol_key(symbol: &str) -> Result<String, ProviderError> {
    match (symbol.get(0..2), symbol.get(5..7)) {
        (Some(exchange), Some(code)) => Ok(format!("{exchange}-{code}")),
        _ => ValidationSnafu {
            message: format!("symbol {symbol:?} is too short for an archive path"),
        }
        .fail(),
    }
}

pub fn year_path(symbol: &str, tag: ArchiveTag, year: i32) -> Result<String, ProviderError> {
    let key = symbol_key(symbol)?;
    let folder = if tag.has_own_tree() {
        format!("kbars-{tag}/{tag}-{year}/{tag}-{year}--{key}")
    } else {
        format!("kbars-year/year-{year}/year-{year}--{key}")
    };
    Ok(format!("{folder}/kbars-{tag}--{symbol}--{year}-.csv.xz"))
}

pub fn month_path(symbol: &str, year: i32, month: u32) -> Result<String, ProviderError> {
    let key = symbol_key(symbol)?;
    Ok(format!(
        "kbars-month/month-{year}/month-{year}-{month:02}--{key}/kbars-1m--{symbol}--{year}-{month:02}-.csv.xz"
    ))
}

/// One file of a minute-bar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFile {
    Year { year: i32 },
    Month { year: i32, month: u32 },
}

impl ArchiveFile {
    pub fn path(&self, symbol: &str) -> Result<String, ProviderError> {
        match *self {
            ArchiveFile::Year { year } => year_path(symbol, ArchiveTag::Minute, year),
            ArchiveFile::Month { year, month } => month_path(symbol, year, month),
        }
    }
}

/// Files covering `start..=end` of 1-minute bars.
///
/// The first and last year are read month by month (never past `today`'s month
/// in the current year); the years between come from whole-year files.
pub fn plan_minute_files(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Vec<ArchiveFile> {
    let (first, last) = (start.year(), end.year());
    let mut files = Vec::new();
    for year in first..=last {
        if year != first && year != last {
            files.push(ArchiveFile::Year { year });
            continue;
        }
        let from = if year == first { start.month() } else { 1 };
        let mut to = if year == last { end.month() } else { 12 };
        if year == today.year() {
            to = to.min(today.month());
        }
        files.extend((from..=to).map(|month| ArchiveFile::Month { year, month }));
    }
    files
}
