//! Client for the gm-csv archive service.
//!
//! The archive serves one CSV file per symbol and year (daily bars, `vv`
//! volume statistics, `pe` valuations) and one per symbol and month (1-minute
//! bars). Files are `.csv.xz`; a [`Decompressor`] unpacks them before decoding.
//!
//! Entrypoints:
//! - Single files: [`GmArchiveProvider::year_file`], [`GmArchiveProvider::month_file`]
//! - Ranges: [`GmArchiveProvider::minute_range`], [`GmArchiveProvider::tag_range`]
//! - File layout: [`paths`]

pub mod client;
pub mod decompress;
pub mod paths;

use std::{fmt, str::FromStr};

use crate::providers::{ProviderError, ValidationSnafu};

pub use client::GmArchiveProvider;
pub use decompress::{Decompressor, Passthrough};
pub use paths::ArchiveFile;

/// Kind of yearly archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveTag {
    /// 1-minute bars (`1m`).
    Minute,
    /// Daily volume statistics (`vv`).
    Volume,
    /// Daily valuation ratios (`pe`).
    Valuation,
}

impl ArchiveTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveTag::Minute => "1m",
            ArchiveTag::Volume => "vv",
            ArchiveTag::Valuation => "pe",
        }
    }

    /// Column holding each row's time.
    pub fn timestamp_key(&self) -> &'static str {
        match self {
            ArchiveTag::Valuation => "trade_date",
            _ => "timestamp",
        }
    }

    /// `vv` and `pe` live in their own folder trees.
    pub(crate) fn has_own_tree(&self) -> bool {
        !matches!(self, ArchiveTag::Minute)
    }
}

impl fmt::Display for ArchiveTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveTag {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(ArchiveTag::Minute),
            "vv" => Ok(ArchiveTag::Volume),
            "pe" => Ok(ArchiveTag::Valuation),
            other => ValidationSnafu {
                message: format!("unknown archive tag {other:?}, expected 1m, vv or pe"),
            }
            .fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_and_render() {
        for tag in [ArchiveTag::Minute, ArchiveTag::Volume, ArchiveTag::Valuation] {
            assert_eq!(tag.to_string().parse::<ArchiveTag>().unwrap(), tag);
        }
        assert!("5m".parse::<ArchiveTag>().is_err());
    }

    #[test]
    fn only_valuation_files_use_trade_date() {
        assert_eq!(ArchiveTag::Minute.timestamp_key(), "timestamp");
        assert_eq!(ArchiveTag::Volume.timestamp_key(), "timestamp");
        assert_eq!(ArchiveTag::Valuation.timestamp_key(), "trade_date");
    }
}
