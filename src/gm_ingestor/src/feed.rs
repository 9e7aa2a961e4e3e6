//! Continuous 1-minute history from the archive plus the live API.
//!
//! The archive holds finished months; the API covers whatever the archive has
//! not published yet. [`MinuteFeed`] reads the archive first and asks the API
//! only for the days after the last archived row.

use chrono::NaiveDate;
use snafu::ResultExt;

use crate::{
    decode::{Record, TimestampMode, bars_from_records, select_columns},
    models::bar::Bar,
    providers::{
        DecodeSnafu, ProviderError, ValidationSnafu, gm_api::GmApiProvider,
        gm_archive::GmArchiveProvider,
    },
    tz,
};

/// Columns kept from API rows.
pub const BAR_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

#[derive(Debug, Clone)]
pub struct MinuteFeed {
    archive: GmArchiveProvider,
    api: GmApiProvider,
}

impl MinuteFeed {
    pub fn new(archive: GmArchiveProvider, api: GmApiProvider) -> Self {
        Self { archive, api }
    }

    /// 1-minute rows of `symbol` for local dates `start..=end`
    /// (`start..end` when `include_end` is false).
    ///
    /// Archive failures are logged and the API fills the whole range; API
    /// failures are returned.
    pub async fn minute_records(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        mode: TimestampMode,
        include_end: bool,
        today: NaiveDate,
    ) -> Result<Vec<Record>, ProviderError> {
        let end = if include_end {
            Some(end)
        } else {
            end.pred_opt()
        };
        let end = match end {
            Some(end) if start <= end => end,
            _ => {
                return ValidationSnafu {
                    message: format!("empty minute range starting {start}"),
                }
                .fail();
            }
        };

        let tz = self.archive.timezone();
        let mut records = Vec::new();
        let mut api_start = start;
        match self
            .archive
            .minute_range(symbol, Some(start), Some(end), mode, true, today)
            .await
        {
            Ok(rows) => {
                let last_day = rows
                    .last()
                    .and_then(|row| row.get("timestamp"))
                    .and_then(|ts| tz::parse_timestamp(ts, tz).ok())
                    .map(|ts| tz::local_date(ts, tz));
                if let Some(next) = last_day.and_then(|day| day.succ_opt()) {
                    api_start = api_start.max(next);
                }
                records = rows;
            }
            Err(error) => tracing::warn!(symbol, %error, "archive unavailable, using API only"),
        }

        let archived = records.len();
        if api_start <= end {
            let rows = self.api.history(&[symbol], "1m", api_start, end, mode).await?;
            records.extend(select_columns(rows, &BAR_COLUMNS));
        }
        tracing::info!(
            symbol,
            %start,
            %end,
            archived,
            live = records.len() - archived,
            "assembled minute feed"
        );
        Ok(records)
    }

    /// [`minute_records`](Self::minute_records) as validated bars.
    pub async fn minute_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        include_end: bool,
        today: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError> {
        let records = self
            .minute_records(symbol, start, end, TimestampMode::EpochMillis, include_end, today)
            .await?;
        bars_from_records(&records, self.archive.timezone())
            .context(DecodeSnafu { endpoint: "minute feed" })
    }
}
