use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use shared_utils::env::get_env_var;
use snafu::ResultExt;

use crate::{
    config::{ENV_CSV_URL, GmConfig},
    decode::{Record, TimestampMode, decode_csv, filter_by_date},
    fetch::HttpFetcher,
    providers::{
        ClientBuildSnafu, ConfigSnafu, DecodeSnafu, DecompressSnafu, FetchSnafu,
        MissingEnvVarSnafu, NoDataSnafu, ProviderError, ProviderInitError, ValidationSnafu,
    },
};

use super::{
    ArchiveTag,
    decompress::{Decompressor, Passthrough},
    paths::{month_path, plan_minute_files, year_path},
};

/// gm-csv archive client.
#[derive(Debug, Clone)]
pub struct GmArchiveProvider {
    fetcher: HttpFetcher,
    base_url: String,
    tz: Tz,
    decompressor: Arc<dyn Decompressor>,
}

impl GmArchiveProvider {
    /// `base_url` must already carry a scheme. Files are unpacked with [`Passthrough`]
    /// until [`with_decompressor`](Self::with_decompressor) says otherwise.
    pub fn new(base_url: &str, fetcher: HttpFetcher, tz: Tz) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            tz,
            decompressor: Arc::new(Passthrough),
        }
    }

    pub fn with_decompressor(mut self, decompressor: impl Decompressor + 'static) -> Self {
        self.decompressor = Arc::new(decompressor);
        self
    }

    /// Builds the client from `[archive]`, `[http]` and `[market]`.
    pub fn from_config(cfg: &GmConfig) -> Result<Self, ProviderInitError> {
        let fetcher = cfg.http.build_fetcher().context(ClientBuildSnafu)?;
        let tz = cfg.market.tz().map_err(|e| {
            ConfigSnafu {
                message: format!("{e:#}"),
            }
            .build()
        })?;
        Ok(Self::new(&cfg.archive_base_url(), fetcher, tz))
    }

    /// Creates a client with default settings for the service named by `GM_CSV_URL`.
    pub fn from_env() -> Result<Self, ProviderInitError> {
        let mut cfg = GmConfig::default();
        cfg.archive.base_url = get_env_var(ENV_CSV_URL).context(MissingEnvVarSnafu)?;
        Self::from_config(&cfg)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Full download URL of an archive-relative path.
    pub fn file_url(&self, path: &str) -> String {
        format!("{}/download/{path}", self.base_url)
    }

    async fn fetch_csv(
        &self,
        path: &str,
        mode: TimestampMode,
        ts_key: &str,
    ) -> Result<Vec<Record>, ProviderError> {
        let url = self.file_url(path);
        let raw = self.fetcher.get(&url, &[]).await.context(FetchSnafu)?;
        let csv = self
            .decompressor
            .decompress(raw)
            .context(DecompressSnafu { path })?;
        decode_csv(&csv, mode, ts_key, self.tz).context(DecodeSnafu { endpoint: path })
    }

    /// One year of `tag` rows for `symbol`.
    pub async fn year_file(
        &self,
        symbol: &str,
        tag: ArchiveTag,
        year: i32,
        mode: TimestampMode,
    ) -> Result<Vec<Record>, ProviderError> {
        let path = year_path(symbol, tag, year)?;
        self.fetch_csv(&path, mode, tag.timestamp_key()).await
    }

    /// One month of 1-minute bars for `symbol`.
    pub async fn month_file(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
        mode: TimestampMode,
    ) -> Result<Vec<Record>, ProviderError> {
        let path = month_path(symbol, year, month)?;
        self.fetch_csv(&path, mode, ArchiveTag::Minute.timestamp_key())
            .await
    }

    /// 1-minute bars of `symbol` for local dates `start..=end`.
    ///
    /// Missing bounds default to `today`. Files that fail to download or decode
    /// are skipped with a warning; the call fails only when nothing was read.
    /// With `clip`, rows outside the date range are dropped.
    pub async fn minute_range(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        mode: TimestampMode,
        clip: bool,
        today: NaiveDate,
    ) -> Result<Vec<Record>, ProviderError> {
        let start = start.unwrap_or(today);
        let end = end.unwrap_or(today);
        check_range(start, end)?;

        let mut records = Vec::new();
        for file in plan_minute_files(start, end, today) {
            let path = file.path(symbol)?;
            match self
                .fetch_csv(&path, mode, ArchiveTag::Minute.timestamp_key())
                .await
            {
                Ok(rows) => records.extend(rows),
                Err(error) => tracing::warn!(symbol, path, %error, "skipping archive file"),
            }
        }
        if records.is_empty() {
            return NoDataSnafu {
                message: format!("no archived 1m bars for {symbol} in {start}..={end}"),
            }
            .fail();
        }

        if clip {
            records = filter_by_date(
                records,
                ArchiveTag::Minute.timestamp_key(),
                start,
                end,
                self.tz,
            );
        }
        Ok(records)
    }

    /// Yearly `tag` files of `symbol` covering `start..=end`.
    ///
    /// Same skip-and-warn policy as [`minute_range`](Self::minute_range); clipping
    /// away every row is an error too.
    pub async fn tag_range(
        &self,
        tag: ArchiveTag,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        mode: TimestampMode,
        clip: bool,
    ) -> Result<Vec<Record>, ProviderError> {
        check_range(start, end)?;

        let mut records = Vec::new();
        for year in start.year()..=end.year() {
            match self.year_file(symbol, tag, year, mode).await {
                Ok(rows) => records.extend(rows),
                Err(error) => {
                    tracing::warn!(symbol, %tag, year, %error, "skipping archive file")
                }
            }
        }
        if records.is_empty() {
            return NoDataSnafu {
                message: format!("no archived {tag} rows for {symbol} in {start}..={end}"),
            }
            .fail();
        }

        if clip {
            records = filter_by_date(records, tag.timestamp_key(), start, end, self.tz);
            if records.is_empty() {
                return NoDataSnafu {
                    message: format!("archived {tag} rows for {symbol} miss {start}..={end}"),
                }
                .fail();
            }
        }
        Ok(records)
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ProviderError> {
    if start > end {
        return ValidationSnafu {
            message: format!("start date {start} is after end date {end}"),
        }
        .fail();
    }
    Ok(())
}
