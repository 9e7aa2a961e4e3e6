use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_utils::env::get_env_var;
use snafu::{OptionExt, ResultExt};

use crate::{
    config::{ENV_API_URL, GmConfig},
    decode::{
        ColumnarPayload, DecodeError, Record, TimestampMode, bars_from_records, group_by_symbol,
        normalize_timestamps,
    },
    fetch::HttpFetcher,
    models::{
        bar_series::BarSeries,
        request_params::{BarsRequestParams, ProviderParams},
    },
    providers::{
        ClientBuildSnafu, ConfigSnafu, DataProvider, DecodeSnafu, FetchSnafu, MissingEnvVarSnafu,
        ProviderError, ProviderInitError, ValidationSnafu,
        gm_api::{
            params::{
                date_param, history_n_params, history_params, join_symbols, validate_timeframe,
                GmBarsParams,
            },
            response::{CalendarResponse, TradeDate},
        },
    },
    tz,
};

const CALENDAR: &str = "get_dates_by_year";
const PREV_N: &str = "get_dates_prev_n";
const NEXT_N: &str = "get_dates_next_n";
const CURRENT: &str = "get_current";
const HISTORY: &str = "get_his";
const HISTORY_N: &str = "get_his_n";

/// gm-api client. Cheap to clone; the underlying HTTP client is shared.
#[derive(Debug, Clone)]
pub struct GmApiProvider {
    fetcher: HttpFetcher,
    base_url: String,
    tz: Tz,
}

impl GmApiProvider {
    /// `base_url` must already carry a scheme, see
    /// [`normalize_base_url`](crate::fetch::normalize_base_url).
    pub fn new(base_url: &str, fetcher: HttpFetcher, tz: Tz) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            tz,
        }
    }

    /// Builds the client from `[api]`, `[http]` and `[market]`.
    pub fn from_config(cfg: &GmConfig) -> Result<Self, ProviderInitError> {
        let fetcher = cfg.http.build_fetcher().context(ClientBuildSnafu)?;
        let tz = cfg.market.tz().map_err(|e| {
            ConfigSnafu {
                message: format!("{e:#}"),
            }
            .build()
        })?;
        Ok(Self::new(&cfg.api_base_url(), fetcher, tz))
    }

    /// Creates a client with default settings for the service named by `GM_API_URL`.
    pub fn from_env() -> Result<Self, ProviderInitError> {
        let mut cfg = GmConfig::default();
        cfg.api.base_url = get_env_var(ENV_API_URL).context(MissingEnvVarSnafu)?;
        Self::from_config(&cfg)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/{path}", self.base_url);
        self.fetcher
            .get_with_retry(&url, params)
            .await
            .context(FetchSnafu)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let body = self.get(path, params).await?;
        serde_json::from_slice(&body)
            .map_err(DecodeError::from)
            .context(DecodeSnafu { endpoint: path })
    }

    async fn get_columnar(
        &self,
        path: &str,
        params: &[(&str, String)],
        mode: TimestampMode,
    ) -> Result<Vec<Record>, ProviderError> {
        let body = self.get(path, params).await?;
        ColumnarPayload::from_slice(&body)
            .and_then(ColumnarPayload::into_records)
            .and_then(|records| normalize_timestamps(records, mode, self.tz))
            .context(DecodeSnafu { endpoint: path })
    }

    /// Trading calendar for `start_year..=end_year`, optionally for one exchange.
    pub async fn trade_calendar(
        &self,
        start_year: i32,
        end_year: i32,
        exchange: Option<&str>,
    ) -> Result<Vec<TradeDate>, ProviderError> {
        if start_year > end_year {
            return ValidationSnafu {
                message: format!("start year {start_year} is after end year {end_year}"),
            }
            .fail();
        }
        let mut params = vec![
            ("syear", start_year.to_string()),
            ("eyear", end_year.to_string()),
        ];
        if let Some(exchange) = exchange.filter(|e| !e.is_empty()) {
            params.push(("exchange", exchange.to_string()));
        }
        let calendar: CalendarResponse = self.get_json(CALENDAR, &params).await?;
        Ok(calendar.into_sorted())
    }

    /// The `count` trading days before `date`; `include` lets `date` itself count.
    pub async fn trading_dates_before(
        &self,
        date: NaiveDate,
        count: u32,
        include: bool,
    ) -> Result<Vec<Value>, ProviderError> {
        let anchor = (if include { date.succ_opt() } else { Some(date) }).context(
            ValidationSnafu {
                message: format!("no day after {date}"),
            },
        )?;
        let params = [("date", date_param(anchor)), ("count", count.to_string())];
        self.get_json(PREV_N, &params).await
    }

    /// The `count` trading days after `date`; `include` lets `date` itself count.
    pub async fn trading_dates_after(
        &self,
        date: NaiveDate,
        count: u32,
        include: bool,
    ) -> Result<Vec<Value>, ProviderError> {
        let anchor = (if include { date.pred_opt() } else { Some(date) }).context(
            ValidationSnafu {
                message: format!("no day before {date}"),
            },
        )?;
        let params = [("date", date_param(anchor)), ("count", count.to_string())];
        self.get_json(NEXT_N, &params).await
    }

    /// Live snapshot rows for `symbols`.
    pub async fn current<S: AsRef<str>>(
        &self,
        symbols: &[S],
        split: bool,
    ) -> Result<Vec<Value>, ProviderError> {
        let params = [("symbols", join_symbols(symbols)?), ("split", split.to_string())];
        self.get_json(CURRENT, &params).await
    }

    /// K-bars with tag `tag` (`1m`, `1d`, ...) for local dates `start..=end`.
    pub async fn history<S: AsRef<str>>(
        &self,
        symbols: &[S],
        tag: &str,
        start: NaiveDate,
        end: NaiveDate,
        mode: TimestampMode,
    ) -> Result<Vec<Record>, ProviderError> {
        if start > end {
            return ValidationSnafu {
                message: format!("start date {start} is after end date {end}"),
            }
            .fail();
        }
        let params = history_params(join_symbols(symbols)?, tag, start, end);
        self.get_columnar(HISTORY, &params, mode).await
    }

    /// The last `count` K-bars of `symbol` up to `end` (server default count when `None`).
    pub async fn history_n(
        &self,
        symbol: &str,
        tag: &str,
        end: NaiveDate,
        count: Option<u32>,
        mode: TimestampMode,
    ) -> Result<Vec<Record>, ProviderError> {
        let params = history_n_params(symbol, tag, end, count);
        self.get_columnar(HISTORY_N, &params, mode).await
    }
}

#[async_trait]
impl DataProvider for GmApiProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        validate_timeframe(&params.timeframe)?;

        let tag = params.timeframe.gm_tag();
        let start = tz::local_date(params.start, self.tz);
        let end = tz::local_date(params.end, self.tz);

        let (endpoint, records) = match &params.provider_specific {
            ProviderParams::GmApi(GmBarsParams { count: Some(count) }) => {
                let mut records = Vec::new();
                for symbol in &params.symbols {
                    let rows = self
                        .history_n(symbol, &tag, end, Some(*count), TimestampMode::EpochMillis)
                        .await?;
                    // get_his_n is single-symbol and may omit the column
                    records.extend(rows.into_iter().map(|mut row| {
                        row.entry("symbol".to_string())
                            .or_insert_with(|| Value::from(symbol.as_str()));
                        row
                    }));
                }
                (HISTORY_N, records)
            }
            _ => {
                let records = self
                    .history(params.symbols.as_slice(), &tag, start, end, TimestampMode::EpochMillis)
                    .await?;
                (HISTORY, records)
            }
        };

        let grouped = group_by_symbol(records).context(DecodeSnafu { endpoint })?;
        grouped
            .into_iter()
            .map(|(symbol, rows)| -> Result<BarSeries, ProviderError> {
                let bars = bars_from_records(&rows, self.tz).context(DecodeSnafu { endpoint })?;
                Ok(BarSeries::new(symbol, params.timeframe, bars))
            })
            .collect()
    }
}
