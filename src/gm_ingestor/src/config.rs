//! Client configuration: endpoints, HTTP behavior, market zone.
//!
//! Loaded from TOML; every section and key is optional and falls back to the
//! defaults below. Unknown keys are rejected so typos surface at startup.
//!
//! ```toml
//! [api]
//! base_url = "localhost:5000"
//!
//! [archive]
//! base_url = "localhost:5002"
//!
//! [http]
//! timeout_secs = 10
//! max_retries = 3
//! retry_base_delay_ms = 1000
//! prefer_https = false
//!
//! [market]
//! timezone = "Asia/Shanghai"
//! cost_basis_cutoff = "10:00:00"
//! ```
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]
//! - Apply `GM_API_URL` / `GM_CSV_URL` on top: [`GmConfig::with_env_overrides`]

use std::time::Duration;

use anyhow::{Context, bail};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared_utils::env::env_override;

use crate::fetch::{FetchError, HttpFetcher, RetryPolicy, normalize_base_url};

/// Env var overriding `[api].base_url`.
pub const ENV_API_URL: &str = "GM_API_URL";
/// Env var overriding `[archive].base_url`.
pub const ENV_CSV_URL: &str = "GM_CSV_URL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct GmConfig {
    /// gm-api (JSON endpoints).
    pub api: EndpointCfg,
    /// gm-csv (archive downloads).
    pub archive: EndpointCfg,
    pub http: HttpCfg,
    pub market: MarketCfg,
}

/// One upstream service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct EndpointCfg {
    /// With or without scheme; see [`normalize_base_url`].
    pub base_url: String,
}

impl Default for EndpointCfg {
    fn default() -> Self {
        Self {
            base_url: "localhost:5000".into(),
        }
    }
}

/// Request timeout and retry knobs.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct HttpCfg {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub prefer_https: bool,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            prefer_https: false,
        }
    }
}

impl HttpCfg {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn build_fetcher(&self) -> Result<HttpFetcher, FetchError> {
        HttpFetcher::new(self.timeout(), self.retry_policy())
    }
}

/// Exchange calendar settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct MarketCfg {
    /// IANA zone name used for every naive wall time and calendar date.
    pub timezone: String,
    /// `HH:MM:SS` split between the early and late cost-basis windows.
    pub cost_basis_cutoff: String,
}

impl Default for MarketCfg {
    fn default() -> Self {
        Self {
            timezone: "Asia/Shanghai".into(),
            cost_basis_cutoff: "10:00:00".into(),
        }
    }
}

impl MarketCfg {
    pub fn tz(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("bad market timezone: {}", self.timezone))
    }

    pub fn cutoff(&self) -> anyhow::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.cost_basis_cutoff, "%H:%M:%S")
            .with_context(|| format!("bad cost_basis_cutoff: {}", self.cost_basis_cutoff))
    }
}

impl GmConfig {
    /// Replace base URLs with `GM_API_URL` / `GM_CSV_URL` when those are set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = env_override(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(url) = env_override(ENV_CSV_URL) {
            self.archive.base_url = url;
        }
        self
    }

    /// gm-api base with a scheme and no trailing slash.
    pub fn api_base_url(&self) -> String {
        normalize_base_url(&self.api.base_url, self.http.prefer_https)
    }

    /// gm-csv base with a scheme and no trailing slash.
    pub fn archive_base_url(&self) -> String {
        normalize_base_url(&self.archive.base_url, self.http.prefer_https)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            bail!("api.base_url must not be empty");
        }
        if self.archive.base_url.trim().is_empty() {
            bail!("archive.base_url must not be empty");
        }
        if self.http.timeout_secs == 0 {
            bail!("http.timeout_secs must be > 0");
        }
        self.market.tz()?;
        self.market.cutoff()?;
        Ok(())
    }
}

/// Parse + validate a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<GmConfig> {
    let cfg: GmConfig = toml::from_str(toml_str).context("parse gm config TOML")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Read a TOML file and hand it to [`load_config_str`].
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<GmConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read gm config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}
