use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{models::timeframe::TimeFrame, providers::gm_api::GmBarsParams};

/// Universal parameters for requesting time-series bar data from a market data provider.
///
/// It is the standard input for all [`DataProvider`](crate::providers::DataProvider)
/// implementations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// gm symbols to request (e.g., `["SHSE.600000", "SZSE.000001"]`).
    pub symbols: Vec<String>,

    /// The time interval for each bar (e.g., 1 minute, 1 day).
    ///
    /// **Validation of allowed values is performed by each data provider
    /// implementation, according to its own API rules.**
    pub timeframe: TimeFrame,

    /// Start of the requested time range (inclusive). Only the market-local
    /// calendar date is sent to gm.
    pub start: DateTime<Utc>,

    /// End of the requested time range (inclusive, market-local calendar date).
    pub end: DateTime<Utc>,

    /// Optional, provider-specific parameters.
    #[serde(default)]
    pub provider_specific: ProviderParams,
}

/// Provider-specific request parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ProviderParams {
    #[default]
    None,
    GmApi(GmBarsParams),
}
