use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    models::timeframe::{TimeFrame, TimeFrameUnit},
    providers::{ProviderError, ValidationSnafu},
};

/// gm-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct GmBarsParams {
    /// Fetch the last `count` bars up to the end date through `/get_his_n`
    /// instead of the whole `[start, end]` range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Date format of every `date`, `sdate` and `edate` query parameter.
pub(crate) const DATE_PARAM: &str = "%Y-%m-%d";

pub(crate) fn date_param(date: NaiveDate) -> String {
    date.format(DATE_PARAM).to_string()
}

pub(crate) fn join_symbols<S: AsRef<str>>(symbols: &[S]) -> Result<String, ProviderError> {
    let joined = symbols
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() {
        return ValidationSnafu {
            message: "at least one symbol is required",
        }
        .fail();
    }
    Ok(joined)
}

/// gm serves minute bars of any width and daily bars; multi-day bars are not offered.
pub fn validate_timeframe(timeframe: &TimeFrame) -> Result<(), ProviderError> {
    if timeframe.amount == 0 {
        return ValidationSnafu {
            message: "timeframe amount must be positive",
        }
        .fail();
    }
    if timeframe.unit == TimeFrameUnit::Day && timeframe.amount != 1 {
        return ValidationSnafu {
            message: format!("gm only serves 1d daily bars, got {timeframe}"),
        }
        .fail();
    }
    Ok(())
}

pub(crate) fn history_params(
    symbols: String,
    tag: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(&'static str, String)> {
    vec![
        ("symbols", symbols),
        ("tag", tag.to_string()),
        ("sdate", date_param(start)),
        ("edate", date_param(end)),
    ]
}

pub(crate) fn history_n_params(
    symbol: &str,
    tag: &str,
    end: NaiveDate,
    count: Option<u32>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", symbol.to_string()),
        ("tag", tag.to_string()),
        ("edate", date_param(end)),
    ];
    if let Some(count) = count {
        params.push(("count", count.to_string()));
    }
    params
}
