use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One trading-calendar entry as served by `/get_dates_by_year`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TradeDate {
    pub trade_date: String,
    #[serde(rename = "pre_trade_date", default)]
    pub prev_trade_date: String,
    #[serde(default)]
    pub next_trade_date: String,
}

/// The calendar arrives either as a list or keyed by date.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum CalendarResponse {
    List(Vec<TradeDate>),
    Keyed(IndexMap<String, TradeDate>),
}

impl CalendarResponse {
    /// Entries ordered by trade date.
    pub(crate) fn into_sorted(self) -> Vec<TradeDate> {
        let mut dates = match self {
            CalendarResponse::List(list) => list,
            CalendarResponse::Keyed(map) => map.into_values().collect(),
        };
        dates.sort_by(|a, b| a.trade_date.cmp(&b.trade_date));
        dates
    }
}
