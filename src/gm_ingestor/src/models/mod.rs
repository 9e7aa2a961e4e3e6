pub mod bar;
pub mod bar_series;
pub mod request_params;
pub mod tick;
pub mod timeframe;

use indexmap::IndexMap;
use serde_json::Value;

/// One decoded row: column name to JSON scalar, in source column order.
pub type Record = IndexMap<String, Value>;
