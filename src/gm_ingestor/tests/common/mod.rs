#![allow(dead_code)]

use std::time::Duration;

use gm_ingestor::{
    fetch::{HttpFetcher, RetryPolicy},
    providers::{gm_api::GmApiProvider, gm_archive::GmArchiveProvider},
    tz::MARKET_TZ,
};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Retries quickly so failure-path tests stay fast.
pub fn fetcher(max_retries: u32) -> HttpFetcher {
    HttpFetcher::new(
        Duration::from_secs(5),
        RetryPolicy::new(max_retries, Duration::from_millis(5)),
    )
    .expect("build fetcher")
}

pub fn api(server: &MockServer) -> GmApiProvider {
    GmApiProvider::new(&server.uri(), fetcher(2), MARKET_TZ)
}

pub fn archive(server: &MockServer) -> GmArchiveProvider {
    GmArchiveProvider::new(&server.uri(), fetcher(0), MARKET_TZ)
}

/// A `/get_his` style body.
pub fn columnar(columns: &[&str], rows: Vec<Vec<Value>>) -> Value {
    json!({ "columns": columns, "data": rows })
}

pub fn minute_row(symbol: &str, eob: &str, close: f64, volume: i64) -> Vec<Value> {
    vec![
        json!(symbol),
        json!(eob),
        json!(close),
        json!(close + 0.1),
        json!(close - 0.1),
        json!(close),
        json!(volume),
    ]
}

pub const HIS_COLUMNS: [&str; 7] = ["symbol", "eob", "open", "high", "low", "close", "volume"];

pub fn minute_csv(rows: &[(&str, f64, i64)]) -> String {
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for (ts, close, volume) in rows {
        csv.push_str(&format!(
            "{ts},{close},{},{},{close},{volume}\n",
            close + 0.1,
            close - 0.1
        ));
    }
    csv
}
