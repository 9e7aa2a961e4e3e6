mod common;

use chrono::NaiveDate;
use gm_ingestor::{decode::TimestampMode, feed::MinuteFeed, providers::ProviderError};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{path, query_param},
};

const MARCH: &str =
    "/download/kbars-month/month-2024/month-2024-03--SH-60/kbars-1m--SHSE.600000--2024-03-.csv.xz";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn live_rows(eobs: &[&str]) -> serde_json::Value {
    let mut columns = common::HIS_COLUMNS.to_vec();
    columns.push("amount");
    let rows = eobs
        .iter()
        .map(|eob| {
            let mut row = common::minute_row("SHSE.600000", eob, 10.3, 700);
            row.push(json!(7210.0));
            row
        })
        .collect();
    common::columnar(&columns, rows)
}

#[tokio::test]
async fn api_fills_in_after_the_last_archived_day() {
    let archive_server = MockServer::start().await;
    let api_server = MockServer::start().await;
    Mock::given(path(MARCH))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::minute_csv(&[
            ("2024-03-11 09:31:00", 10.0, 1200),
            ("2024-03-12 09:31:00", 10.1, 900),
        ])))
        .mount(&archive_server)
        .await;
    Mock::given(path("/get_his"))
        .and(query_param("sdate", "2024-03-13"))
        .and(query_param("edate", "2024-03-13"))
        .and(query_param("tag", "1m"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(live_rows(&["2024-03-13 09:31:00"])),
        )
        .expect(1)
        .mount(&api_server)
        .await;

    let feed = MinuteFeed::new(common::archive(&archive_server), common::api(&api_server));
    let rows = feed
        .minute_records(
            "SHSE.600000",
            d(2024, 3, 11),
            d(2024, 3, 14),
            TimestampMode::LocalText,
            false,
            d(2024, 3, 14),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["timestamp"], json!("2024-03-13 09:31:00"));
    let live_columns: Vec<&str> = rows[2].keys().map(String::as_str).collect();
    assert_eq!(live_columns, ["timestamp", "open", "high", "low", "close", "volume"]);
}

#[tokio::test]
async fn archive_outage_falls_back_to_api_for_the_whole_range() {
    let archive_server = MockServer::start().await;
    let api_server = MockServer::start().await;
    Mock::given(path("/get_his"))
        .and(query_param("sdate", "2024-03-11"))
        .and(query_param("edate", "2024-03-12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_rows(&[
            "2024-03-11 09:31:00",
            "2024-03-12 09:31:00",
        ])))
        .expect(1)
        .mount(&api_server)
        .await;

    let feed = MinuteFeed::new(common::archive(&archive_server), common::api(&api_server));
    let bars = feed
        .minute_bars("SHSE.600000", d(2024, 3, 11), d(2024, 3, 12), true, d(2024, 3, 12))
        .await
        .unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[1].volume, 700);
}

#[tokio::test]
async fn fully_archived_range_skips_the_api() {
    let archive_server = MockServer::start().await;
    let api_server = MockServer::start().await;
    Mock::given(path(MARCH))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::minute_csv(&[(
            "2024-03-12 15:00:00",
            10.0,
            4000,
        )])))
        .mount(&archive_server)
        .await;

    let feed = MinuteFeed::new(common::archive(&archive_server), common::api(&api_server));
    let rows = feed
        .minute_records(
            "SHSE.600000",
            d(2024, 3, 12),
            d(2024, 3, 12),
            TimestampMode::Raw,
            true,
            d(2024, 3, 20),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(api_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_failure_is_returned() {
    let archive_server = MockServer::start().await;
    let api_server = MockServer::start().await;
    Mock::given(path("/get_his"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&api_server)
        .await;

    let feed = MinuteFeed::new(common::archive(&archive_server), common::api(&api_server));
    let err = feed
        .minute_records(
            "SHSE.600000",
            d(2024, 3, 11),
            d(2024, 3, 12),
            TimestampMode::Raw,
            true,
            d(2024, 3, 12),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Fetch { .. }), "{err}");
}

#[tokio::test]
async fn exclusive_single_day_is_empty_range() {
    let server = MockServer::start().await;
    let feed = MinuteFeed::new(common::archive(&server), common::api(&server));
    let err = feed
        .minute_records(
            "SHSE.600000",
            d(2024, 3, 11),
            d(2024, 3, 11),
            TimestampMode::Raw,
            false,
            d(2024, 3, 12),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation { .. }));
}
