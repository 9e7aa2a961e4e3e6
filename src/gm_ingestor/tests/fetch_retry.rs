mod common;

use std::time::Duration;

use gm_ingestor::fetch::{FetchError, HttpFetcher, RetryPolicy};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

#[tokio::test]
async fn get_sends_query_and_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(query_param("symbols", "SHSE.600000"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    let body = common::fetcher(0)
        .get(
            &format!("{}/ping", server.uri()),
            &[("symbols", "SHSE.600000".to_string())],
        )
        .await
        .unwrap();
    assert_eq!(body, b"pong");
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let body = common::fetcher(3)
        .get_with_retry(&format!("{}/flaky", server.uri()), &[])
        .await
        .unwrap();
    assert_eq!(body, b"ok");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn exhausted_retries_keep_last_status() {
    let server = MockServer::start().await;
    Mock::given(path("/down"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let err = common::fetcher(2)
        .get_with_retry(&format!("{}/down", server.uri()), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn client_errors_are_retried_too() {
    let server = MockServer::start().await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such file"))
        .expect(4)
        .mount(&server)
        .await;

    let err = common::fetcher(3)
        .get_with_retry(&format!("{}/missing", server.uri()), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Exhausted { attempts: 4, .. }));
    assert_eq!(err.status(), Some(404));
    match err {
        FetchError::Exhausted { source, .. } => match *source {
            FetchError::Status { body, .. } => assert_eq!(body, "no such file"),
            other => panic!("unexpected error: {other}"),
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn slow_responses_hit_the_timeout() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_millis(50), RetryPolicy::NONE).unwrap();
    let err = fetcher
        .get(&format!("{}/slow", server.uri()), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}
