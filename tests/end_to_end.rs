mod support;

use chrono::{Local, NaiveDateTime, SubsecRound};
use price_updater_bot::config::{PriceSourceConfig, TargetConfig, TelegramConfig};
use price_updater_bot::format::{Templates, TIMESTAMP_FORMAT};
use price_updater_bot::pipeline::{Pipeline, RunOutcome};
use price_updater_bot::price::{FetchError, HttpPriceSource, PriceSource};
use price_updater_bot::publish::{PublishOutcome, Publisher};
use price_updater_bot::telegram::{BotApiClient, ChatId, TelegramError};
use std::sync::Arc;
use support::{MockServer, RecordedRequest};

const TOKEN: &str = "123456:test-token";
const EDIT_OK: &str =
    r#"{"ok":true,"result":{"message_id":7,"date":0,"chat":{"id":-100,"type":"channel"}}}"#;
const DESCRIBE_OK: &str = r#"{"ok":true,"result":true}"#;

fn price_source(server: &MockServer, field_path: &str) -> HttpPriceSource {
    let config = PriceSourceConfig::builder()
        .url(server.url("/v1/price").parse().unwrap())
        .params("symbol=BTC&convert=USD")
        .api_key("test-key")
        .field_path(field_path.parse().unwrap())
        .build()
        .unwrap();
    HttpPriceSource::new(&config).unwrap()
}

fn pipeline(price: &MockServer, telegram: &MockServer) -> Pipeline {
    let config = TelegramConfig::builder()
        .bot_token(TOKEN)
        .api_url(telegram.url(""))
        .build()
        .unwrap();
    let target = TargetConfig {
        chat: ChatId::Id(-100),
        message_id: 7,
    };

    Pipeline::new(
        Arc::new(price_source(price, "price")),
        Templates::parse("BTC ${} | {}", "BTC ${}").unwrap(),
        Publisher::new(Arc::new(BotApiClient::new(&config)), &target),
    )
}

fn telegram_ok(request: &RecordedRequest) -> (u16, String) {
    if request.target.ends_with("/editMessageText") {
        (200, EDIT_OK.to_string())
    } else {
        (200, DESCRIBE_OK.to_string())
    }
}

fn find<'a>(requests: &'a [RecordedRequest], method: &str) -> &'a RecordedRequest {
    requests
        .iter()
        .find(|r| r.target == format!("/bot{TOKEN}/{method}"))
        .unwrap_or_else(|| panic!("no {method} call in {requests:?}"))
}

#[tokio::test]
async fn fetch_sends_key_and_query_and_rounds_price() {
    let server = MockServer::sequence(vec![(200, r#"{"price": "43000.123456"}"#)]).await;
    let source = price_source(&server, "price");

    let before = Local::now().trunc_subsecs(0);
    let quote = source.fetch().await.unwrap();
    let after = Local::now();

    assert_eq!(quote.price.to_string(), "43000.12346");
    assert!(quote.captured_at >= before && quote.captured_at <= after);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/v1/price?symbol=BTC&convert=USD");
    assert_eq!(requests[0].header("X-CMC_PRO_API_KEY"), Some("test-key"));
    assert_eq!(requests[0].header("accept"), Some("application/json"));
}

#[tokio::test]
async fn fetch_reads_nested_coinmarketcap_shape() {
    let body = r#"{"status":{"error_code":0},"data":[{"symbol":"BTC","quote":{"USD":{"price":67012.3456789}}}]}"#;
    let server = MockServer::sequence(vec![(200, body)]).await;

    let quote = price_source(&server, "data.0.quote.USD.price")
        .fetch()
        .await
        .unwrap();
    assert_eq!(quote.price.to_string(), "67012.34568");
}

#[tokio::test]
async fn fetch_requires_status_200() {
    let server = MockServer::sequence(vec![
        (500, r#"{"price": 1}"#),
        (201, r#"{"price": 1}"#),
        (429, r#"{"status":{"error_message":"rate limited"}}"#),
    ])
    .await;
    let source = price_source(&server, "price");

    for expected in [500u16, 201, 429] {
        match source.fetch().await {
            Err(FetchError::Status(status)) => assert_eq!(status.as_u16(), expected),
            other => panic!("expected status error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn fetch_reports_unusable_bodies() {
    let server = MockServer::sequence(vec![
        (200, "not json"),
        (200, r#"{"data": {}}"#),
        (200, r#"{"price": "soon"}"#),
    ])
    .await;
    let source = price_source(&server, "price");

    assert!(matches!(source.fetch().await, Err(FetchError::Body(_))));
    assert!(matches!(source.fetch().await, Err(FetchError::MissingField(_))));
    assert!(matches!(source.fetch().await, Err(FetchError::NotNumeric { .. })));
}

#[tokio::test]
async fn fetch_reports_unreachable_endpoint() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = PriceSourceConfig::builder()
        .url(format!("http://{addr}/price").parse().unwrap())
        .build()
        .unwrap();

    let result = HttpPriceSource::new(&config).unwrap().fetch().await;
    assert!(matches!(result, Err(FetchError::Request(_))));
}

#[tokio::test]
async fn published_message_carries_rounded_price_and_timestamp() {
    let price = MockServer::sequence(vec![(200, r#"{"price": "43000.123456"}"#)]).await;
    let telegram = MockServer::start(telegram_ok).await;

    let outcome = pipeline(&price, &telegram).run_once().await;
    let report = match outcome {
        RunOutcome::Published { report, .. } => report,
        other => panic!("expected a published run, got {other:?}"),
    };
    assert!(report.is_complete());

    let requests = telegram.requests();
    assert_eq!(requests.len(), 2);

    let edit = find(&requests, "editMessageText").json();
    assert_eq!(edit["chat_id"], -100);
    assert_eq!(edit["message_id"], 7);
    let text = edit["text"].as_str().unwrap();
    let (head, stamp) = text.split_once(" | ").unwrap();
    assert_eq!(head, "BTC $43000.12346");
    assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok(), "{stamp}");
    assert_eq!(stamp.len(), "YYYY-MM-DD HH:MM:SS".len());

    let describe = find(&requests, "setChatDescription").json();
    assert_eq!(describe["chat_id"], -100);
    assert_eq!(describe["description"], "BTC $43000.12346");
}

#[tokio::test]
async fn failed_fetch_skips_publishing_until_next_run() {
    let price = MockServer::sequence(vec![
        (500, r#"{"error": "internal"}"#),
        (200, r#"{"price": 42}"#),
    ])
    .await;
    let telegram = MockServer::start(telegram_ok).await;
    let pipeline = pipeline(&price, &telegram);

    let first = pipeline.run_once().await;
    assert!(matches!(first, RunOutcome::FetchFailed(FetchError::Status(s)) if s.as_u16() == 500));
    assert!(telegram.requests().is_empty());

    let second = pipeline.run_once().await;
    assert!(matches!(second, RunOutcome::Published { .. }));
    let requests = telegram.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(find(&requests, "setChatDescription").json()["description"], "BTC $42.0");
}

#[tokio::test]
async fn failed_edit_still_updates_description() {
    let price = MockServer::sequence(vec![(200, r#"{"price": 1.5}"#)]).await;
    let telegram = MockServer::start(|request: &RecordedRequest| {
        if request.target.ends_with("/editMessageText") {
            (
                400,
                r#"{"ok":false,"error_code":400,"description":"Bad Request: message to edit not found"}"#
                    .to_string(),
            )
        } else {
            (200, DESCRIBE_OK.to_string())
        }
    })
    .await;

    let outcome = pipeline(&price, &telegram).run_once().await;
    let report = match outcome {
        RunOutcome::Published { report, .. } => report,
        other => panic!("expected a published run, got {other:?}"),
    };

    assert!(matches!(
        report.edit,
        PublishOutcome::Failed(TelegramError::Api { code: 400, .. })
    ));
    assert!(matches!(report.bio, PublishOutcome::Updated));
    assert_eq!(telegram.requests().len(), 2);
}
