//! End-to-end integration tests for the verification code command.

mod common;

use async_trait::async_trait;
use common::*;
use onebot_client::{BotMessage, OneBotClient};
use precheck_bot::commands::{dispatch, CommandHandler};
use precheck_bot::error::AppResult;
use precheck_bot::replies::Locale;
use precheck_client::PrecheckClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

const FALLBACK: &str = "An error occurred, try again later";

fn handlers(handler: impl CommandHandler + 'static) -> Vec<Arc<dyn CommandHandler>> {
    vec![Arc::new(handler)]
}

#[tokio::test]
async fn test_group_code_e2e() {
    // 1. Setup mock servers
    let precheck_server = mock_precheck_server().await;
    let onebot_server = wiremock::MockServer::start().await;

    // 2. Mock the verification service
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("X-Bot-Secret", "test-secret"))
        .and(body_json(serde_json::json!({
            "qqNumber": "10001",
            "groupId": "20002",
            "nickname": "Alice"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "123456",
            "expiryMinutes": 5
        })))
        .expect(1)
        .mount(&precheck_server)
        .await;

    // 3. Mock the OneBot send (the reply)
    let expected_reply = "Your verification code is: 123456\nValid for 5 minutes\nEnter it on the website to complete verification";
    Mock::given(method("POST"))
        .and(path("/send_msg"))
        .and(body_json(serde_json::json!({
            "message_type": "group",
            "group_id": 20002,
            "message": expected_reply,
            "auto_escape": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "retcode": 0,
            "data": { "message_id": 7 }
        })))
        .expect(1)
        .mount(&onebot_server)
        .await;

    // 4. Dispatch the incoming message
    let handlers = handlers(test_handler(test_precheck_client(&precheck_server, "test-secret")));
    let incoming = group_message(10001, 20002, "Alice");

    let response = dispatch(&handlers, &incoming, FALLBACK).await.unwrap();
    assert_eq!(response, expected_reply);

    // 5. Send reply via OneBot (as main.rs does)
    let onebot = OneBotClient::new(onebot_server.uri(), None).unwrap();
    onebot.reply(&incoming, &response).await.unwrap();
}

#[tokio::test]
async fn test_private_message_uses_sentinel_and_account_nickname() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_json(serde_json::json!({
            "qqNumber": "10001",
            "groupId": "private",
            "nickname": "10001"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "777888",
            "expiryMinutes": 3
        })))
        .expect(1)
        .mount(&precheck_server)
        .await;

    let handler = test_handler(test_precheck_client(&precheck_server, "test-secret"));
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert!(response.contains("777888"));
}

#[tokio::test]
async fn test_missing_secret_makes_no_request() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&precheck_server)
        .await;

    let handler = test_handler(test_precheck_client(&precheck_server, ""));
    let response = handler.execute(&group_message(10001, 20002, "Alice")).await.unwrap();

    assert_eq!(response, "The bot is misconfigured, contact an administrator");
}

#[tokio::test]
async fn test_rate_limited_reply() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "retryAfter": 30
        })))
        .mount(&precheck_server)
        .await;

    let handler = test_handler(test_precheck_client(&precheck_server, "test-secret"));
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert_eq!(response, "Too many requests, retry in 30 seconds");
}

#[tokio::test]
async fn test_rate_limited_default_hint() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&precheck_server)
        .await;

    let handler = test_handler(test_precheck_client(&precheck_server, "test-secret"));
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert!(response.contains("60"));
}

#[tokio::test]
async fn test_service_not_configured_reply() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&precheck_server)
        .await;

    let handler = test_handler(test_precheck_client(&precheck_server, "test-secret"));
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert_eq!(response, "Service not configured, contact an administrator");
}

#[tokio::test]
async fn test_other_status_reply() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&precheck_server)
        .await;

    let handler = test_handler(test_precheck_client(&precheck_server, "test-secret"));
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert_eq!(response, "Failed to generate code, try again later");
}

#[tokio::test]
async fn test_timeout_reply() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "code": "123456" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&precheck_server)
        .await;

    let client = PrecheckClient::new(
        format!("{}{}", precheck_server.uri(), ENDPOINT),
        "test-secret",
        Duration::from_millis(200),
    )
    .unwrap();
    let handler = test_handler(client);
    let (logs, _guard) = capture_logs();
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert_eq!(response, "Service temporarily unavailable, try again later");
    assert!(logs.contains("precheck request failed"));
    assert!(!logs.contains("unexpected error while handling"));
}

#[tokio::test]
async fn test_connection_failure_reply() {
    // Bind then release a port so nothing is listening on it.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}{}", listener.local_addr().unwrap(), ENDPOINT)
    };

    let client = PrecheckClient::new(uri, "test-secret", Duration::from_secs(1)).unwrap();
    let handler = test_handler(client);
    let (logs, _guard) = capture_logs();
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert_eq!(response, "Service temporarily unavailable, try again later");
    assert!(logs.contains("precheck request failed"));
    assert!(!logs.contains("unexpected error while handling"));
}

#[tokio::test]
async fn test_malformed_success_reply() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&precheck_server)
        .await;

    let handler = test_handler(test_precheck_client(&precheck_server, "test-secret"));
    let (logs, _guard) = capture_logs();
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert_eq!(response, FALLBACK);
    assert!(logs.contains("unexpected error while handling"));
    assert!(!logs.contains("precheck request failed"));
}

#[tokio::test]
async fn test_chinese_locale_reply() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "123456",
            "expiryMinutes": 5
        })))
        .mount(&precheck_server)
        .await;

    let handler = precheck_bot::commands::VerifyCodeHandler::new(
        Arc::new(test_precheck_client(&precheck_server, "test-secret")),
        TRIGGER,
        Locale::Zh,
    );
    let response = handler.execute(&private_message(10001)).await.unwrap();

    assert_eq!(
        response,
        "你的验证码是: 123456\n有效期 5 分钟\n请在网站输入验证码完成验证"
    );
}

#[tokio::test]
async fn test_dispatch_ignores_other_messages() {
    let precheck_server = mock_precheck_server().await;
    let handlers = handlers(test_handler(test_precheck_client(&precheck_server, "test-secret")));

    let mut incoming = group_message(10001, 20002, "Alice");
    incoming.text = "hello everyone".into();

    assert!(dispatch(&handlers, &incoming, FALLBACK).await.is_none());
}

struct FailingHandler;

#[async_trait]
impl CommandHandler for FailingHandler {
    fn name(&self) -> &str {
        "failing"
    }

    fn trigger(&self) -> &str {
        TRIGGER
    }

    async fn execute(&self, _message: &BotMessage) -> AppResult<String> {
        Err(anyhow::anyhow!("boom").into())
    }
}

struct PanickingHandler;

#[async_trait]
impl CommandHandler for PanickingHandler {
    fn name(&self) -> &str {
        "panicking"
    }

    fn trigger(&self) -> &str {
        TRIGGER
    }

    async fn execute(&self, _message: &BotMessage) -> AppResult<String> {
        panic!("handler blew up");
    }
}

#[tokio::test]
async fn test_dispatch_handler_error_yields_fallback() {
    let response = dispatch(&handlers(FailingHandler), &private_message(10001), FALLBACK).await;
    assert_eq!(response.as_deref(), Some(FALLBACK));
}

#[tokio::test]
async fn test_dispatch_handler_panic_yields_fallback() {
    let response = dispatch(&handlers(PanickingHandler), &private_message(10001), FALLBACK).await;
    assert_eq!(response.as_deref(), Some(FALLBACK));
}

#[tokio::test]
async fn test_concurrent_invocations() {
    let precheck_server = mock_precheck_server().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "code": "123456", "expiryMinutes": 3 }))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(4)
        .mount(&precheck_server)
        .await;

    let handlers = Arc::new(handlers(test_handler(test_precheck_client(
        &precheck_server,
        "test-secret",
    ))));

    let started = Instant::now();
    let mut tasks = JoinSet::new();
    for user_id in 10001..10005 {
        let handlers = handlers.clone();
        tasks.spawn(async move {
            dispatch(&handlers, &private_message(user_id), FALLBACK).await
        });
    }

    let mut replies = 0;
    while let Some(result) = tasks.join_next().await {
        let response = result.unwrap().unwrap();
        assert!(response.contains("123456"));
        replies += 1;
    }

    assert_eq!(replies, 4);
    assert!(started.elapsed() < Duration::from_millis(1400));
}
