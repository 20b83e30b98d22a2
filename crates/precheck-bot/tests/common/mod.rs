//! Common test utilities for integration tests.

#![allow(dead_code)]

use onebot_client::BotMessage;
use precheck_bot::commands::VerifyCodeHandler;
use precheck_bot::replies::Locale;
use precheck_client::PrecheckClient;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::MockServer;

pub const ENDPOINT: &str = "/api/qq-bot/generate-code";
pub const TRIGGER: &str = "/验证码";

/// Start a mock verification service.
pub async fn mock_precheck_server() -> MockServer {
    MockServer::start().await
}

/// Create a verification client pointed at a mock server.
pub fn test_precheck_client(mock_server: &MockServer, secret: &str) -> PrecheckClient {
    PrecheckClient::new(
        format!("{}{}", mock_server.uri(), ENDPOINT),
        secret,
        Duration::from_secs(5),
    )
    .unwrap()
}

/// Create the command handler around a client.
pub fn test_handler(client: PrecheckClient) -> VerifyCodeHandler {
    VerifyCodeHandler::new(Arc::new(client), TRIGGER, Locale::En)
}

/// A trigger message posted in a group.
pub fn group_message(user_id: i64, group_id: i64, display_name: &str) -> BotMessage {
    BotMessage {
        user_id,
        display_name: Some(display_name.to_string()),
        group_id: Some(group_id),
        text: TRIGGER.to_string(),
        message_id: Some(1),
    }
}

/// A trigger message sent directly to the bot by someone without a nickname.
pub fn private_message(user_id: i64) -> BotMessage {
    BotMessage {
        user_id,
        display_name: None,
        group_id: None,
        text: TRIGGER.to_string(),
        message_id: Some(2),
    }
}

/// Log output collected from a test-local subscriber.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's logs into a buffer until the guard is dropped.
pub fn capture_logs() -> (LogCapture, DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
