//! Bot command handlers.

mod verify_code;

pub use verify_code::{group_id_of, VerifyCodeHandler};

use crate::error::AppResult;
use async_trait::async_trait;
use onebot_client::BotMessage;
use std::sync::Arc;
use tracing::error;

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name (e.g., "verify-code").
    fn name(&self) -> &str;

    /// Command trigger (e.g., "/验证码").
    fn trigger(&self) -> &str;

    /// Check if this handler matches the message. The trimmed text must equal
    /// the trigger; commands take no arguments.
    fn matches(&self, message: &BotMessage) -> bool {
        message.text.trim() == self.trigger()
    }

    /// Execute the command.
    async fn execute(&self, message: &BotMessage) -> AppResult<String>;
}

/// Run the first matching handler and produce its reply.
///
/// Returns `None` when no handler matches. Otherwise exactly one reply comes
/// back: handler errors and panics are logged and replaced with `fallback`.
pub async fn dispatch(
    handlers: &[Arc<dyn CommandHandler>],
    message: &BotMessage,
    fallback: &str,
) -> Option<String> {
    let handler = handlers.iter().find(|h| h.matches(message))?.clone();
    let name = handler.name().to_string();
    let message = message.clone();

    let outcome = tokio::spawn(async move { handler.execute(&message).await }).await;

    let reply = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            error!("Handler {} failed: {}", name, e);
            fallback.to_string()
        }
        Err(e) => {
            error!("Handler {} aborted: {}", name, e);
            fallback.to_string()
        }
    };

    Some(reply)
}
