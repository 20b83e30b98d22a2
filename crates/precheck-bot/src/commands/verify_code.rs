//! Verification code command - asks the precheck service for a code.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::replies::Locale;
use async_trait::async_trait;
use onebot_client::BotMessage;
use precheck_client::{
    IssueOutcome, PrecheckClient, PrecheckError, VerificationRequest, PRIVATE_GROUP_ID,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct VerifyCodeHandler {
    client: Arc<PrecheckClient>,
    trigger: String,
    locale: Locale,
}

impl VerifyCodeHandler {
    pub fn new(client: Arc<PrecheckClient>, trigger: impl Into<String>, locale: Locale) -> Self {
        Self {
            client,
            trigger: trigger.into(),
            locale,
        }
    }

    /// Build the request body from the sender's identity.
    pub fn build_request(message: &BotMessage) -> VerificationRequest {
        let account_id = message.user_id.to_string();
        let group_id = group_id_of(message);

        VerificationRequest::new(
            &account_id,
            Some(group_id.as_str()),
            message.display_name.as_deref(),
        )
    }

    /// Turn the service result into the reply text.
    fn render(&self, result: Result<IssueOutcome, PrecheckError>) -> String {
        match result {
            Ok(IssueOutcome::Issued(issued)) => {
                self.locale.issued(&issued.code, issued.expiry_minutes)
            }
            Ok(IssueOutcome::RateLimited { retry_after_secs }) => {
                self.locale.rate_limited(retry_after_secs)
            }
            Ok(IssueOutcome::NotConfigured) => self.locale.service_not_configured().into(),
            Ok(IssueOutcome::Rejected { .. }) => self.locale.generation_failed().into(),
            Err(PrecheckError::MissingSecret) => self.locale.misconfigured().into(),
            Err(e) if e.is_transport() => {
                error!("precheck request failed: {}", e);
                self.locale.unavailable().into()
            }
            Err(e) => {
                error!("unexpected error while handling: {}", e);
                self.locale.unexpected().into()
            }
        }
    }
}

/// Group id for the request: the message's group, or the private sentinel.
pub fn group_id_of(message: &BotMessage) -> String {
    message
        .group_id
        .filter(|id| *id != 0)
        .map(|id| id.to_string())
        .unwrap_or_else(|| PRIVATE_GROUP_ID.to_string())
}

#[async_trait]
impl CommandHandler for VerifyCodeHandler {
    fn name(&self) -> &str {
        "verify-code"
    }

    fn trigger(&self) -> &str {
        &self.trigger
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        if !self.client.is_configured() {
            warn!("Code requested by {} but no shared secret is set", message.user_id);
            return Ok(self.locale.misconfigured().into());
        }

        let request = Self::build_request(message);
        info!(
            "Requesting code for {} in {}",
            request.qq_number, request.group_id
        );

        let result = self.client.issue_code(&request).await;
        Ok(self.render(result))
    }
}
