//! OneBot HTTP action client.

use crate::error::OneBotError;
use crate::types::*;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// OneBot v11 HTTP API client.
#[derive(Clone)]
pub struct OneBotClient {
    client: Client,
    base_url: String,
    access_token: Option<SecretString>,
}

impl OneBotClient {
    /// Create a new OneBot client. An empty token means no authentication.
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, OneBotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token
                .filter(|t| !t.is_empty())
                .map(SecretString::new),
        })
    }

    /// Get the configured API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the OneBot implementation is reachable and online.
    pub async fn health_check(&self) -> bool {
        match self.action("get_status", &serde_json::json!({})).await {
            Ok(response) => response.retcode == 0,
            Err(_) => false,
        }
    }

    /// Send a message to a user or group.
    #[instrument(skip(self, message))]
    pub async fn send(&self, target: ReplyTarget, message: &str) -> Result<(), OneBotError> {
        let request = target.to_request(message);
        let response = self.action("send_msg", &request).await?;

        if response.retcode != 0 {
            let message = response.wording.unwrap_or(response.status);
            warn!("Send failed: {} ({})", message, response.retcode);
            return Err(OneBotError::ActionFailed {
                retcode: response.retcode,
                message,
            });
        }

        debug!("Sent message to {:?}", target);
        Ok(())
    }

    /// Reply to a message (handles both direct and group messages).
    pub async fn reply(&self, original: &BotMessage, message: &str) -> Result<(), OneBotError> {
        self.send(original.reply_target(), message).await
    }

    /// Call an action endpoint and decode the response envelope.
    async fn action<T: serde::Serialize + ?Sized>(
        &self,
        name: &str,
        params: &T,
    ) -> Result<ActionResponse, OneBotError> {
        let response = self
            .authorize(self.client.post(format!("{}/{}", self.base_url, name)))
            .json(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            return Err(OneBotError::Api(format!("{}: {}", status, msg)));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}
