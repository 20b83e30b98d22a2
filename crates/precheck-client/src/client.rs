//! Verification service HTTP client.

use crate::error::PrecheckError;
use crate::types::*;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "X-Bot-Secret";

/// Upper bound on a whole request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the verification-code endpoint.
///
/// The shared secret is stored using `SecretString` so it never shows up in
/// logs or debug output.
#[derive(Clone)]
pub struct PrecheckClient {
    client: Client,
    endpoint: String,
    secret: SecretString,
}

impl PrecheckClient {
    /// Create a new client. An empty secret is accepted; every request then
    /// fails with [`PrecheckError::MissingSecret`] before touching the network.
    pub fn new(
        endpoint: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PrecheckError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            secret: SecretString::new(secret.into()),
        })
    }

    /// Get the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether a shared secret is present.
    pub fn is_configured(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }

    /// Ask the service for a verification code.
    #[instrument(skip(self, request), fields(qq = %request.qq_number, group = %request.group_id))]
    pub async fn issue_code(
        &self,
        request: &VerificationRequest,
    ) -> Result<IssueOutcome, PrecheckError> {
        if !self.is_configured() {
            return Err(PrecheckError::MissingSecret);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(SECRET_HEADER, self.secret.expose_secret())
            .json(request)
            .send()
            .await?;

        self.classify(response).await
    }

    /// Map the response status and body to an outcome.
    async fn classify(&self, response: Response) -> Result<IssueOutcome, PrecheckError> {
        let status = response.status();

        match status {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let parsed: VerificationResponse = serde_json::from_slice(&body)?;
                let code = parsed.code().ok_or(PrecheckError::MissingCode)?;
                debug!("Code issued, expires in {} minutes", parsed.expiry_minutes());

                Ok(IssueOutcome::Issued(VerificationCode {
                    code,
                    expiry_minutes: parsed.expiry_minutes(),
                }))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                // The hint is best effort; an unreadable body still means "rate limited".
                let hint = match response.bytes().await {
                    Ok(body) => serde_json::from_slice::<RateLimitResponse>(&body).unwrap_or_default(),
                    Err(_) => RateLimitResponse::default(),
                };
                warn!("Rate limited, retry after {}s", hint.retry_after_secs());

                Ok(IssueOutcome::RateLimited {
                    retry_after_secs: hint.retry_after_secs(),
                })
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                warn!("Verification service reports it is not configured");
                Ok(IssueOutcome::NotConfigured)
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                warn!(
                    "Verification service returned {}: {}",
                    status.as_u16(),
                    message.chars().take(200).collect::<String>()
                );
                Ok(IssueOutcome::Rejected {
                    status: status.as_u16(),
                })
            }
        }
    }
}
