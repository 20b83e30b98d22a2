//! Verification service wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Group id sent when the command did not come from a group.
pub const PRIVATE_GROUP_ID: &str = "private";

/// Expiry assumed when the service omits `expiryMinutes`.
pub const DEFAULT_EXPIRY_MINUTES: u64 = 3;

/// Retry hint assumed when a 429 carries no usable `retryAfter`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Body of a code request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub qq_number: String,
    pub group_id: String,
    pub nickname: String,
}

impl VerificationRequest {
    /// Build a request, substituting the sentinel for a missing group and the
    /// account id for a missing nickname.
    pub fn new(account_id: &str, group_id: Option<&str>, nickname: Option<&str>) -> Self {
        let group_id = group_id
            .filter(|g| !g.is_empty())
            .unwrap_or(PRIVATE_GROUP_ID);
        let nickname = nickname.filter(|n| !n.is_empty()).unwrap_or(account_id);

        Self {
            qq_number: account_id.to_string(),
            group_id: group_id.to_string(),
            nickname: nickname.to_string(),
        }
    }
}

/// Successful response body. Fields are optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub expiry_minutes: Option<u64>,
}

impl VerificationResponse {
    /// The code as text. Numeric codes are accepted as-is.
    pub fn code(&self) -> Option<String> {
        match self.code.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn expiry_minutes(&self) -> u64 {
        self.expiry_minutes.unwrap_or(DEFAULT_EXPIRY_MINUTES)
    }
}

/// 429 response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResponse {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

impl RateLimitResponse {
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS)
    }
}

/// A code issued by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub code: String,
    pub expiry_minutes: u64,
}

/// Classified result of a single code request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// HTTP 200 with a code.
    Issued(VerificationCode),
    /// HTTP 429.
    RateLimited { retry_after_secs: u64 },
    /// HTTP 503, the service has no secret configured on its side.
    NotConfigured,
    /// Any other status.
    Rejected { status: u16 },
}
