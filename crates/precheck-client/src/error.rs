//! Verification service client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrecheckError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Shared secret is not configured")]
    MissingSecret,

    #[error("Response did not contain a verification code")]
    MissingCode,
}

impl PrecheckError {
    /// Whether the failure happened on the wire (connect, DNS, timeout, body read)
    /// rather than in interpreting what the service sent back.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode(),
            _ => false,
        }
    }
}
