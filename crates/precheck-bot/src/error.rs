//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Verification service error: {0}")]
    Precheck(#[from] precheck_client::PrecheckError),

    #[error("OneBot error: {0}")]
    OneBot(#[from] onebot_client::OneBotError),

    #[error("Event stream closed")]
    StreamClosed,
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
