//! OneBot client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OneBotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Action failed with retcode {retcode}: {message}")]
    ActionFailed { retcode: i64, message: String },

    #[error("Failed to bind event listener: {0}")]
    Bind(#[from] std::io::Error),
}
