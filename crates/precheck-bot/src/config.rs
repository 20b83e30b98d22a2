//! Application configuration loaded from environment variables.
//!
//! Every key is prefixed with `PRECHECK_`; nested sections use `__`, so
//! `PRECHECK_ONEBOT__API_URL` sets `onebot.api_url`.

use crate::replies::Locale;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Verification code endpoint (`PRECHECK_API_URL`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Shared secret sent as `X-Bot-Secret` (`PRECHECK_BOT_SECRET`)
    #[serde(default)]
    pub bot_secret: String,

    /// Bound on each verification request
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,

    /// OneBot connection configuration
    #[serde(default)]
    pub onebot: OneBotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Command that requests a code
    #[serde(default = "default_trigger")]
    pub trigger: String,

    /// Reply language
    #[serde(default)]
    pub locale: Locale,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneBotConfig {
    /// OneBot HTTP API endpoint
    #[serde(default = "default_onebot_api_url")]
    pub api_url: String,

    /// OneBot access token, sent as a bearer token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Shared secret OneBot signs reported events with (`X-Signature`)
    #[serde(default)]
    pub secret: Option<String>,

    /// Address the event listener binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path events are POSTed to
    #[serde(default = "default_event_path")]
    pub event_path: String,
}

// Default implementations
impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            locale: Locale::default(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for OneBotConfig {
    fn default() -> Self {
        Self {
            api_url: default_onebot_api_url(),
            access_token: None,
            secret: None,
            listen_addr: default_listen_addr(),
            event_path: default_event_path(),
        }
    }
}

impl OneBotConfig {
    /// Whether reported events must carry a valid signature.
    pub fn verifies_signatures(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Parsed listener address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.listen_addr))
    }
}

// Default value functions
fn default_api_url() -> String {
    "http://localhost:3000/api/qq-bot/generate-code".into()
}

fn default_timeout() -> Duration {
    precheck_client::DEFAULT_TIMEOUT
}

fn default_trigger() -> String {
    "/验证码".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_onebot_api_url() -> String {
    "http://127.0.0.1:5700".into()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_event_path() -> String {
    "/".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_source(None)
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment.
    pub fn from_source(source: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("PRECHECK")
                    .prefix_separator("_")
                    .separator("__")
                    // QQ numbers and secrets stay strings.
                    .try_parsing(false)
                    .source(source),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Whether a shared secret is configured.
    pub fn has_secret(&self) -> bool {
        !self.bot_secret.is_empty()
    }
}
