//! User-facing reply templates.
//!
//! Replies never carry diagnostic detail; that goes to the log.

use serde::Deserialize;

/// Language of the replies sent back to chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn issued(self, code: &str, expiry_minutes: u64) -> String {
        match self {
            Self::En => format!(
                "Your verification code is: {}\nValid for {} minutes\nEnter it on the website to complete verification",
                code, expiry_minutes
            ),
            Self::Zh => format!(
                "你的验证码是: {}\n有效期 {} 分钟\n请在网站输入验证码完成验证",
                code, expiry_minutes
            ),
        }
    }

    pub fn rate_limited(self, retry_after_secs: u64) -> String {
        match self {
            Self::En => format!("Too many requests, retry in {} seconds", retry_after_secs),
            Self::Zh => format!("请求太频繁，请 {} 秒后再试", retry_after_secs),
        }
    }

    /// The bot itself has no shared secret.
    pub fn misconfigured(self) -> &'static str {
        match self {
            Self::En => "The bot is misconfigured, contact an administrator",
            Self::Zh => "插件未正确配置，请联系管理员",
        }
    }

    /// The verification service answered 503.
    pub fn service_not_configured(self) -> &'static str {
        match self {
            Self::En => "Service not configured, contact an administrator",
            Self::Zh => "服务未配置，请联系管理员",
        }
    }

    pub fn generation_failed(self) -> &'static str {
        match self {
            Self::En => "Failed to generate code, try again later",
            Self::Zh => "验证码生成失败，请稍后再试",
        }
    }

    pub fn unavailable(self) -> &'static str {
        match self {
            Self::En => "Service temporarily unavailable, try again later",
            Self::Zh => "服务暂时不可用，请稍后再试",
        }
    }

    pub fn unexpected(self) -> &'static str {
        match self {
            Self::En => "An error occurred, try again later",
            Self::Zh => "发生错误，请稍后再试",
        }
    }
}
