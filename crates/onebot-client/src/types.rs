//! OneBot v11 types.

use serde::{Deserialize, Serialize};

/// Event reported by the OneBot implementation.
///
/// Only the fields used for message dispatch are modelled; everything else
/// in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Event {
    pub post_type: String,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub raw_message: Option<String>,
    #[serde(default)]
    pub sender: Option<Sender>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub nickname: Option<String>,
    /// Group card (per-group display name), empty when unset.
    #[serde(default)]
    pub card: Option<String>,
}

/// `send_msg` action parameters.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub message_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    pub message: String,
    /// Send the text literally, without CQ-code parsing.
    pub auto_escape: bool,
}

/// Envelope of every action response.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    pub retcode: i64,
    #[serde(default)]
    pub wording: Option<String>,
}

/// Where a reply should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTarget {
    Private(i64),
    Group(i64),
}

impl ReplyTarget {
    pub fn to_request(self, message: &str) -> SendMessageRequest {
        let (message_type, user_id, group_id) = match self {
            Self::Private(user_id) => ("private", Some(user_id), None),
            Self::Group(group_id) => ("group", None, Some(group_id)),
        };

        SendMessageRequest {
            message_type,
            user_id,
            group_id,
            message: message.to_string(),
            auto_escape: true,
        }
    }
}

/// Parsed message for bot processing.
#[derive(Debug, Clone)]
pub struct BotMessage {
    /// The QQ account that sent the message.
    pub user_id: i64,
    /// Group card or nickname, if the sender has one.
    pub display_name: Option<String>,
    /// Group the message was posted in, if any.
    pub group_id: Option<i64>,
    /// The message text with CQ codes left in place.
    pub text: String,
    pub message_id: Option<i64>,
}

impl BotMessage {
    /// Extract a bot message from a reported event. Non-message events and
    /// messages without a sender yield `None`.
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.post_type != "message" {
            return None;
        }
        let text = event.raw_message.clone()?;
        let user_id = event
            .user_id
            .or_else(|| event.sender.as_ref().and_then(|s| s.user_id))?;

        let group_id = match event.message_type.as_deref() {
            Some("group") => event.group_id.filter(|id| *id != 0),
            _ => None,
        };

        let display_name = event.sender.as_ref().and_then(|s| {
            non_empty(s.card.as_deref()).or_else(|| non_empty(s.nickname.as_deref()))
        });

        Some(Self {
            user_id,
            display_name,
            group_id,
            text,
            message_id: event.message_id,
        })
    }

    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// Get the reply target (group or direct).
    pub fn reply_target(&self) -> ReplyTarget {
        match self.group_id {
            Some(group_id) => ReplyTarget::Group(group_id),
            None => ReplyTarget::Private(self.user_id),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}
