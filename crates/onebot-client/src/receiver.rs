//! Event receiver for OneBot HTTP POST reporting.

use crate::error::OneBotError;
use crate::types::*;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, error, info, warn};

const CHANNEL_CAPACITY: usize = 256;

/// Header carrying `sha1=<hex HMAC-SHA1(secret, body)>`.
pub const SIGNATURE_HEADER: &str = "X-Signature";

type HmacSha1 = Hmac<Sha1>;

#[derive(Clone)]
struct EventState {
    sender: mpsc::Sender<BotMessage>,
    secret: Option<Arc<SecretString>>,
}

/// Message receiver fed by events the OneBot implementation POSTs to us.
pub struct EventReceiver {
    listen_addr: SocketAddr,
    event_path: String,
    secret: Option<String>,
}

impl EventReceiver {
    /// Create a new event receiver. With a secret, every event must carry a
    /// valid `X-Signature`; an empty secret disables the check.
    pub fn new(
        listen_addr: SocketAddr,
        event_path: impl Into<String>,
        secret: Option<String>,
    ) -> Self {
        Self {
            listen_addr,
            event_path: event_path.into(),
            secret,
        }
    }

    /// Build the webhook router, forwarding parsed messages into `sender`.
    pub fn router(
        event_path: &str,
        sender: mpsc::Sender<BotMessage>,
        secret: Option<String>,
    ) -> Router {
        let state = EventState {
            sender,
            secret: secret
                .filter(|s| !s.is_empty())
                .map(|s| Arc::new(SecretString::new(s))),
        };

        Router::new()
            .route(event_path, post(handle_event))
            .with_state(state)
    }

    /// Bind the listener and start receiving messages as an async stream.
    pub async fn stream(self) -> Result<impl Stream<Item = BotMessage>, OneBotError> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let app = Self::router(&self.event_path, tx, self.secret);

        let listener = TcpListener::bind(self.listen_addr).await?;
        info!(
            "Receiving OneBot events on {}{}",
            listener.local_addr()?,
            self.event_path
        );

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Event listener error: {}", e);
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

/// Compute the `X-Signature` value for a body.
pub fn sign_event(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("sha1={}", hex::encode(mac.finalize().into_bytes())))
}

fn verify_signature(secret: &str, headers: &HeaderMap, body: &[u8]) -> bool {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("sha1="))
    else {
        return false;
    };
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha1::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

async fn handle_event(
    State(state): State<EventState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = &state.secret {
        if !verify_signature(secret.expose_secret(), &headers, &body) {
            warn!("Rejected event with missing or invalid signature");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let event: Event = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Malformed event: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    if let Some(message) = BotMessage::from_event(&event) {
        debug!(
            "Received: {} from {} (message {:?})",
            message.text.chars().take(50).collect::<String>(),
            message.user_id,
            message.message_id
        );
        if state.sender.send(message).await.is_err() {
            warn!("Message stream closed, dropping event");
        }
    }

    // No quick operation; replies go through the action API.
    StatusCode::NO_CONTENT
}
