//! OneBot v11 event receiver and HTTP action client.

mod client;
mod error;
mod receiver;
mod types;

pub use client::OneBotClient;
pub use error::OneBotError;
pub use receiver::{sign_event, EventReceiver, SIGNATURE_HEADER};
pub use types::*;
