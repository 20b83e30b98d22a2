//! Client for the precheck verification-code service.

mod client;
mod error;
mod types;

pub use client::{PrecheckClient, DEFAULT_TIMEOUT, SECRET_HEADER};
pub use error::PrecheckError;
pub use types::*;
