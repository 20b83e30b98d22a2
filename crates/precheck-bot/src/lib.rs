//! QQ bot that hands out website verification codes.

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod replies;
