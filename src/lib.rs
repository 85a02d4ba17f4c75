//! FinTwit Timeline Bot
//!
//! Watches a Twitter/X home timeline, resolves the tickers each post
//! mentions, labels its sentiment and routes it to Discord channels.

pub mod client;
pub mod config;
pub mod error;
pub mod feedback;
pub mod ingester;
pub mod notify;
pub mod pipeline;
pub mod resolver;
pub mod sentiment;
pub mod storage;
pub mod types;

#[cfg(test)]
mod error_tests;

pub use error::{BotError, Result};
pub use pipeline::Pipeline;
