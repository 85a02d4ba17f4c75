//! Error types for the timeline bot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Malformed post: {reason}")]
    MalformedPost { reason: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery failed for channel {channel}: {reason}")]
    Delivery { channel: String, reason: String },

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        BotError::MalformedPost {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
