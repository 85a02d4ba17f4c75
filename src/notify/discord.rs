//! Discord REST delivery with retries

use super::{DeliverySink, OutboundMessage};
use crate::config::DiscordConfig;
use crate::error::{BotError, Result};
use crate::types::{ChannelRef, MessageRef};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone)]
pub struct DiscordSink {
    http: Client,
    api_url: Url,
    bot_token: String,
    max_retries: u8,
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Exponential backoff: 500ms, 1s, 2s, ...
fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << (attempt.saturating_sub(1)).min(6))
}

impl DiscordSink {
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(BotError::Config("discord bot_token is required".into()));
        }
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| BotError::Config(format!("invalid discord api_url: {}", e)))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_url,
            bot_token: config.bot_token.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| BotError::Config("discord api_url cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_with_retry<F>(&self, channel: &ChannelRef, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = build()
                .header("Authorization", format!("Bot {}", self.bot_token))
                .send()
                .await;

            let (reason, wait) = match res {
                Ok(rsp) if rsp.status().is_success() => return Ok(rsp),
                Ok(rsp) if rsp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = rsp
                        .json::<RateLimitBody>()
                        .await
                        .ok()
                        .and_then(|b| Duration::try_from_secs_f64(b.retry_after).ok())
                        .unwrap_or_else(|| backoff(attempt));
                    ("rate limited".to_string(), wait)
                }
                Ok(rsp) if rsp.status().is_client_error() => {
                    let status = rsp.status();
                    let body = rsp.text().await.unwrap_or_default();
                    return Err(BotError::Delivery {
                        channel: channel.to_string(),
                        reason: format!("HTTP {}: {}", status, body),
                    });
                }
                Ok(rsp) => (format!("HTTP {}", rsp.status()), backoff(attempt)),
                Err(e) => (e.to_string(), backoff(attempt)),
            };

            if attempt < self.max_retries {
                tracing::debug!("Discord request to {} failed ({}), retrying", channel, reason);
                tokio::time::sleep(wait).await;
                continue;
            }
            return Err(BotError::Delivery {
                channel: channel.to_string(),
                reason,
            });
        }
    }
}

#[async_trait]
impl DeliverySink for DiscordSink {
    async fn deliver(&self, channel: &ChannelRef, message: &OutboundMessage) -> Result<MessageRef> {
        let url = self.endpoint(&["channels", channel.as_str(), "messages"])?;
        let rsp = self
            .send_with_retry(channel, || self.http.post(url.clone()).json(message))
            .await?;

        let created: CreatedMessage = rsp.json().await?;
        Ok(MessageRef(created.id))
    }

    async fn react(&self, channel: &ChannelRef, message: &MessageRef, emoji: &str) -> Result<()> {
        let url = self.endpoint(&[
            "channels",
            channel.as_str(),
            "messages",
            &message.0,
            "reactions",
            emoji,
            "@me",
        ])?;
        self.send_with_retry(channel, || self.http.put(url.clone()).body(""))
            .await?;
        Ok(())
    }

    async fn fetch_message(&self, channel: &ChannelRef, message: &MessageRef) -> Result<OutboundMessage> {
        let url = self.endpoint(&["channels", channel.as_str(), "messages", &message.0])?;
        let rsp = self
            .send_with_retry(channel, || self.http.get(url.clone()))
            .await?;
        Ok(rsp.json().await?)
    }
}
