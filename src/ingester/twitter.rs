//! Twitter/X home timeline source
//!
//! Polls the GraphQL "home latest timeline" endpoint with a logged-in
//! session and hands back the raw `content` object of every entry.

use super::PostSource;
use crate::config::TimelineConfig;
use crate::error::{BotError, Result};
use crate::types::RawPost;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub struct TimelineSource {
    config: TimelineConfig,
    http: reqwest::Client,
}

impl TimelineSource {
    pub fn new(config: TimelineConfig) -> Result<Self> {
        if config.bearer_token.is_empty() || config.auth_token.is_empty() {
            return Err(BotError::Config(
                "timeline bearer_token and auth_token are required".into(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { config, http })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let variables = serde_json::json!({
            "count": self.config.count,
            "includePromotedContent": false,
            "latestControlAvailable": true,
            "requestContext": "launch",
        });
        let features = serde_json::json!({
            "responsive_web_graphql_exclude_directive_enabled": true,
            "verified_phone_label_enabled": false,
            "responsive_web_graphql_timeline_navigation_enabled": true,
            "tweetypie_unmention_optimization_enabled": true,
            "longform_notetweets_consumption_enabled": true,
            "responsive_web_enhance_cards_enabled": false,
        });
        vec![
            ("variables", variables.to_string()),
            ("features", features.to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    data: TimelineData,
}

#[derive(Debug, Deserialize)]
struct TimelineData {
    home: TimelineHome,
}

#[derive(Debug, Deserialize)]
struct TimelineHome {
    home_timeline_urt: TimelineUrt,
}

#[derive(Debug, Deserialize)]
struct TimelineUrt {
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
struct Instruction {
    #[serde(default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    content: RawPost,
}

/// Entry contents of a timeline response, in response order
pub fn entry_contents(body: serde_json::Value) -> Result<Vec<RawPost>> {
    let response: TimelineResponse = serde_json::from_value(body)?;
    Ok(response
        .data
        .home
        .home_timeline_urt
        .instructions
        .into_iter()
        .flat_map(|i| i.entries)
        .map(|e| e.content)
        .collect())
}

#[async_trait]
impl PostSource for TimelineSource {
    fn name(&self) -> &str {
        "home_timeline"
    }

    async fn fetch_latest(&self) -> Result<Vec<RawPost>> {
        let cookie = format!(
            "auth_token={}; ct0={}",
            self.config.auth_token, self.config.csrf_token
        );

        let resp = self
            .http
            .get(&self.config.url)
            .query(&self.query())
            .header("Authorization", format!("Bearer {}", self.config.bearer_token))
            .header("x-csrf-token", &self.config.csrf_token)
            .header("Cookie", cookie)
            .header("x-twitter-active-user", "yes")
            .header("x-twitter-auth-type", "OAuth2Session")
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BotError::RateLimited {
                retry_after_secs: self.config.poll_interval_secs,
            });
        }
        if !status.is_success() {
            return Err(BotError::Api(format!("timeline returned {}", status)));
        }

        let body: serde_json::Value = resp.json().await?;
        let entries = entry_contents(body)?;
        tracing::debug!("Fetched {} timeline entries", entries.len());
        Ok(entries)
    }
}
