//! Reaction feedback
//!
//! Bull / duck / bear reactions label a post's text for the sentiment
//! ledger; the money-wings reaction re-posts it to the highlight channel.

#[cfg(test)]
mod tests;

use crate::error::{BotError, Result};
use crate::notify::gateway::ReactionEvent;
use crate::notify::{DeliverySink, OutboundMessage};
use crate::storage::FeedbackLedger;
use crate::types::{ChannelRef, SentimentLabel};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const HIGHLIGHT_EMOJI: &str = "💸";
pub const SAVE_EMOJI: &str = "❤️";

/// What a reaction led to
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    Ignored,
    Labeled(SentimentLabel),
    Highlighted,
}

pub struct FeedbackHandler {
    sink: Arc<dyn DeliverySink>,
    ledger: Arc<FeedbackLedger>,
    highlight_channel: Option<ChannelRef>,
}

impl FeedbackHandler {
    pub fn new(
        sink: Arc<dyn DeliverySink>,
        ledger: Arc<FeedbackLedger>,
        highlight_channel: Option<ChannelRef>,
    ) -> Self {
        Self {
            sink,
            ledger,
            highlight_channel,
        }
    }

    pub async fn handle(&self, event: &ReactionEvent) -> Result<FeedbackOutcome> {
        if event.guild_id.is_none() || event.is_self {
            return Ok(FeedbackOutcome::Ignored);
        }

        if let Some(label) = SentimentLabel::from_emoji(&event.emoji) {
            let message = self.sink.fetch_message(&event.channel, &event.message).await?;
            let Some(text) = message.embeds.first().and_then(|e| e.description.as_deref()) else {
                return Ok(FeedbackOutcome::Ignored);
            };
            self.ledger.append(text, label).await?;
            tracing::info!("{} labeled message {} as {}", event.user_name, event.message, label);
            return Ok(FeedbackOutcome::Labeled(label));
        }

        if event.emoji == HIGHLIGHT_EMOJI {
            let Some(channel) = &self.highlight_channel else {
                return Ok(FeedbackOutcome::Ignored);
            };
            let message = self.sink.fetch_message(&event.channel, &event.message).await?;
            let highlighted = highlight(message, &event.user_name)?;
            self.sink.deliver(channel, &highlighted).await?;
            tracing::info!("{} highlighted message {}", event.user_name, event.message);
            return Ok(FeedbackOutcome::Highlighted);
        }

        Ok(FeedbackOutcome::Ignored)
    }

    /// Handle reactions until the sender side closes
    pub async fn run(self, mut rx: mpsc::Receiver<ReactionEvent>) {
        while let Some(event) = rx.recv().await {
            if let Err(e) = self.handle(&event).await {
                tracing::warn!("Failed to handle {} reaction on {}: {}", event.emoji, event.message, e);
            }
        }
    }
}

/// First embed of a message with the footer extended by the highlighter
pub fn highlight(message: OutboundMessage, user_name: &str) -> Result<OutboundMessage> {
    let mut embed = message
        .embeds
        .into_iter()
        .next()
        .ok_or_else(|| BotError::Internal("message has no embed to highlight".into()))?;

    let suffix = format!("Highlighted by {}", user_name);
    match embed.footer.as_mut() {
        Some(footer) => footer.text = format!("{} | {}", footer.text, suffix),
        None => {
            embed.footer = Some(crate::notify::EmbedFooter {
                text: suffix,
                icon_url: None,
            })
        }
    }
    Ok(OutboundMessage::with_embeds(vec![embed]))
}
