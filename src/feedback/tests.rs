//! Tests for feedback module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::notify::{Embed, EmbedFooter, MockDeliverySink};
    use crate::types::MessageRef;
    use std::path::PathBuf;

    fn temp_ledger() -> (Arc<FeedbackLedger>, PathBuf) {
        let dir = std::env::temp_dir().join(format!("fintwit-feedback-{}", uuid::Uuid::new_v4()));
        (Arc::new(FeedbackLedger::new(dir.join("sentiment.csv"))), dir)
    }

    fn posted_message() -> OutboundMessage {
        OutboundMessage::with_embeds(vec![Embed {
            title: Some("Trader tweeted".to_string()),
            description: Some("$BTC breaking out\nnext stop 100k".to_string()),
            footer: Some(EmbedFooter {
                text: "Twitter".to_string(),
                icon_url: None,
            }),
            ..Embed::default()
        }])
    }

    fn reaction(emoji: &str) -> ReactionEvent {
        ReactionEvent {
            guild_id: Some("42".to_string()),
            channel: ChannelRef::new("100"),
            message: MessageRef("555".to_string()),
            user_id: "7".to_string(),
            user_name: "alice".to_string(),
            emoji: emoji.to_string(),
            is_self: false,
        }
    }

    #[tokio::test]
    async fn test_direct_message_ignored() {
        let (ledger, _) = temp_ledger();
        let handler = FeedbackHandler::new(Arc::new(MockDeliverySink::new()), ledger, None);

        let mut event = reaction("🐂");
        event.guild_id = None;
        assert_eq!(handler.handle(&event).await.unwrap(), FeedbackOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_own_reaction_ignored() {
        let (ledger, _) = temp_ledger();
        let handler = FeedbackHandler::new(Arc::new(MockDeliverySink::new()), ledger, None);

        let mut event = reaction("🐻");
        event.is_self = true;
        assert_eq!(handler.handle(&event).await.unwrap(), FeedbackOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_label_appends_ledger_row() {
        let mut sink = MockDeliverySink::new();
        sink.expect_fetch_message()
            .withf(|channel, message| channel.as_str() == "100" && message.0 == "555")
            .times(1)
            .returning(|_, _| Ok(posted_message()));
        let (ledger, dir) = temp_ledger();
        let handler = FeedbackHandler::new(Arc::new(sink), ledger.clone(), None);

        let outcome = handler.handle(&reaction("🐂")).await.unwrap();

        assert_eq!(outcome, FeedbackOutcome::Labeled(SentimentLabel::Bullish));
        let content = tokio::fs::read_to_string(ledger.path()).await.unwrap();
        assert_eq!(content, "$BTC breaking out next stop 100k,1\n");
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_highlight_reposts_first_embed() {
        let mut sink = MockDeliverySink::new();
        sink.expect_fetch_message()
            .times(1)
            .returning(|_, _| Ok(posted_message()));
        sink.expect_deliver()
            .withf(|channel, message| {
                channel.as_str() == "999"
                    && message.embeds.len() == 1
                    && message.embeds[0].footer.as_ref().map(|f| f.text.as_str())
                        == Some("Twitter | Highlighted by alice")
            })
            .times(1)
            .returning(|_, _| Ok(MessageRef("777".to_string())));
        let (ledger, _) = temp_ledger();
        let handler = FeedbackHandler::new(Arc::new(sink), ledger, Some(ChannelRef::new("999")));

        let outcome = handler.handle(&reaction(HIGHLIGHT_EMOJI)).await.unwrap();
        assert_eq!(outcome, FeedbackOutcome::Highlighted);
    }

    #[tokio::test]
    async fn test_highlight_without_channel_ignored() {
        let (ledger, _) = temp_ledger();
        let handler = FeedbackHandler::new(Arc::new(MockDeliverySink::new()), ledger, None);
        assert_eq!(
            handler.handle(&reaction(HIGHLIGHT_EMOJI)).await.unwrap(),
            FeedbackOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_other_emoji_ignored() {
        let (ledger, _) = temp_ledger();
        let handler = FeedbackHandler::new(Arc::new(MockDeliverySink::new()), ledger, None);
        assert_eq!(
            handler.handle(&reaction(SAVE_EMOJI)).await.unwrap(),
            FeedbackOutcome::Ignored
        );
    }

    #[test]
    fn test_highlight_adds_missing_footer() {
        let message = OutboundMessage::with_embeds(vec![Embed::default(), Embed::default()]);
        let highlighted = highlight(message, "bob").unwrap();

        assert_eq!(highlighted.embeds.len(), 1);
        assert_eq!(
            highlighted.embeds[0].footer.as_ref().unwrap().text,
            "Highlighted by bob"
        );
    }

    #[test]
    fn test_highlight_requires_embed() {
        assert!(highlight(OutboundMessage::default(), "bob").is_err());
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let mut sink = MockDeliverySink::new();
        sink.expect_fetch_message()
            .times(1)
            .returning(|_, _| Err(BotError::Delivery {
                channel: "100".to_string(),
                reason: "Unknown Message".to_string(),
            }));
        let (ledger, _) = temp_ledger();
        let handler = FeedbackHandler::new(Arc::new(sink), ledger, None);

        let (tx, rx) = mpsc::channel(4);
        tx.send(reaction("🦆")).await.unwrap();
        drop(tx);

        handler.run(rx).await;
    }
}
