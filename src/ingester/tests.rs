//! Unit tests for ingester module

#[cfg(test)]
mod tests {
    use super::super::twitter::entry_contents;
    use super::super::*;
    use crate::error::BotError;
    use crate::types::{MediaKind, RelationKind};
    use serde_json::{json, Value};

    fn tweet(id: u64, handle: &str, name: &str, text: &str) -> Value {
        json!({
            "__typename": "Tweet",
            "rest_id": id.to_string(),
            "core": {
                "user_results": {
                    "result": {
                        "__typename": "User",
                        "legacy": {
                            "name": name,
                            "screen_name": handle,
                            "profile_image_url_https": format!("https://pbs.twimg.com/{}.jpg", handle)
                        }
                    }
                }
            },
            "legacy": {
                "id_str": id.to_string(),
                "full_text": text,
                "entities": { "hashtags": [], "symbols": [] }
            }
        })
    }

    fn with_symbols(mut node: Value, symbols: &[&str]) -> Value {
        node["legacy"]["entities"]["symbols"] =
            Value::Array(symbols.iter().map(|s| json!({ "text": s })).collect());
        node
    }

    fn with_hashtags(mut node: Value, tags: &[&str]) -> Value {
        node["legacy"]["entities"]["hashtags"] =
            Value::Array(tags.iter().map(|s| json!({ "text": s })).collect());
        node
    }

    fn with_media(mut node: Value, media: &[(&str, &str)]) -> Value {
        node["legacy"]["extended_entities"] = json!({
            "media": media
                .iter()
                .map(|(url, kind)| json!({ "media_url_https": url, "type": kind }))
                .collect::<Vec<_>>()
        });
        node
    }

    fn item(node: Value) -> Value {
        json!({
            "entryType": "TimelineTimelineItem",
            "__typename": "TimelineTimelineItem",
            "itemContent": { "tweet_results": { "result": node } }
        })
    }

    fn conversation(outer: Value, reply: Value) -> Value {
        json!({
            "entryType": "TimelineTimelineModule",
            "items": [
                { "item": { "itemContent": { "tweet_results": { "result": outer } } } },
                { "item": { "itemContent": { "tweet_results": { "result": reply } } } }
            ]
        })
    }

    fn parsed(extraction: Extraction) -> crate::types::ParsedPost {
        extraction.into_post().expect("expected a parsed post")
    }

    #[test]
    fn test_plain_post() {
        let raw = item(with_symbols(
            tweet(100, "trader", "Trader Joe", "Long $btc here https://t.co/abc123"),
            &["btc"],
        ));

        let post = parsed(PostExtractor::default().extract(&raw, None).unwrap());

        assert_eq!(post.id, 100);
        assert_eq!(post.text, "Long $btc here");
        assert_eq!(post.title, "Trader Joe tweeted");
        assert_eq!(post.canonical_url, "https://twitter.com/trader/status/100");
        assert!(post.tickers.contains("BTC"));
        assert!(post.relation.is_none());
    }

    #[test]
    fn test_html_entities_unescaped() {
        let raw = item(tweet(1, "a", "A", "S&amp;P 500 &gt; 5000 &lt;3"));
        let post = parsed(PostExtractor::default().extract(&raw, None).unwrap());
        assert_eq!(post.text, "S&P 500 > 5000 <3");
    }

    #[test]
    fn test_excluded_hashtag_dropped() {
        let raw = item(with_hashtags(
            tweet(2, "a", "A", "gm"),
            &["crypto", "Bitcoin", "bitcoin", ""],
        ));
        let post = parsed(PostExtractor::default().extract(&raw, None).unwrap());

        assert_eq!(post.hashtags.len(), 1);
        assert!(post.hashtags.contains("BITCOIN"));
    }

    #[test]
    fn test_media_kinds_and_dedup() {
        let raw = item(with_media(
            tweet(3, "a", "A", "chart"),
            &[
                ("https://img/1.jpg", "photo"),
                ("https://img/1.jpg", "photo"),
                ("https://vid/2.jpg", "animated_gif"),
            ],
        ));
        let post = parsed(PostExtractor::default().extract(&raw, None).unwrap());

        assert_eq!(post.media.len(), 2);
        assert_eq!(post.media[0].kind, MediaKind::Image);
        assert_eq!(post.media[1].kind, MediaKind::Video);
    }

    #[test]
    fn test_reply_round_trip() {
        let outer = with_symbols(tweet(10, "outer", "Outer", "What about $ETH?"), &["ETH"]);
        let inner = with_symbols(tweet(11, "inner", "Inner", "Bullish on $SOL"), &["SOL"]);

        let post = parsed(
            PostExtractor::default()
                .extract(&conversation(outer, inner), None)
                .unwrap(),
        );

        assert_eq!(post.relation_kind(), Some(RelationKind::Reply));
        assert_eq!(
            post.text,
            "> [@inner](https://twitter.com/inner):\n> What about $ETH?\n\nBullish on $SOL"
        );
        assert_eq!(post.title, "↩ Outer replied to Inner");
        assert!(post.tickers.contains("ETH"));
        assert!(post.tickers.contains("SOL"));
        assert_eq!(post.related_post().unwrap().id, 11);
    }

    #[test]
    fn test_quote_composition() {
        let mut outer = tweet(20, "outer", "Outer", "Look at this");
        outer["quoted_status_result"] = json!({
            "result": with_symbols(tweet(21, "quoted", "Quoted", "line one\nline two"), &["NVDA"])
        });

        let post = parsed(PostExtractor::default().extract(&item(outer), None).unwrap());

        assert_eq!(post.relation_kind(), Some(RelationKind::Quote));
        assert_eq!(
            post.text,
            "Look at this\n\n> [@quoted](https://twitter.com/quoted):\n> line one\n> line two"
        );
        assert_eq!(post.title, "💬 Outer quote tweeted Quoted");
        assert!(post.tickers.contains("NVDA"));
    }

    #[test]
    fn test_retweet_keeps_text() {
        let mut outer = tweet(30, "rt", "Retweeter", "RT @orig: big news");
        outer["legacy"]["retweeted_status_result"] = json!({
            "result": with_media(tweet(29, "orig", "Orig", "big news"), &[("https://img/x.jpg", "photo")])
        });

        let post = parsed(PostExtractor::default().extract(&item(outer), None).unwrap());

        assert_eq!(post.relation_kind(), Some(RelationKind::Retweet));
        assert_eq!(post.text, "RT @orig: big news");
        assert_eq!(post.title, "🔁 Retweeter retweeted Orig");
        assert!(post.has_media());
    }

    #[test]
    fn test_reply_wins_title_over_quote() {
        let mut outer = tweet(40, "outer", "Outer", "reply with quote");
        outer["quoted_status_result"] = json!({ "result": tweet(41, "quoted", "Q", "q") });
        let inner = tweet(42, "inner", "I", "original");

        let post = parsed(
            PostExtractor::default()
                .extract(&conversation(outer, inner), None)
                .unwrap(),
        );

        assert_eq!(post.relation_kind(), Some(RelationKind::Reply));
        assert!(post.title.ends_with("replied to I"));
        assert!(post.text.ends_with("> [@quoted](https://twitter.com/quoted):\n> q"));
    }

    #[test]
    fn test_visibility_wrapper() {
        let raw = item(json!({
            "__typename": "TweetWithVisibilityResults",
            "tweet": tweet(50, "wrapped", "Wrapped", "limited")
        }));
        let post = parsed(PostExtractor::default().extract(&raw, None).unwrap());
        assert_eq!(post.author_handle, "wrapped");
    }

    #[test]
    fn test_missing_core_is_malformed() {
        let mut node = tweet(60, "a", "A", "x");
        node.as_object_mut().unwrap().remove("core");

        let err = PostExtractor::default().extract(&item(node), None).unwrap_err();
        assert!(matches!(err, BotError::MalformedPost { .. }));
    }

    #[test]
    fn test_unknown_shapes_are_malformed() {
        let extractor = PostExtractor::default();

        let tombstone = item(json!({ "__typename": "TweetTombstone" }));
        assert!(matches!(
            extractor.extract(&tombstone, None),
            Err(BotError::MalformedPost { .. })
        ));

        let cursor_entry = json!({ "entryType": "TimelineTimelineCursor", "value": "abc" });
        assert!(matches!(
            extractor.extract(&cursor_entry, None),
            Err(BotError::MalformedPost { .. })
        ));

        let no_results = json!({ "entryType": "TimelineTimelineItem", "itemContent": {} });
        assert!(matches!(
            extractor.extract(&no_results, None),
            Err(BotError::MalformedPost { .. })
        ));
    }

    #[test]
    fn test_depth_cap() {
        let mut node = tweet(1000, "leaf", "Leaf", "leaf");
        for id in 1001..1012 {
            let mut parent = tweet(id, "q", "Q", "quote");
            parent["quoted_status_result"] = json!({ "result": node });
            node = parent;
        }

        let err = PostExtractor::new(&[], 8).extract(&item(node.clone()), None).unwrap_err();
        assert!(matches!(err, BotError::MalformedPost { .. }));

        assert!(PostExtractor::new(&[], 16).extract(&item(node), None).is_ok());
    }

    #[test]
    fn test_watermark_idempotence() {
        let extractor = PostExtractor::default();
        let mut book = WatermarkBook::new();
        let batch = vec![
            item(tweet(5, "a", "A", "one")),
            item(tweet(7, "a", "A", "two")),
        ];

        let first: Vec<_> = batch
            .iter()
            .map(|raw| extractor.extract(raw, Some(book.cursor("home"))).unwrap())
            .collect();
        assert!(first.iter().all(|e| matches!(e, Extraction::Parsed(_))));
        assert_eq!(book.latest("home"), Some(7));

        let second: Vec<_> = batch
            .iter()
            .map(|raw| extractor.extract(raw, Some(book.cursor("home"))).unwrap())
            .collect();
        assert!(second.iter().all(|e| *e == Extraction::AlreadySeen));
        assert_eq!(book.latest("home"), Some(7));
    }

    #[test]
    fn test_malformed_post_does_not_advance_watermark() {
        let extractor = PostExtractor::default();
        let mut watermark = Watermark::starting_at(10);
        let mut node = tweet(11, "a", "A", "x");
        node["legacy"].as_object_mut().unwrap().remove("full_text");

        assert!(extractor.extract(&item(node), Some(&mut watermark)).is_err());
        assert_eq!(watermark.latest(), Some(10));
    }

    #[test]
    fn test_without_cursor_ignores_watermark() {
        let extractor = PostExtractor::default();
        let raw = item(tweet(3, "a", "A", "old"));
        assert!(matches!(
            extractor.extract(&raw, None).unwrap(),
            Extraction::Parsed(_)
        ));
    }

    #[test]
    fn test_watermark_monotonic() {
        let mut watermark = Watermark::new();
        assert!(!watermark.has_seen(1));
        watermark.advance(9);
        watermark.advance(4);
        assert_eq!(watermark.latest(), Some(9));
        assert!(watermark.has_seen(9));
        assert!(!watermark.has_seen(10));
    }

    #[test]
    fn test_watermark_book_streams_independent() {
        let mut book = WatermarkBook::new();
        book.cursor("home").advance(50);
        assert_eq!(book.latest("home"), Some(50));
        assert_eq!(book.latest("lists"), None);
    }

    #[test]
    fn test_is_post_entry() {
        assert!(is_post_entry(&json!({ "entryType": "TimelineTimelineItem" })));
        assert!(is_post_entry(&json!({ "entryType": "TimelineTimelineModule" })));
        assert!(!is_post_entry(&json!({ "entryType": "TimelineTimelineCursor" })));
    }

    #[test]
    fn test_entry_contents() {
        let body = json!({
            "data": { "home": { "home_timeline_urt": { "instructions": [
                { "type": "TimelineClearCache" },
                { "type": "TimelineAddEntries", "entries": [
                    { "entryId": "tweet-2", "content": item(tweet(2, "a", "A", "b")) },
                    { "entryId": "cursor-top", "content": { "entryType": "TimelineTimelineCursor" } }
                ]}
            ]}}}
        });

        let contents = entry_contents(body).unwrap();
        assert_eq!(contents.len(), 2);
        assert!(is_post_entry(&contents[0]));
        assert!(!is_post_entry(&contents[1]));
    }

    #[tokio::test]
    async fn test_mock_post_source() {
        let mut source = MockPostSource::new();
        source
            .expect_fetch_latest()
            .times(1)
            .returning(|| Ok(vec![item(tweet(1, "a", "A", "x"))]));

        let entries = source.fetch_latest().await.unwrap();
        let post = parsed(PostExtractor::default().extract(&entries[0], None).unwrap());
        assert_eq!(post.id, 1);
    }
}
