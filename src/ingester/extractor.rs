//! Entity extraction from raw timeline payloads
//!
//! Turns one timeline entry into a [`ParsedPost`]: author, cleaned text,
//! media, tickers, hashtags and the referenced post (reply, quote or
//! retweet), recursing into nested payloads up to a fixed depth.

use super::payload::{EntryContent, TweetNode, TweetResults};
use super::{Extraction, Watermark};
use crate::config::TimelineConfig;
use crate::error::{BotError, Result};
use crate::types::{MediaItem, MediaKind, ParsedPost, RawPost, Relation, RelationKind};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static TRAILING_SHORT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://t\.co/\S+)\s*$").expect("valid regex"));

pub const REPLY_EMOJI: &str = "↩";
pub const QUOTE_EMOJI: &str = "💬";
pub const RETWEET_EMOJI: &str = "🔁";

/// Default nesting cap for quote / reply / retweet payloads
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Stateless post extractor
#[derive(Debug, Clone)]
pub struct PostExtractor {
    excluded_hashtags: HashSet<String>,
    max_depth: usize,
}

impl Default for PostExtractor {
    fn default() -> Self {
        Self::new(&["CRYPTO".to_string()], DEFAULT_MAX_DEPTH)
    }
}

impl PostExtractor {
    pub fn new(excluded_hashtags: &[String], max_depth: usize) -> Self {
        Self {
            excluded_hashtags: excluded_hashtags.iter().map(|h| h.to_uppercase()).collect(),
            max_depth,
        }
    }

    pub fn from_config(config: &TimelineConfig) -> Self {
        Self::new(&config.exclude_hashtags, config.max_depth)
    }

    /// Extract one timeline entry.
    ///
    /// With a cursor, posts at or below the watermark are reported as
    /// [`Extraction::AlreadySeen`] and the watermark only moves forward once
    /// the post was fully extracted. Without a cursor the watermark is never
    /// consulted.
    pub fn extract(&self, raw: &RawPost, cursor: Option<&mut Watermark>) -> Result<Extraction> {
        let content = EntryContent::deserialize(raw)
            .map_err(|e| BotError::malformed(format!("Unrecognized timeline entry: {}", e)))?;
        let conversation = content.conversation()?;
        let node = conversation.outer.node()?;
        let id = node.post_id()?;

        if let Some(watermark) = cursor.as_deref() {
            if watermark.has_seen(id) {
                tracing::debug!("Skipping post {} at or below watermark", id);
                return Ok(Extraction::AlreadySeen);
            }
        }

        let post = self.build(node, conversation.reply, 0)?;

        if let Some(watermark) = cursor {
            watermark.advance(id);
        }

        Ok(Extraction::Parsed(post))
    }

    fn nested(&self, results: &TweetResults, depth: usize) -> Result<ParsedPost> {
        if depth > self.max_depth {
            return Err(BotError::malformed(format!(
                "Post nesting exceeds {} levels",
                self.max_depth
            )));
        }
        self.build(results.node()?, None, depth)
    }

    fn build(
        &self,
        node: &TweetNode,
        reply: Option<&TweetResults>,
        depth: usize,
    ) -> Result<ParsedPost> {
        let id = node.post_id()?;
        let user = node.user()?;
        let legacy = node.legacy()?;

        let mut post = ParsedPost {
            id,
            text: clean_text(&legacy.full_text),
            author_display_name: user.name.clone(),
            author_handle: user.screen_name.clone(),
            author_image_url: user.profile_image_url_https.clone(),
            canonical_url: canonical_url(&user.screen_name, id),
            media: Vec::new(),
            tickers: BTreeSet::new(),
            hashtags: BTreeSet::new(),
            relation: None,
            title: format!("{} tweeted", user.name),
        };

        if let Some(extended) = &legacy.extended_entities {
            post.media = extended
                .media
                .iter()
                .map(|m| MediaItem {
                    url: m.media_url_https.clone(),
                    kind: MediaKind::from_upstream(&m.kind),
                })
                .collect();
        }
        post.tickers = normalize(legacy.entities.symbols.iter().map(|s| s.text.as_str()));
        post.hashtags = normalize(legacy.entities.hashtags.iter().map(|h| h.text.as_str()))
            .into_iter()
            .filter(|h| !self.excluded_hashtags.contains(h))
            .collect();

        let replied = reply.map(|r| self.nested(r, depth + 1)).transpose()?;
        let quoted = node
            .quoted_status_result
            .as_deref()
            .map(|q| self.nested(q, depth + 1))
            .transpose()?;
        let retweeted = legacy
            .retweeted_status_result
            .as_deref()
            .map(|r| self.nested(r, depth + 1))
            .transpose()?;

        if let Some(inner) = &replied {
            post.text = compose_reply(&post.text, inner);
        }
        if let Some(inner) = &quoted {
            post.text = compose_quote(&post.text, inner);
        }

        for inner in [&replied, &quoted, &retweeted].into_iter().flatten() {
            post.media.extend(inner.media.iter().cloned());
            post.tickers.extend(inner.tickers.iter().cloned());
            post.hashtags.extend(inner.hashtags.iter().cloned());
        }
        post.media = dedup_media(post.media);

        let relation = replied
            .map(|p| (RelationKind::Reply, p))
            .or_else(|| quoted.map(|p| (RelationKind::Quote, p)))
            .or_else(|| retweeted.map(|p| (RelationKind::Retweet, p)));

        if let Some((kind, inner)) = relation {
            post.title = relation_title(kind, &post.author_display_name, &inner.author_display_name);
            post.relation = Some(Relation {
                kind,
                post: Box::new(inner),
            });
        }

        Ok(post)
    }
}

pub fn canonical_url(handle: &str, id: u64) -> String {
    format!("https://twitter.com/{}/status/{}", handle, id)
}

fn profile_link(handle: &str) -> String {
    format!("[@{}](https://twitter.com/{})", handle, handle)
}

/// Drop the trailing t.co link and decode HTML entities
pub fn clean_text(text: &str) -> String {
    let stripped = TRAILING_SHORT_LINK.replace(text, "");
    html_escape::decode_html_entities(stripped.as_ref())
        .trim_end()
        .to_string()
}

fn quote_lines(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn compose_reply(outer: &str, inner: &ParsedPost) -> String {
    format!(
        "{}:\n{}\n\n{}",
        quote_lines(&profile_link(&inner.author_handle)),
        quote_lines(outer),
        inner.text
    )
}

fn compose_quote(outer: &str, inner: &ParsedPost) -> String {
    format!(
        "{}\n\n{}:\n{}",
        outer,
        quote_lines(&profile_link(&inner.author_handle)),
        quote_lines(&inner.text)
    )
}

fn relation_title(kind: RelationKind, name: &str, inner_name: &str) -> String {
    match kind {
        RelationKind::Reply => format!("{} {} replied to {}", REPLY_EMOJI, name, inner_name),
        RelationKind::Quote => {
            format!("{} {} quote tweeted {}", QUOTE_EMOJI, name, inner_name)
        }
        RelationKind::Retweet => {
            format!("{} {} retweeted {}", RETWEET_EMOJI, name, inner_name)
        }
    }
}

fn normalize<'a>(values: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    values
        .map(|v| v.trim().to_uppercase())
        .filter(|v| !v.is_empty())
        .collect()
}

fn dedup_media(media: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut seen = HashSet::new();
    media
        .into_iter()
        .filter(|m| seen.insert(m.url.clone()))
        .collect()
}
