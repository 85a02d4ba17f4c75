//! Post ingestion from the home timeline
//!
//! - [`PostSource`] fetches raw timeline entries
//! - [`PostExtractor`] turns one entry into a [`ParsedPost`](crate::types::ParsedPost)
//! - [`Watermark`] tracks the newest post id processed per stream

pub mod extractor;
pub mod payload;
pub mod twitter;

#[cfg(test)]
mod tests;

pub use extractor::PostExtractor;
pub use twitter::TimelineSource;

use crate::error::Result;
use crate::types::{ParsedPost, RawPost};
use async_trait::async_trait;
use std::collections::HashMap;

/// Outcome of a top-level extraction
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(ParsedPost),
    /// Post id at or below the watermark; nothing happened
    AlreadySeen,
}

impl Extraction {
    pub fn into_post(self) -> Option<ParsedPost> {
        match self {
            Extraction::Parsed(post) => Some(post),
            Extraction::AlreadySeen => None,
        }
    }
}

/// Highest post id processed so far. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark {
    latest: Option<u64>,
}

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(id: u64) -> Self {
        Self { latest: Some(id) }
    }

    pub fn latest(&self) -> Option<u64> {
        self.latest
    }

    pub fn has_seen(&self, id: u64) -> bool {
        self.latest.is_some_and(|latest| id <= latest)
    }

    pub fn advance(&mut self, id: u64) {
        self.latest = Some(self.latest.map_or(id, |latest| latest.max(id)));
    }
}

/// One watermark per post stream
#[derive(Debug, Default)]
pub struct WatermarkBook {
    streams: HashMap<String, Watermark>,
}

impl WatermarkBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&mut self, stream: &str) -> &mut Watermark {
        self.streams.entry(stream.to_string()).or_default()
    }

    pub fn latest(&self, stream: &str) -> Option<u64> {
        self.streams.get(stream).and_then(Watermark::latest)
    }
}

/// Source of raw timeline entries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Stream name, used to key the watermark
    fn name(&self) -> &str;

    /// Latest entries, newest first
    async fn fetch_latest(&self) -> Result<Vec<RawPost>>;
}

/// Whether a timeline entry carries a post (single or conversation)
pub fn is_post_entry(content: &RawPost) -> bool {
    matches!(
        content.get("entryType").and_then(|t| t.as_str()),
        Some("TimelineTimelineItem") | Some("TimelineTimelineModule")
    )
}
