//! Core domain types shared across the pipeline

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Raw timeline payload as delivered by the post source
pub type RawPost = serde_json::Value;

/// Kind of attached media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Map the upstream media `type` field
    pub fn from_upstream(kind: &str) -> Self {
        match kind {
            "video" | "animated_gif" => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    pub kind: MediaKind,
}

/// Structural link between a post and the post it references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Reply,
    Quote,
    Retweet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub post: Box<ParsedPost>,
}

/// Normalized content record of one post, built once by the extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPost {
    pub id: u64,
    pub text: String,
    pub author_display_name: String,
    pub author_handle: String,
    pub author_image_url: String,
    pub canonical_url: String,
    pub media: Vec<MediaItem>,
    /// Uppercase, deduplicated across all nesting levels
    pub tickers: BTreeSet<String>,
    /// Uppercase, deduplicated, exclusion list applied
    pub hashtags: BTreeSet<String>,
    pub relation: Option<Relation>,
    pub title: String,
}

impl ParsedPost {
    pub fn relation_kind(&self) -> Option<RelationKind> {
        self.relation.as_ref().map(|r| r.kind)
    }

    pub fn related_post(&self) -> Option<&ParsedPost> {
        self.relation.as_ref().map(|r| r.post.as_ref())
    }

    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }
}

/// Where a symbol snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Crypto,
    Equity,
    Unresolved,
}

/// Trading session a quote belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    Regular,
    PreMarket,
    AfterHours,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionQuote {
    pub session: Session,
    pub price: Decimal,
    /// 24h (crypto) or session (equity) change in percent
    pub change_pct: Option<Decimal>,
}

/// Financial fields of a resolved symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub volume: Decimal,
    /// Extended-hours sessions first, regular session last
    pub quotes: Vec<SessionQuote>,
    pub exchanges: BTreeSet<String>,
    pub source_url: String,
    pub technical_indicator: Option<String>,
}

impl MarketData {
    /// Change of the regular session, if known
    pub fn regular_change(&self) -> Option<Decimal> {
        self.quotes
            .iter()
            .rev()
            .find(|q| q.session == Session::Regular)
            .and_then(|q| q.change_pct)
    }
}

/// Point-in-time market snapshot for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub symbol: String,
    pub source_kind: SourceKind,
    /// `None` exactly when `source_kind` is `Unresolved`
    pub market: Option<MarketData>,
}

impl SymbolSnapshot {
    pub fn resolved(symbol: impl Into<String>, kind: SourceKind, market: MarketData) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            source_kind: kind,
            market: Some(market),
        }
    }

    pub fn unresolved(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            source_kind: SourceKind::Unresolved,
            market: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.source_kind != SourceKind::Unresolved
    }
}

/// Topical category used purely for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Crypto,
    Stocks,
    None,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Crypto => write!(f, "crypto"),
            Category::Stocks => write!(f, "stocks"),
            Category::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Bearish,
    Neutral,
    Bullish,
}

impl SentimentLabel {
    pub fn emoji(&self) -> &'static str {
        match self {
            SentimentLabel::Bearish => "🐻",
            SentimentLabel::Neutral => "🦆",
            SentimentLabel::Bullish => "🐂",
        }
    }

    /// Integer label written to the feedback ledger
    pub fn ledger_value(&self) -> i8 {
        match self {
            SentimentLabel::Bearish => -1,
            SentimentLabel::Neutral => 0,
            SentimentLabel::Bullish => 1,
        }
    }

    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            "🐻" => Some(SentimentLabel::Bearish),
            "🦆" => Some(SentimentLabel::Neutral),
            "🐂" => Some(SentimentLabel::Bullish),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Bearish => write!(f, "Bearish"),
            SentimentLabel::Neutral => write!(f, "Neutral"),
            SentimentLabel::Bullish => write!(f, "Bullish"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnnotation {
    pub label: SentimentLabel,
    /// Probability of `label` in percent, two decimals
    pub confidence_pct: f64,
}

/// Opaque destination identifier owned by the delivery collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelRef(pub String);

impl ChannelRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of a delivered message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRef(pub String);

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parsed post plus everything the enrichment stages attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPost {
    pub post: ParsedPost,
    /// Resolved symbols, plus unresolved cashtags shown as "no match"
    pub symbols: Vec<SymbolSnapshot>,
    pub category: Category,
    pub sentiment: Option<SentimentAnnotation>,
}
