//! Post processing pipeline
//!
//! raw entry -> extract -> resolve symbols -> classify -> annotate -> route
//! -> deliver -> react. Posts are handled one at a time, oldest first, and
//! no single failure stops the loop.

pub mod category;
pub mod routing;


pub use category::classify;
pub use routing::{ChannelTable, RoutingDecision};

use crate::error::{BotError, Result};
use crate::feedback::{HIGHLIGHT_EMOJI, SAVE_EMOJI};
use crate::ingester::{is_post_entry, Extraction, PostExtractor, PostSource, Watermark, WatermarkBook};
use crate::notify::{render, DeliverySink};
use crate::resolver::{Majority, SymbolResolver};
use crate::sentiment::{annotate, SentimentModel};
use crate::storage::ErrorSink;
use crate::types::{
    Category, ChannelRef, EnrichedPost, MessageRef, ParsedPost, RawPost, SentimentLabel,
    SourceKind, SymbolSnapshot,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of handling one timeline entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    AlreadySeen,
    Malformed,
    Processed {
        id: u64,
        category: Category,
        delivered: usize,
        failed: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub fetched: usize,
    pub processed: usize,
    pub already_seen: usize,
    pub malformed: usize,
    pub deliveries: usize,
    pub failed_deliveries: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &PostOutcome) {
        match outcome {
            PostOutcome::AlreadySeen => self.already_seen += 1,
            PostOutcome::Malformed => self.malformed += 1,
            PostOutcome::Processed { delivered, failed, .. } => {
                self.processed += 1;
                self.deliveries += delivered;
                self.failed_deliveries += failed;
            }
        }
    }
}

pub struct Pipeline {
    extractor: PostExtractor,
    resolver: Arc<SymbolResolver>,
    sentiment: Arc<dyn SentimentModel>,
    channels: ChannelTable,
    sink: Arc<dyn DeliverySink>,
    errors: Arc<dyn ErrorSink>,
    /// Uppercase hashtag -> ticker
    aliases: HashMap<String, String>,
}

impl Pipeline {
    pub fn new(
        extractor: PostExtractor,
        resolver: Arc<SymbolResolver>,
        sentiment: Arc<dyn SentimentModel>,
        channels: ChannelTable,
        sink: Arc<dyn DeliverySink>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            extractor,
            resolver,
            sentiment,
            channels,
            sink,
            errors,
            aliases: HashMap::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &HashMap<String, String>) -> Self {
        self.aliases = aliases
            .iter()
            .map(|(tag, ticker)| (tag.to_uppercase(), ticker.to_uppercase()))
            .collect();
        self
    }

    /// Resolve cashtags, then hashtags, with a running asset-class hint.
    /// Unresolved cashtags are kept; unresolved hashtags are dropped.
    pub async fn resolve_symbols(&self, post: &ParsedPost) -> Vec<SymbolSnapshot> {
        let mut queue: Vec<(String, bool)> =
            post.tickers.iter().map(|t| (t.clone(), true)).collect();
        for tag in &post.hashtags {
            match self.aliases.get(tag) {
                Some(target) if post.tickers.contains(target) => {
                    debug!("Skipping #{}, ${} already present", tag, target);
                }
                Some(target) => queue.push((target.clone(), false)),
                None => queue.push((tag.clone(), false)),
            }
        }

        let (mut crypto, mut equity) = (0, 0);
        let mut seen = HashSet::new();
        let mut snapshots = Vec::new();

        for (ticker, is_cashtag) in queue {
            if !seen.insert(ticker.clone()) {
                continue;
            }
            let snapshot = self
                .resolver
                .resolve(&ticker, Majority::from_counts(crypto, equity))
                .await;

            match snapshot.source_kind {
                SourceKind::Crypto => crypto += 1,
                SourceKind::Equity => equity += 1,
                SourceKind::Unresolved if !is_cashtag => continue,
                SourceKind::Unresolved => {}
            }
            if snapshots
                .iter()
                .any(|s: &SymbolSnapshot| s.is_resolved() && s.symbol == snapshot.symbol)
            {
                continue;
            }
            snapshots.push(snapshot);
        }
        snapshots
    }

    pub async fn enrich(&self, post: ParsedPost) -> EnrichedPost {
        let symbols = self.resolve_symbols(&post).await;
        let category = classify(&symbols);
        let mentions_symbols = !post.tickers.is_empty() || !post.hashtags.is_empty();
        let sentiment = annotate(&post.text, mentions_symbols, self.sentiment.as_ref()).await;

        EnrichedPost {
            post,
            symbols,
            category,
            sentiment,
        }
    }

    async fn add_reactions(&self, channel: &ChannelRef, message: &MessageRef, category: Category) {
        let mut emojis = vec![HIGHLIGHT_EMOJI, SAVE_EMOJI];
        if category != Category::None {
            emojis.extend(
                [SentimentLabel::Bullish, SentimentLabel::Neutral, SentimentLabel::Bearish]
                    .iter()
                    .map(|l| l.emoji()),
            );
        }

        for emoji in emojis {
            if let Err(e) = self.sink.react(channel, message, emoji).await {
                warn!("Failed to add {} to message {} in {}: {}", emoji, message, channel, e);
            }
        }
    }

    /// Route, render and deliver; returns (delivered, failed)
    pub async fn deliver(&self, enriched: &EnrichedPost) -> (usize, usize) {
        let post = &enriched.post;
        let decision = self
            .channels
            .route(enriched.category, post.has_media(), &post.author_handle);
        let message = render(enriched);

        let (mut delivered, mut failed) = (0, 0);
        for target in decision.targets() {
            match self.sink.deliver(target, &message).await {
                Ok(message_ref) => {
                    delivered += 1;
                    self.add_reactions(target, &message_ref, enriched.category).await;
                }
                Err(e) => {
                    failed += 1;
                    warn!("Failed to deliver post {} to {}: {}", post.id, target, e);
                }
            }
        }
        (delivered, failed)
    }

    pub async fn process_post(&self, raw: &RawPost, cursor: &mut Watermark) -> PostOutcome {
        let post = match self.extractor.extract(raw, Some(cursor)) {
            Ok(Extraction::Parsed(post)) => post,
            Ok(Extraction::AlreadySeen) => return PostOutcome::AlreadySeen,
            Err(BotError::MalformedPost { reason }) => {
                self.errors.record_malformed(raw, &reason).await;
                return PostOutcome::Malformed;
            }
            Err(e) => {
                self.errors.record_malformed(raw, &e.to_string()).await;
                return PostOutcome::Malformed;
            }
        };

        let id = post.id;
        let enriched = self.enrich(post).await;
        info!(
            "Post {} by @{}: {} symbols, category {}",
            id,
            enriched.post.author_handle,
            enriched.symbols.len(),
            enriched.category
        );

        let (delivered, failed) = self.deliver(&enriched).await;
        PostOutcome::Processed {
            id,
            category: enriched.category,
            delivered,
            failed,
        }
    }

    /// Process a newest-first batch oldest-first
    pub async fn process_batch(&self, batch: Vec<RawPost>, cursor: &mut Watermark) -> BatchSummary {
        let mut summary = BatchSummary {
            fetched: batch.len(),
            ..BatchSummary::default()
        };
        for raw in batch.iter().rev() {
            let outcome = self.process_post(raw, cursor).await;
            summary.record(&outcome);
        }
        summary
    }

    pub async fn poll_once(&self, source: &dyn PostSource, book: &mut WatermarkBook) -> Result<BatchSummary> {
        let entries: Vec<RawPost> = source
            .fetch_latest()
            .await?
            .into_iter()
            .filter(is_post_entry)
            .collect();
        Ok(self.process_batch(entries, book.cursor(source.name())).await)
    }

    /// Poll until `shutdown` resolves. A batch in progress is finished first.
    pub async fn run<S>(&self, source: &dyn PostSource, poll_interval: Duration, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut book = WatermarkBook::new();
        let mut interval = tokio::time::interval(poll_interval);
        tokio::pin!(shutdown);

        info!("Polling {} every {}s", source.name(), poll_interval.as_secs());
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping timeline loop");
                    return;
                }
                _ = interval.tick() => {
                    match self.poll_once(source, &mut book).await {
                        Ok(summary) => info!(
                            "Batch done: {} fetched, {} processed, {} seen, {} malformed, {} delivered, {} failed",
                            summary.fetched,
                            summary.processed,
                            summary.already_seen,
                            summary.malformed,
                            summary.deliveries,
                            summary.failed_deliveries
                        ),
                        Err(e) => warn!("Failed to fetch {}: {}", source.name(), e),
                    }
                }
            }
        }
    }
}
