//! FinTwit Timeline Bot
//!
//! Polls the home timeline and forwards enriched posts to Discord.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use fintwit_bot::{
    client::{CallBudget, CoinGeckoClient, CryptoMarketData, Throttled, TradingViewClient, YahooClient},
    config::{Config, MarketDataConfig},
    feedback::FeedbackHandler,
    ingester::{twitter::entry_contents, PostExtractor, TimelineSource},
    notify::{gateway::ReactionListener, DiscordSink},
    pipeline::{ChannelTable, Pipeline},
    resolver::{assets, AssetTable, Majority, SymbolResolver},
    sentiment::LexiconModel,
    storage::{FeedbackLedger, FileErrorSink},
    types::ChannelRef,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fintwit-bot")]
#[command(about = "Forward financial Twitter posts to Discord with market data and sentiment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot
    Run,
    /// Extract posts from a saved timeline response or entry
    Parse {
        /// JSON file
        file: PathBuf,
    },
    /// Resolve a single ticker against the market data providers
    Resolve {
        ticker: String,

        /// Asset class to try first
        #[arg(long, value_enum)]
        hint: Option<Hint>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Hint {
    Crypto,
    Equity,
}

impl From<Hint> for Majority {
    fn from(hint: Hint) -> Self {
        match hint {
            Hint::Crypto => Majority::Crypto,
            Hint::Equity => Majority::Equity,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run => run_bot(config).await,
        Commands::Parse { file } => parse_file(config, &file).await,
        Commands::Resolve { ticker, hint } => {
            resolve_ticker(config, &ticker, hint.map_or(Majority::Unknown, Majority::from)).await
        }
    }
}

struct Providers {
    crypto: Arc<dyn CryptoMarketData>,
    resolver: Arc<SymbolResolver>,
    assets: assets::SharedAssets,
}

async fn build_providers(config: &MarketDataConfig) -> anyhow::Result<Providers> {
    let timeout = config.request_timeout_secs;
    let crypto: Arc<dyn CryptoMarketData> = Arc::new(Throttled::new(
        CoinGeckoClient::new(&config.coingecko_url, timeout)?,
        CallBudget::per_minute(config.calls_per_minute),
    ));
    let live = Arc::new(TradingViewClient::new(&config.tradingview_url, timeout)?);
    let equity = Arc::new(YahooClient::new(&config.yahoo_url, timeout)?);

    let table = match AssetTable::load(crypto.as_ref()).await {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Could not load asset table, starting empty: {}", e);
            AssetTable::default()
        }
    };
    tracing::info!("Loaded {} coins", table.len());
    let assets = table.into_shared();

    let resolver = SymbolResolver::from_providers(crypto.clone(), live, equity, assets.clone(), config);
    Ok(Providers {
        crypto,
        resolver: Arc::new(resolver),
        assets,
    })
}

async fn run_bot(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting FinTwit bot");

    let channels = ChannelTable::from_config(&config.channels, &config.news)?;
    let providers = build_providers(&config.market_data).await?;
    let source = TimelineSource::new(config.timeline.clone())?;
    let sink = Arc::new(DiscordSink::new(&config.discord)?);
    let errors = Arc::new(FileErrorSink::new(config.storage.errors_dir()));
    let ledger = Arc::new(FeedbackLedger::new(config.storage.feedback_ledger()));

    // Reaction feedback
    let (tx, rx) = mpsc::channel(256);
    let listener = ReactionListener::new(&config.discord.gateway_url, &config.discord.bot_token);
    let highlight = config
        .channels
        .highlight
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(ChannelRef::new);
    let feedback = FeedbackHandler::new(sink.clone(), ledger, highlight);
    let listener_task = tokio::spawn(listener.run(tx));
    let feedback_task = tokio::spawn(feedback.run(rx));

    // Periodic asset table refresh
    let refresh_every = Duration::from_secs(config.market_data.asset_refresh_secs.max(60));
    let (crypto, shared) = (providers.crypto.clone(), providers.assets.clone());
    let refresh_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_every);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = assets::refresh(&shared, crypto.as_ref()).await {
                tracing::warn!("Asset table refresh failed: {}", e);
            }
        }
    });

    let pipeline = Pipeline::new(
        PostExtractor::from_config(&config.timeline),
        providers.resolver,
        Arc::new(LexiconModel::new()),
        channels,
        sink,
        errors,
    )
    .with_aliases(&config.market_data.aliases);

    tracing::info!("Bot initialized. Starting main loop...");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };
    pipeline
        .run(
            &source,
            Duration::from_secs(config.timeline.poll_interval_secs),
            shutdown,
        )
        .await;

    refresh_task.abort();
    listener_task.abort();
    feedback_task.abort();
    tracing::info!("Stopped");
    Ok(())
}

async fn parse_file(config: Config, file: &Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let body: serde_json::Value = serde_json::from_str(&raw)?;

    let entries = if body.get("data").is_some() {
        entry_contents(body)?
    } else {
        vec![body]
    };

    let extractor = PostExtractor::from_config(&config.timeline);
    for entry in &entries {
        match extractor.extract(entry, None) {
            Ok(extraction) => {
                if let Some(post) = extraction.into_post() {
                    println!("{}", serde_json::to_string_pretty(&post)?);
                }
            }
            Err(e) => eprintln!("Skipping entry: {}", e),
        }
    }
    Ok(())
}

async fn resolve_ticker(config: Config, ticker: &str, hint: Majority) -> anyhow::Result<()> {
    let providers = build_providers(&config.market_data).await?;
    let snapshot = providers.resolver.resolve(ticker, hint).await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
