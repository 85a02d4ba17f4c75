//! Configuration management

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub market_data: MarketDataConfig,
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// GraphQL endpoint of the home latest timeline
    pub url: String,
    /// App bearer token sent with every timeline request
    pub bearer_token: String,
    /// Session cookie (`auth_token`)
    pub auth_token: String,
    /// CSRF token, sent as `ct0` cookie and `x-csrf-token` header
    pub csrf_token: String,
    /// Poll interval in seconds
    pub poll_interval_secs: u64,
    /// Number of entries requested per poll
    pub count: u32,
    /// Hashtags never treated as symbols (case-insensitive)
    pub exclude_hashtags: Vec<String>,
    /// Maximum quote/reply/retweet nesting accepted by the extractor
    pub max_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub coingecko_url: String,
    pub tradingview_url: String,
    pub yahoo_url: String,
    /// Minimum USD volume for a lookup to count as good enough
    pub min_volume: Decimal,
    /// Stablecoin suffixes stripped from pair tickers (BTCUSDT -> BTC)
    pub stables: Vec<String>,
    /// Hashtag aliases, e.g. BITCOIN -> BTC
    pub aliases: HashMap<String, String>,
    /// Call budget of the CoinGecko API
    pub calls_per_minute: u32,
    /// Asset table refresh interval in seconds
    pub asset_refresh_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    pub crypto_charts: String,
    pub crypto_text: String,
    pub stocks_charts: String,
    pub stocks_text: String,
    pub images: String,
    pub other: String,
    pub news: String,
    /// Required when `news.crypto_following` is not empty
    pub crypto_news: Option<String>,
    /// Destination of highlighted posts
    pub highlight: Option<String>,
    /// Dedicated channel per author handle
    #[serde(default)]
    pub authors: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Handles whose posts always go to the news channel
    pub following: Vec<String>,
    /// Handles whose posts always go to the crypto news channel
    pub crypto_following: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub api_url: String,
    pub gateway_url: String,
    pub timeout_secs: u64,
    pub max_retries: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory receiving payloads that failed to parse
    pub errors_dir: String,
    /// Append-only CSV of reaction-labeled sentiment examples
    pub feedback_ledger: String,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("config path is not valid UTF-8: {}", path.display()))?;

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path_str))
            .add_source(config::Environment::with_prefix("FINTWIT").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    /// Load from default locations
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = ["config.toml", "config.yaml", "~/.config/fintwit-bot/config.toml"];

        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        anyhow::bail!("No configuration file found")
    }
}

impl StorageConfig {
    pub fn errors_dir(&self) -> PathBuf {
        expand_path(&self.errors_dir)
    }

    pub fn feedback_ledger(&self) -> PathBuf {
        expand_path(&self.feedback_ledger)
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            url: "https://twitter.com/i/api/graphql/HCosKfLNW1AcOo3la3mMgg/HomeLatestTimeline"
                .to_string(),
            bearer_token: String::new(),
            auth_token: String::new(),
            csrf_token: String::new(),
            poll_interval_secs: 300,
            count: 20,
            exclude_hashtags: vec!["CRYPTO".to_string()],
            max_depth: 8,
        }
    }
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        let aliases = [("BITCOIN", "BTC"), ("ETHEREUM", "ETH"), ("SOLANA", "SOL")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
            tradingview_url: "https://scanner.tradingview.com".to_string(),
            yahoo_url: "https://query1.finance.yahoo.com".to_string(),
            min_volume: Decimal::new(50_000, 0),
            stables: ["USDT", "USDC", "BUSD", "TUSD", "DAI", "UST", "USD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            aliases,
            calls_per_minute: 50,
            asset_refresh_secs: 24 * 3600,
            request_timeout_secs: 10,
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: "https://discord.com/api/v10".to_string(),
            gateway_url: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
            timeout_secs: 10,
            max_retries: 3,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            errors_dir: "logs".to_string(),
            feedback_ledger: "data/sentiment_data.csv".to_string(),
        }
    }
}
