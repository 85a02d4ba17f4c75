//! Embed rendering of enriched posts

use super::{Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedImage, OutboundMessage, MAX_EMBEDS};
use crate::types::{
    Category, EnrichedPost, MarketData, MediaKind, Session, SessionQuote, SymbolSnapshot,
};
use rust_decimal::Decimal;

const CRYPTO_COLOR: u32 = 0xF7931A;
const STOCKS_COLOR: u32 = 0x2ECC71;
const DEFAULT_COLOR: u32 = 0x1DA1F2;

const DESCRIPTION_LIMIT: usize = 4096;
const FIELD_LIMIT: usize = 25;

const BINANCE_BADGE: &str = "🔶";
const KUCOIN_BADGE: &str = "🟩";

pub const FOOTER_TEXT: &str = "Twitter";
const FOOTER_ICON: &str = "https://abs.twimg.com/icons/apple-touch-icon-192x192.png";

pub fn category_color(category: Category) -> u32 {
    match category {
        Category::Crypto => CRYPTO_COLOR,
        Category::Stocks => STOCKS_COLOR,
        Category::None => DEFAULT_COLOR,
    }
}

/// Main embed plus one extra embed per additional image
pub fn render(enriched: &EnrichedPost) -> OutboundMessage {
    let post = &enriched.post;

    let images: Vec<&str> = post
        .media
        .iter()
        .filter(|m| m.kind == MediaKind::Image)
        .map(|m| m.url.as_str())
        .collect();
    let videos: Vec<&str> = post
        .media
        .iter()
        .filter(|m| m.kind == MediaKind::Video)
        .map(|m| m.url.as_str())
        .collect();

    let mut description = post.text.clone();
    for url in &videos {
        description.push_str(&format!("\n\n[🎥 Video]({})", url));
    }

    let mut fields: Vec<EmbedField> = enriched.symbols.iter().flat_map(symbol_fields).collect();
    if let Some(sentiment) = &enriched.sentiment {
        fields.push(EmbedField {
            name: "Sentiment".to_string(),
            value: format!(
                "{} {} ({}%)",
                sentiment.label.emoji(),
                sentiment.label,
                sentiment.confidence_pct
            ),
            inline: false,
        });
    }
    fields.truncate(FIELD_LIMIT);

    let main = Embed {
        title: Some(post.title.clone()),
        url: Some(post.canonical_url.clone()),
        description: Some(truncate(&description, DESCRIPTION_LIMIT)),
        color: Some(category_color(enriched.category)),
        author: Some(EmbedAuthor {
            name: post.author_display_name.clone(),
            url: Some(format!("https://twitter.com/{}", post.author_handle)),
            icon_url: Some(post.author_image_url.clone()).filter(|u| !u.is_empty()),
        }),
        fields,
        image: images.first().map(|url| EmbedImage {
            url: url.to_string(),
        }),
        footer: Some(EmbedFooter {
            text: FOOTER_TEXT.to_string(),
            icon_url: Some(FOOTER_ICON.to_string()),
        }),
    };

    // Embeds sharing the post URL are shown as one gallery
    let extra = images.iter().skip(1).take(MAX_EMBEDS - 1).map(|url| Embed {
        url: Some(post.canonical_url.clone()),
        image: Some(EmbedImage {
            url: url.to_string(),
        }),
        ..Embed::default()
    });

    OutboundMessage::with_embeds(std::iter::once(main).chain(extra).collect())
}

fn symbol_fields(snapshot: &SymbolSnapshot) -> Vec<EmbedField> {
    let Some(market) = &snapshot.market else {
        return vec![EmbedField {
            name: format!("${}", snapshot.symbol),
            value: "No match".to_string(),
            inline: true,
        }];
    };

    let mut fields = vec![EmbedField {
        name: format!("${}{}", snapshot.symbol, exchange_badges(market)),
        value: price_lines(market),
        inline: true,
    }];
    if let Some(ta) = &market.technical_indicator {
        fields.push(EmbedField {
            name: "4h TA".to_string(),
            value: ta.clone(),
            inline: true,
        });
    }
    fields
}

fn exchange_badges(market: &MarketData) -> String {
    let mut badges = String::new();
    if market.exchanges.contains("binance") {
        badges.push(' ');
        badges.push_str(BINANCE_BADGE);
    }
    if market.exchanges.contains("kucoin") {
        badges.push(' ');
        badges.push_str(KUCOIN_BADGE);
    }
    badges
}

fn price_lines(market: &MarketData) -> String {
    if market.quotes.is_empty() {
        return format!("[N/A]({})", market.source_url);
    }
    market
        .quotes
        .iter()
        .map(|q| format!("[{}]({})", quote_text(q), market.source_url))
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_text(quote: &SessionQuote) -> String {
    let prefix = match quote.session {
        Session::AfterHours => "AH: ",
        Session::PreMarket => "PM: ",
        Session::Regular => "",
    };
    format!("{}${} ({})", prefix, format_price(quote.price), format_change(quote.change_pct))
}

pub fn format_price(price: Decimal) -> String {
    let dp = if price.abs() >= Decimal::ONE { 2 } else { 8 };
    price.round_dp(dp).normalize().to_string()
}

pub fn format_change(change: Option<Decimal>) -> String {
    match change {
        Some(c) if c.is_sign_negative() && !c.is_zero() => format!("{}%", c.round_dp(2)),
        Some(c) => format!("+{}%", c.round_dp(2)),
        None => "N/A".to_string(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.push('…');
    cut
}
