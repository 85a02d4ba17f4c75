//! Lexicon sentiment model
//!
//! VADER-style scoring tuned for market chatter: general words, crypto and
//! equity slang, emoji, intensity boosters and negations. The compound
//! strength decides how much probability mass leaves "neutral"; the rest is
//! split between bullish and bearish by their share of the raw scores.

use super::{SentimentDistribution, SentimentModel};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// VADER normalization constant
const ALPHA: f64 = 15.0;

/// Words looked back for boosters and negations
const MODIFIER_WINDOW: usize = 3;

const GENERAL_TERMS: &[(&str, f64)] = &[
    ("good", 0.5),
    ("great", 0.7),
    ("excellent", 0.8),
    ("amazing", 0.8),
    ("strong", 0.5),
    ("win", 0.6),
    ("winning", 0.6),
    ("profit", 0.6),
    ("profits", 0.6),
    ("gain", 0.5),
    ("gains", 0.5),
    ("higher", 0.4),
    ("rise", 0.4),
    ("rising", 0.4),
    ("record", 0.4),
    ("opportunity", 0.5),
    ("bad", -0.5),
    ("terrible", -0.8),
    ("awful", -0.7),
    ("worst", -0.8),
    ("weak", -0.5),
    ("lose", -0.6),
    ("losing", -0.6),
    ("loss", -0.6),
    ("losses", -0.6),
    ("fail", -0.6),
    ("lower", -0.4),
    ("fall", -0.4),
    ("falling", -0.4),
    ("drop", -0.4),
    ("dropping", -0.4),
    ("risky", -0.4),
    ("warning", -0.4),
    ("fear", -0.5),
    ("panic", -0.6),
    ("crash", -0.7),
    ("crashed", -0.7),
    ("dump", -0.6),
    ("dumping", -0.6),
];

const MARKET_TERMS: &[(&str, f64)] = &[
    ("moon", 0.8),
    ("mooning", 0.9),
    ("bullish", 0.7),
    ("bull", 0.5),
    ("long", 0.4),
    ("longs", 0.3),
    ("calls", 0.4),
    ("pump", 0.5),
    ("pumping", 0.6),
    ("breakout", 0.6),
    ("ath", 0.7),
    ("accumulate", 0.5),
    ("accumulation", 0.5),
    ("hodl", 0.4),
    ("btfd", 0.4),
    ("bounce", 0.4),
    ("oversold", 0.3),
    ("undervalued", 0.4),
    ("beat", 0.5),
    ("beats", 0.5),
    ("upgrade", 0.6),
    ("upgraded", 0.6),
    ("buyback", 0.5),
    ("outperform", 0.5),
    ("adoption", 0.5),
    ("approval", 0.5),
    ("approved", 0.5),
    ("bearish", -0.7),
    ("bear", -0.5),
    ("short", -0.4),
    ("shorting", -0.4),
    ("shorts", -0.3),
    ("puts", -0.4),
    ("rekt", -0.8),
    ("rug", -0.7),
    ("rugpull", -0.9),
    ("scam", -0.9),
    ("fraud", -0.9),
    ("bubble", -0.5),
    ("overbought", -0.3),
    ("overvalued", -0.4),
    ("rejection", -0.4),
    ("rejected", -0.4),
    ("liquidation", -0.6),
    ("liquidated", -0.7),
    ("capitulation", -0.6),
    ("fud", -0.5),
    ("bloodbath", -0.7),
    ("miss", -0.5),
    ("misses", -0.5),
    ("downgrade", -0.6),
    ("downgraded", -0.6),
    ("layoffs", -0.5),
    ("bankruptcy", -0.9),
    ("delisted", -0.7),
    ("recession", -0.6),
    ("selloff", -0.6),
];

const EMOJI_TERMS: &[(&str, f64)] = &[
    ("🚀", 0.8),
    ("🌙", 0.7),
    ("💎", 0.6),
    ("🙌", 0.5),
    ("💪", 0.5),
    ("🔥", 0.5),
    ("✅", 0.4),
    ("👍", 0.4),
    ("💰", 0.4),
    ("📈", 0.6),
    ("🟢", 0.4),
    ("🐂", 0.5),
    ("⚠", -0.4),
    ("❌", -0.4),
    ("👎", -0.4),
    ("😱", -0.5),
    ("📉", -0.6),
    ("🔴", -0.4),
    ("💀", -0.3),
    ("🐻", -0.5),
    ("🩸", -0.5),
];

const BOOSTERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("absolutely", 1.4),
    ("super", 1.3),
    ("incredibly", 1.4),
    ("highly", 1.3),
    ("massively", 1.4),
    ("insanely", 1.5),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "isn't", "aren't", "wasn't", "weren't", "doesn't", "don't",
    "didn't", "won't", "can't", "cannot", "shouldn't", "wouldn't",
];

pub struct LexiconModel {
    terms: HashMap<&'static str, f64>,
    emoji: Vec<(&'static str, f64)>,
    boosters: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconModel {
    pub fn new() -> Self {
        // Market terms override general ones with the same spelling
        let terms = GENERAL_TERMS
            .iter()
            .chain(MARKET_TERMS)
            .copied()
            .collect();

        Self {
            terms,
            emoji: EMOJI_TERMS.to_vec(),
            boosters: BOOSTERS.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
        }
    }

    fn clean_word(word: &str) -> String {
        word.chars()
            .filter(|c| c.is_alphanumeric() || *c == '\'')
            .collect::<String>()
            .to_lowercase()
    }

    fn modified(&self, words: &[String], index: usize, mut score: f64) -> f64 {
        for prev in &words[index.saturating_sub(MODIFIER_WINDOW)..index] {
            if let Some(factor) = self.boosters.get(prev.as_str()) {
                score *= factor;
            }
            if self.negations.contains(prev.as_str()) {
                score *= -0.5;
            }
        }
        score.clamp(-1.0, 1.0)
    }

    /// Raw per-hit scores of a text
    pub fn scores(&self, text: &str) -> Vec<f64> {
        let mut scores: Vec<f64> = self
            .emoji
            .iter()
            .flat_map(|(emoji, score)| std::iter::repeat(*score).take(text.matches(emoji).count()))
            .collect();

        let words: Vec<String> = text.split_whitespace().map(Self::clean_word).collect();
        for (i, word) in words.iter().enumerate() {
            if let Some(&score) = self.terms.get(word.as_str()) {
                scores.push(self.modified(&words, i, score));
            }
        }
        scores
    }

    /// Compound score in [-1, 1]
    pub fn compound(scores: &[f64]) -> f64 {
        let sum: f64 = scores.iter().sum();
        sum / (sum * sum + ALPHA).sqrt()
    }

    pub fn distribution(&self, text: &str) -> SentimentDistribution {
        let scores = self.scores(text);
        let positive: f64 = scores.iter().filter(|s| **s > 0.0).sum();
        let negative: f64 = scores.iter().filter(|s| **s < 0.0).map(|s| s.abs()).sum();
        let total = positive + negative;

        if total == 0.0 {
            return SentimentDistribution::neutral();
        }

        let strength = Self::compound(&scores).abs();
        SentimentDistribution {
            bearish: negative / total * strength,
            neutral: 1.0 - strength,
            bullish: positive / total * strength,
        }
    }
}

#[async_trait]
impl SentimentModel for LexiconModel {
    async fn predict(&self, text: &str) -> Result<SentimentDistribution> {
        Ok(self.distribution(text))
    }
}
