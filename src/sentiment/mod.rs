//! Sentiment annotation
//!
//! Posts that mention at least one symbol get a bullish / neutral / bearish
//! label with the model's confidence. A failing model never blocks delivery.

pub mod lexicon;


pub use lexicon::LexiconModel;

use crate::error::{BotError, Result};
use crate::types::{SentimentAnnotation, SentimentLabel};
use async_trait::async_trait;

/// Probability of each label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentDistribution {
    pub bearish: f64,
    pub neutral: f64,
    pub bullish: f64,
}

impl SentimentDistribution {
    pub fn neutral() -> Self {
        Self {
            bearish: 0.0,
            neutral: 1.0,
            bullish: 0.0,
        }
    }

    pub fn probability(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Bearish => self.bearish,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Bullish => self.bullish,
        }
    }

    /// Most likely label; ties resolve to neutral, then bullish
    pub fn top(&self) -> (SentimentLabel, f64) {
        [SentimentLabel::Neutral, SentimentLabel::Bullish, SentimentLabel::Bearish]
            .into_iter()
            .map(|label| (label, self.probability(label)))
            .fold((SentimentLabel::Neutral, f64::MIN), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }

    fn validate(self) -> Result<Self> {
        let valid = [self.bearish, self.neutral, self.bullish]
            .iter()
            .all(|p| p.is_finite() && (0.0..=1.0).contains(p));
        if valid {
            Ok(self)
        } else {
            Err(BotError::Internal(format!("invalid sentiment distribution {:?}", self)))
        }
    }
}

/// Three-way text classifier
#[async_trait]
pub trait SentimentModel: Send + Sync {
    async fn predict(&self, text: &str) -> Result<SentimentDistribution>;
}

/// Label `text` when the post mentions symbols. Model failures are logged
/// and yield `None`.
pub async fn annotate(
    text: &str,
    symbols_present: bool,
    model: &dyn SentimentModel,
) -> Option<SentimentAnnotation> {
    if !symbols_present {
        return None;
    }

    let distribution = match model.predict(text).await.and_then(SentimentDistribution::validate) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("Sentiment model failed: {}", e);
            return None;
        }
    };

    let (label, probability) = distribution.top();
    Some(SentimentAnnotation {
        label,
        confidence_pct: (probability * 10_000.0).round() / 100.0,
    })
}
