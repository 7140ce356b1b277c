//! Sentiment scoring.
//!
//! A [`PolarityAnalyzer`] turns text into a polarity in `[-1.0, 1.0]`; a
//! [`LabelPolicy`] maps that polarity to a discrete [`SentimentLabel`]. The two
//! are combined by [`SentimentScorer`], which is what the pipeline and the
//! scraper hold on to.

mod lexicon;

pub use lexicon::LexiconAnalyzer;

use anyhow::{bail, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `sentiment` sub-document stored on a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: f64,
    pub label: SentimentLabel,
}

/// Threshold policy mapping a polarity to a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelPolicy {
    /// Neutral band of +/-0.1 around zero (exclusive bounds on the polar side).
    #[default]
    StrictBand,
    /// Anything above zero is positive, below zero negative; neutral only at exactly 0.
    ZeroThreshold,
    /// Compound-score band: >= 0.05 positive, <= -0.05 negative.
    CompoundBand,
}

impl LabelPolicy {
    pub fn label(&self, polarity: f64) -> SentimentLabel {
        let (is_positive, is_negative) = match self {
            LabelPolicy::StrictBand => (polarity > 0.1, polarity < -0.1),
            LabelPolicy::ZeroThreshold => (polarity > 0.0, polarity < 0.0),
            LabelPolicy::CompoundBand => (polarity >= 0.05, polarity <= -0.05),
        };
        if is_positive {
            SentimentLabel::Positive
        } else if is_negative {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelPolicy::StrictBand => "strict-band",
            LabelPolicy::ZeroThreshold => "zero-threshold",
            LabelPolicy::CompoundBand => "compound-band",
        }
    }
}

impl fmt::Display for LabelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes a polarity value for a piece of text.
pub trait PolarityAnalyzer: Send + Sync {
    /// Polarity nominally in `[-1.0, 1.0]`.
    fn polarity(&self, text: &str) -> Result<f64>;
}

pub struct SentimentScorer {
    analyzer: Box<dyn PolarityAnalyzer>,
    policy: LabelPolicy,
}

impl SentimentScorer {
    pub fn new(analyzer: Box<dyn PolarityAnalyzer>, policy: LabelPolicy) -> Self {
        Self { analyzer, policy }
    }

    /// Scorer backed by the built-in [`LexiconAnalyzer`].
    pub fn with_lexicon(policy: LabelPolicy) -> Self {
        Self::new(Box::new(LexiconAnalyzer::new()), policy)
    }

    pub fn policy(&self) -> LabelPolicy {
        self.policy
    }

    pub fn score(&self, text: &str) -> Result<Sentiment> {
        let polarity = self.analyzer.polarity(text)?;
        if !polarity.is_finite() {
            bail!("Analyzer returned a non-finite polarity ({})", polarity);
        }
        let score = polarity.clamp(-1.0, 1.0);
        Ok(Sentiment {
            score,
            label: self.policy.label(score),
        })
    }
}
