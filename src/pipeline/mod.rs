//! Enrichment pipeline.
//!
//! ```text
//! DocumentStore (cursor) → normalizer → translator → sentiment scorer → DocumentStore ($set)
//! ```
//!
//! Each record ends in exactly one [`RecordOutcome`]; the run as a whole ends
//! in a [`RunSummary`] or, if the store cannot be read, a [`PipelineError`].

mod dates;
mod enrichment;

pub use dates::{reformat_created_at, reformat_dates, DateReformatReport, DAY_FORMAT};
pub use enrichment::EnrichmentPipeline;

use crate::document_store::RecordFilter;
use crate::sentiment::{LabelPolicy, Sentiment};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnrichmentMode {
    /// Clean, translate and score `text`; write back both `text` and `sentiment`.
    #[default]
    Full,
    /// Score the stored `text` as is and write only `sentiment`.
    SentimentOnly,
}

impl EnrichmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentMode::Full => "full",
            EnrichmentMode::SentimentOnly => "sentiment-only",
        }
    }

    /// Records a run visits when no filter is configured.
    pub fn default_filter(&self) -> RecordFilter {
        match self {
            EnrichmentMode::Full => RecordFilter::HasText,
            EnrichmentMode::SentimentOnly => RecordFilter::MissingSentiment,
        }
    }
}

impl fmt::Display for EnrichmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingText,
    TextNotAString,
    BlankText,
    EmptyAfterCleaning,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::MissingText => "no text field",
            SkipReason::TextNotAString => "text is not a string",
            SkipReason::BlankText => "text is blank",
            SkipReason::EmptyAfterCleaning => "nothing left after cleaning",
        })
    }
}

/// Why a single record could not be enriched. The run continues regardless.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Sentiment scoring failed: {0}")]
    Scoring(String),

    #[error("Write failed: {0}")]
    Write(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Updated {
        id: String,
        sentiment: Sentiment,
        translation_fell_back: bool,
    },
    Skipped {
        id: String,
        reason: SkipReason,
    },
    Failed {
        id: String,
        error: RecordError,
    },
    /// The record was deleted between being read and being written.
    Vanished {
        id: String,
    },
}

impl RecordOutcome {
    pub fn id(&self) -> &str {
        match self {
            RecordOutcome::Updated { id, .. }
            | RecordOutcome::Skipped { id, .. }
            | RecordOutcome::Failed { id, .. }
            | RecordOutcome::Vanished { id } => id,
        }
    }
}

/// Fatal errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read from the document store after {processed} records: {source}")]
    StoreRead {
        processed: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: EnrichmentMode,
    pub policy: LabelPolicy,
    pub fetched: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub vanished: usize,
    pub translation_fallbacks: usize,
    /// Unix timestamps, seconds.
    pub started_at: i64,
    pub finished_at: i64,
}

impl RunSummary {
    pub fn new(mode: EnrichmentMode, policy: LabelPolicy, started_at: i64) -> Self {
        Self {
            mode,
            policy,
            fetched: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            vanished: 0,
            translation_fallbacks: 0,
            started_at,
            finished_at: started_at,
        }
    }

    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.fetched += 1;
        match outcome {
            RecordOutcome::Updated {
                translation_fell_back,
                ..
            } => {
                self.updated += 1;
                if *translation_fell_back {
                    self.translation_fallbacks += 1;
                }
            }
            RecordOutcome::Skipped { .. } => self.skipped += 1,
            RecordOutcome::Failed { .. } => self.failed += 1,
            RecordOutcome::Vanished { .. } => self.vanished += 1,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} records: {} updated, {} skipped, {} failed, {} vanished ({} translation fallbacks)",
            self.fetched,
            self.updated,
            self.skipped,
            self.failed,
            self.vanished,
            self.translation_fallbacks
        )
    }
}
