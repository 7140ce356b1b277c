use super::{
    EnrichmentMode, PipelineError, RecordError, RecordOutcome, RunSummary, SkipReason,
};
use crate::config::EnrichmentSettings;
use crate::document_store::{
    DocumentStore, FieldUpdate, Record, RecordCursor, RecordFilter, TextField, UpdateOutcome,
};
use crate::normalizer::clean_text;
use crate::sentiment::{Sentiment, SentimentScorer};
use crate::translation::{translate_to_english, Translator};
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub struct EnrichmentPipeline {
    mode: EnrichmentMode,
    filter: RecordFilter,
    page_size: usize,
    translator: Box<dyn Translator>,
    scorer: SentimentScorer,
}

/// Fields to write for one record, plus whether translation fell back.
struct Enriched {
    update: FieldUpdate,
    sentiment: Sentiment,
    translation_fell_back: bool,
}

impl EnrichmentPipeline {
    pub fn new(
        settings: &EnrichmentSettings,
        translator: Box<dyn Translator>,
        scorer: SentimentScorer,
    ) -> Self {
        Self {
            mode: settings.mode,
            filter: settings.filter.unwrap_or_else(|| settings.mode.default_filter()),
            page_size: settings.page_size,
            translator,
            scorer,
        }
    }

    /// Filter the run selects records with.
    pub fn filter(&self) -> RecordFilter {
        self.filter
    }

    pub fn execute(&self, store: &dyn DocumentStore) -> Result<RunSummary, PipelineError> {
        self.execute_with_observer(store, &mut |_: &RecordOutcome| {})
    }

    /// Runs the pipeline over every matching record, reporting each outcome to `observer`.
    pub fn execute_with_observer(
        &self,
        store: &dyn DocumentStore,
        observer: &mut dyn FnMut(&RecordOutcome),
    ) -> Result<RunSummary, PipelineError> {
        let mut summary =
            RunSummary::new(self.mode, self.scorer.policy(), chrono::Utc::now().timestamp());

        info!(
            "Starting {} enrichment of '{}' (policy {}, filter {})",
            self.mode,
            store.collection(),
            self.scorer.policy(),
            self.filter.as_str()
        );

        for next in RecordCursor::new(store, self.filter, self.page_size) {
            let record = match next {
                Ok(record) => record,
                Err(source) => {
                    error!(
                        "Aborting run after {} records: {}",
                        summary.fetched, source
                    );
                    return Err(PipelineError::StoreRead {
                        processed: summary.fetched,
                        source,
                    });
                }
            };

            let outcome = self.process_record(store, &record);
            match &outcome {
                RecordOutcome::Updated { id, sentiment, .. } => {
                    debug!("Updated {} ({} {:.3})", id, sentiment.label, sentiment.score)
                }
                RecordOutcome::Skipped { id, reason } => warn!("Skipped {}: {}", id, reason),
                RecordOutcome::Failed { id, error } => error!("Failed {}: {}", id, error),
                RecordOutcome::Vanished { id } => {
                    warn!("Record {} disappeared before it could be written", id)
                }
            }
            summary.record(&outcome);
            observer(&outcome);
        }

        summary.finished_at = chrono::Utc::now().timestamp();
        info!("{}", summary);
        Ok(summary)
    }

    fn process_record(&self, store: &dyn DocumentStore, record: &Record) -> RecordOutcome {
        let id = record.id.clone();
        let text = match record.text_field() {
            TextField::Present(text) => text,
            TextField::Missing => return skipped(id, SkipReason::MissingText),
            TextField::NotAString => return skipped(id, SkipReason::TextNotAString),
            TextField::Blank => return skipped(id, SkipReason::BlankText),
        };

        let enriched = match self.mode {
            EnrichmentMode::Full => {
                let cleaned = clean_text(text);
                if cleaned.is_empty() {
                    return skipped(id, SkipReason::EmptyAfterCleaning);
                }
                let translation = translate_to_english(self.translator.as_ref(), &cleaned);
                self.score(&translation.text).map(|(sentiment, value)| Enriched {
                    update: FieldUpdate::new()
                        .set("text", Value::String(translation.text.clone()))
                        .set("sentiment", value),
                    sentiment,
                    translation_fell_back: translation.fell_back,
                })
            }
            EnrichmentMode::SentimentOnly => {
                self.score(text).map(|(sentiment, value)| Enriched {
                    update: FieldUpdate::new().set("sentiment", value),
                    sentiment,
                    translation_fell_back: false,
                })
            }
        };

        let enriched = match enriched {
            Ok(enriched) => enriched,
            Err(error) => return RecordOutcome::Failed { id, error },
        };

        match store.update_fields(&id, &enriched.update) {
            Ok(UpdateOutcome::Updated) => RecordOutcome::Updated {
                id,
                sentiment: enriched.sentiment,
                translation_fell_back: enriched.translation_fell_back,
            },
            Ok(UpdateOutcome::NotFound) => RecordOutcome::Vanished { id },
            Err(e) => RecordOutcome::Failed {
                id,
                error: RecordError::Write(format!("{:#}", e)),
            },
        }
    }

    fn score(&self, text: &str) -> Result<(Sentiment, Value), RecordError> {
        let sentiment = self
            .scorer
            .score(text)
            .map_err(|e| RecordError::Scoring(format!("{:#}", e)))?;
        let value =
            serde_json::to_value(sentiment).map_err(|e| RecordError::Scoring(e.to_string()))?;
        Ok((sentiment, value))
    }
}

fn skipped(id: String, reason: SkipReason) -> RecordOutcome {
    RecordOutcome::Skipped { id, reason }
}
