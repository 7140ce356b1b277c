use super::{PostSource, ScrapedPost};
use crate::document_store::{DocumentStore, Record};
use crate::sentiment::SentimentScorer;
use anyhow::{anyhow, Context, Result};
use chrono::DateTime;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Searches a post source, scores every post and stores it as a record.
pub struct ScrapeJob {
    query: String,
    limit: usize,
    scorer: SentimentScorer,
}

#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub fetched: usize,
    pub inserted: usize,
    /// Posts without a body.
    pub skipped: usize,
    pub failed: usize,
    /// Records that were inserted, in insertion order.
    pub records: Vec<Record>,
}

impl ScrapeJob {
    pub fn new(query: &str, limit: usize, scorer: SentimentScorer) -> Self {
        Self {
            query: query.to_string(),
            limit,
            scorer,
        }
    }

    /// Fails only if the search itself fails; per-post problems are counted.
    pub fn execute(
        &self,
        source: &dyn PostSource,
        store: &dyn DocumentStore,
    ) -> Result<ScrapeReport> {
        let posts = source
            .search(&self.query, self.limit)
            .with_context(|| format!("Search for '{}' failed", self.query))?;

        let mut report = ScrapeReport {
            fetched: posts.len(),
            ..Default::default()
        };
        info!(
            "Scraping {} posts for '{}' into '{}'",
            posts.len(),
            self.query,
            store.collection()
        );

        for post in &posts {
            if post.body.is_empty() {
                debug!("Skipping post without body: {}", post.title);
                report.skipped += 1;
                continue;
            }

            let record = match self.build_record(post) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Could not build record for '{}': {:#}", post.title, e);
                    report.failed += 1;
                    continue;
                }
            };

            match store.insert(&record) {
                Ok(()) => {
                    report.inserted += 1;
                    report.records.push(record);
                }
                Err(e) => {
                    error!("Failed to insert post '{}': {:#}", post.title, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Scrape complete: {} fetched, {} inserted, {} skipped, {} failed",
            report.fetched, report.inserted, report.skipped, report.failed
        );
        Ok(report)
    }

    fn build_record(&self, post: &ScrapedPost) -> Result<Record> {
        let sentiment = self.scorer.score(&post.body)?;
        let created_at = format_created_at(post.created_utc)?;

        let mut fields = Map::new();
        fields.insert("subreddit".to_string(), json!(post.subreddit));
        fields.insert("title".to_string(), json!(post.title));
        fields.insert("text".to_string(), json!(post.body));
        fields.insert("created_at".to_string(), Value::String(created_at));
        fields.insert("sentiment".to_string(), serde_json::to_value(sentiment)?);
        fields.insert("upvotes".to_string(), json!(post.score));
        Ok(Record::with_generated_id(fields))
    }
}

fn format_created_at(created_utc: f64) -> Result<String> {
    DateTime::from_timestamp(created_utc.trunc() as i64, 0)
        .map(|dt| dt.format(CREATED_AT_FORMAT).to_string())
        .ok_or_else(|| anyhow!("created_utc {} is out of range", created_utc))
}
