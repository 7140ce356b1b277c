//! Import of tweet exports (CSV) into the document store.
//!
//! Imported records carry no `sentiment`, so a later `sentiment-only` run
//! with the `missing-sentiment` filter scores them.

use crate::document_store::{DocumentStore, Record};
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map};
use std::path::Path;
use tracing::{error, info, warn};

lazy_static! {
    static ref HASHTAG: Regex = Regex::new(r"#(\w+)").expect("hashtag pattern is valid");
}

#[derive(Debug, Deserialize)]
struct TweetRow {
    #[serde(rename = "Text Content")]
    text: String,
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "Reply Count", default)]
    reply_count: String,
    #[serde(rename = "Like Count", default)]
    like_count: String,
    #[serde(rename = "Tweet by", default)]
    tweet_by: String,
    #[serde(rename = "Profile User Name", default)]
    profile_user_name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub rows: usize,
    pub inserted: usize,
    pub failed: usize,
}

/// Leading integer of a count cell; thousands separators are ignored and
/// anything unparseable counts as zero.
fn parse_count(cell: &str) -> u64 {
    let digits: String = cell
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

impl TweetRow {
    fn into_record(self) -> Record {
        let hashtags = extract_hashtags(&self.text);
        let engagement = parse_count(&self.reply_count) + parse_count(&self.like_count);
        let location = if self.tweet_by.is_empty() {
            self.profile_user_name
        } else {
            self.tweet_by
        };

        let mut fields = Map::new();
        fields.insert("text".to_string(), json!(self.text));
        fields.insert("created_at".to_string(), json!(self.date));
        fields.insert("hashtags".to_string(), json!(hashtags));
        fields.insert("engagement".to_string(), json!(engagement));
        fields.insert("location".to_string(), json!(location));
        Record::with_generated_id(fields)
    }
}

/// Reads a tweet export and inserts one record per row.
///
/// Fails only if the file cannot be opened or has no header row; bad rows and
/// failed inserts are logged and counted.
pub fn import_tweets_csv(path: &Path, store: &dyn DocumentStore) -> Result<ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {:?}", path))?;
    reader
        .headers()
        .with_context(|| format!("Failed to read CSV header of {:?}", path))?;

    let mut report = ImportReport::default();
    for (index, row) in reader.deserialize::<TweetRow>().enumerate() {
        report.rows += 1;
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping CSV line {}: {}", line, e);
                report.failed += 1;
                continue;
            }
        };

        let record = row.into_record();
        match store.insert(&record) {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                error!("Failed to save tweet from line {}: {:#}", line, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Imported {} of {} tweets from {:?} ({} failed)",
        report.inserted, report.rows, path, report.failed
    );
    Ok(report)
}
