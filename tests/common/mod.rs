//! Shared fixtures for the end-to-end tests.
//!
//! Tests import from here only. Stores live in a `TempDir` that must outlive them.

#![allow(dead_code)]

use anyhow::Result;
use mention_enrichment::document_store::{Record, SqliteDocumentStore};
use mention_enrichment::scraping::{PostSource, ScrapedPost};
use mention_enrichment::sentiment::PolarityAnalyzer;
use mention_enrichment::translation::{TranslationError, Translator};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

pub const DB_NAME: &str = "Reddit";
pub const COLLECTION: &str = "reddit";

pub fn create_test_store() -> (SqliteDocumentStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteDocumentStore::open(db_path(&temp_dir), COLLECTION).unwrap();
    (store, temp_dir)
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join(format!("{}.db", DB_NAME))
}

pub fn record(id: &str, fields: Value) -> Record {
    let fields: Map<String, Value> = fields.as_object().cloned().unwrap_or_default();
    Record::new(id, fields)
}

/// Always returns the same polarity.
pub struct FixedAnalyzer(pub f64);

impl PolarityAnalyzer for FixedAnalyzer {
    fn polarity(&self, _text: &str) -> Result<f64> {
        Ok(self.0)
    }
}

/// Translates known phrases, times out on anything else.
pub struct PhrasebookTranslator {
    phrases: HashMap<&'static str, &'static str>,
}

impl PhrasebookTranslator {
    pub fn new(phrases: &[(&'static str, &'static str)]) -> Self {
        Self {
            phrases: phrases.iter().copied().collect(),
        }
    }
}

impl Translator for PhrasebookTranslator {
    fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, TranslationError> {
        self.phrases
            .get(text)
            .map(|t| t.to_string())
            .ok_or(TranslationError::Timeout)
    }
}

/// Serves a fixed list of posts.
pub struct CannedSource {
    pub posts: Vec<ScrapedPost>,
}

impl PostSource for CannedSource {
    fn search(&self, _query: &str, limit: usize) -> Result<Vec<ScrapedPost>> {
        Ok(self.posts.iter().take(limit).cloned().collect())
    }
}

/// `count` posts, every fifth one without a body.
pub fn canned_posts(count: usize) -> Vec<ScrapedPost> {
    (0..count)
        .map(|i| ScrapedPost {
            body: if i % 5 == 0 {
                String::new()
            } else {
                format!("Order {} arrived hot and the delivery guy was polite", i)
            },
            subreddit: "zomato".to_string(),
            title: format!("Review {}", i),
            created_utc: 1_700_000_000.0 + (i * 60) as f64,
            score: (i % 17) as i64,
        })
        .collect()
}
