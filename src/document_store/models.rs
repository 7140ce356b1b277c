//! Data models for the document store.

use crate::sentiment::Sentiment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document in a collection: an opaque id plus a JSON object of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// What a record's `text` field looks like, as seen by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextField<'a> {
    Missing,
    NotAString,
    Blank,
    Present(&'a str),
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// New record with a random UUID v4 id.
    pub fn with_generated_id(fields: Map<String, Value>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), fields)
    }

    pub fn text_field(&self) -> TextField<'_> {
        match self.fields.get("text") {
            None | Some(Value::Null) => TextField::Missing,
            Some(Value::String(s)) if s.trim().is_empty() => TextField::Blank,
            Some(Value::String(s)) => TextField::Present(s),
            Some(_) => TextField::NotAString,
        }
    }

    /// The stored sentiment, if present and well-formed.
    pub fn sentiment(&self) -> Option<Sentiment> {
        self.fields
            .get("sentiment")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The record as one JSON object, `id` first.
    pub fn to_document(&self) -> Value {
        let mut document = Map::with_capacity(self.fields.len() + 1);
        document.insert("id".to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.fields {
            if key != "id" {
                document.insert(key.clone(), value.clone());
            }
        }
        Value::Object(document)
    }
}

/// A record together with its storage position, used as a pagination key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub rowid: i64,
    pub record: Record,
}

/// Which documents a read selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordFilter {
    #[default]
    All,
    /// Documents whose `text` field is present and non-null.
    HasText,
    /// Documents without a `sentiment` field.
    MissingSentiment,
}

impl RecordFilter {
    pub(crate) fn sql_clause(&self) -> &'static str {
        match self {
            RecordFilter::All => "1 = 1",
            RecordFilter::HasText => {
                "json_type(body, '$.text') IS NOT NULL AND json_type(body, '$.text') != 'null'"
            }
            RecordFilter::MissingSentiment => "json_type(body, '$.sentiment') IS NULL",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordFilter::All => "all",
            RecordFilter::HasText => "has-text",
            RecordFilter::MissingSentiment => "missing-sentiment",
        }
    }
}

/// A set of top-level field assignments applied atomically to one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    assignments: Map<String, Value>,
}

impl FieldUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.assignments.insert(field.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.assignments.iter()
    }

    pub(crate) fn apply_to(&self, fields: &mut Map<String, Value>) {
        for (key, value) in &self.assignments {
            fields.insert(key.clone(), value.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// No document with that id exists any more; nothing was written.
    NotFound,
}

/// Summary statistics for one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_records: usize,
    pub with_text: usize,
    pub with_sentiment: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// A persisted pipeline run, as read back from the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub collection: String,
    pub mode: String,
    pub policy: String,
    pub fetched: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub vanished: usize,
    pub translation_fallbacks: usize,
    pub started_at: i64,
    pub finished_at: i64,
}
