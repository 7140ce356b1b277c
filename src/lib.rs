//! Mention enrichment library.
//!
//! Cleans, translates and scores the sentiment of social-media mentions kept
//! in a document store, and collects new mentions from Reddit or tweet exports.

pub mod cli;
pub mod cli_style;
pub mod config;
pub mod document_store;
pub mod export;
pub mod normalizer;
pub mod pipeline;
pub mod scraping;
pub mod sentiment;
pub mod sqlite_persistence;
pub mod translation;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use document_store::{DocumentStore, Record, RecordFilter, RunLog, SqliteDocumentStore};
pub use pipeline::{EnrichmentMode, EnrichmentPipeline, RunSummary};
pub use sentiment::{LabelPolicy, SentimentScorer};
pub use translation::{GoogleTranslateClient, PassthroughTranslator, Translator};
