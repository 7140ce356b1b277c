use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI and environment)
    pub store_uri: Option<String>,
    pub db_name: Option<String>,
    pub collection_name: Option<String>,

    // Feature configs
    pub enrichment: Option<EnrichmentConfig>,
    pub translation: Option<TranslationConfig>,
    pub scrape: Option<ScrapeConfig>,
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// "strict-band", "zero-threshold" or "compound-band"
    pub policy: Option<String>,
    /// "full" or "sentiment-only"
    pub mode: Option<String>,
    /// "all", "has-text" or "missing-sentiment"
    pub filter: Option<String>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TranslationConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ScrapeConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
    pub subreddit: Option<String>,
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub policy: Option<String>,
    pub api_base_url: Option<String>,
    pub auth_url: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub path: Option<String>,
    /// "append-sheet" or "timestamped-file"
    pub mode: Option<String>,
    pub sheet_name: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
