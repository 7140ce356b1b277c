mod file_config;

pub use file_config::{
    EnrichmentConfig, ExportConfig, FileConfig, ScrapeConfig, TranslationConfig,
};

use crate::document_store::{RecordFilter, DEFAULT_PAGE_SIZE};
use crate::export::ExportMode;
use crate::pipeline::EnrichmentMode;
use crate::sentiment::LabelPolicy;
use crate::translation::DEFAULT_BASE_URL;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// Every field is optional so that the TOML file and the defaults can fill the gaps.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub store_uri: Option<PathBuf>,
    pub db_name: Option<String>,
    pub collection_name: Option<String>,

    pub policy: Option<LabelPolicy>,
    pub mode: Option<EnrichmentMode>,
    pub filter: Option<RecordFilter>,
    pub page_size: Option<usize>,

    pub no_translate: bool,
    pub translate_url: Option<String>,
    pub translate_timeout_secs: Option<u64>,

    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: Option<String>,
    pub subreddit: Option<String>,
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub scrape_policy: Option<LabelPolicy>,

    pub export_path: Option<PathBuf>,
    pub export_mode: Option<ExportMode>,
    pub sheet_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub store_uri: PathBuf,
    pub db_name: String,
    pub collection_name: String,

    // Feature configs (with defaults)
    pub enrichment: EnrichmentSettings,
    pub translation: TranslationSettings,
    pub scrape: ScrapeSettings,
    pub export: ExportSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let store_uri = file
            .store_uri
            .map(PathBuf::from)
            .or_else(|| cli.store_uri.clone());
        let db_name = file
            .db_name
            .or_else(|| cli.db_name.clone())
            .filter(|s| !s.is_empty());
        let collection_name = file
            .collection_name
            .or_else(|| cli.collection_name.clone())
            .filter(|s| !s.is_empty());

        let (Some(store_uri), Some(db_name), Some(collection_name)) =
            (store_uri, db_name, collection_name)
        else {
            bail!("Missing STORE_URI, DB_NAME, or COLLECTION_NAME");
        };

        if !store_uri.exists() {
            bail!("Store directory does not exist: {:?}", store_uri);
        }
        if !store_uri.is_dir() {
            bail!("STORE_URI is not a directory: {:?}", store_uri);
        }

        let en_file = file.enrichment.unwrap_or_default();
        let enrichment = EnrichmentSettings {
            policy: parse_option(en_file.policy.as_deref(), "enrichment.policy")?
                .or(cli.policy)
                .unwrap_or_default(),
            mode: parse_option(en_file.mode.as_deref(), "enrichment.mode")?
                .or(cli.mode)
                .unwrap_or_default(),
            filter: parse_option(en_file.filter.as_deref(), "enrichment.filter")?.or(cli.filter),
            page_size: en_file
                .page_size
                .or(cli.page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        };
        if enrichment.page_size == 0 {
            bail!("enrichment.page_size must be greater than 0");
        }

        let tr_file = file.translation.unwrap_or_default();
        let tr_default = TranslationSettings::default();
        let translation = TranslationSettings {
            enabled: tr_file.enabled.unwrap_or(!cli.no_translate),
            base_url: tr_file
                .base_url
                .or_else(|| cli.translate_url.clone())
                .unwrap_or(tr_default.base_url),
            timeout_secs: tr_file
                .timeout_secs
                .or(cli.translate_timeout_secs)
                .unwrap_or(tr_default.timeout_secs),
            max_retries: tr_file.max_retries.unwrap_or(tr_default.max_retries),
            initial_backoff_ms: tr_file
                .initial_backoff_ms
                .unwrap_or(tr_default.initial_backoff_ms),
            max_backoff_ms: tr_file.max_backoff_ms.unwrap_or(tr_default.max_backoff_ms),
            backoff_multiplier: tr_file
                .backoff_multiplier
                .unwrap_or(tr_default.backoff_multiplier),
        };
        if translation.timeout_secs == 0 {
            bail!("translation.timeout_secs must be greater than 0");
        }

        let sc_file = file.scrape.unwrap_or_default();
        let sc_default = ScrapeSettings::default();
        let scrape = ScrapeSettings {
            client_id: sc_file.client_id.or_else(|| cli.reddit_client_id.clone()),
            client_secret: sc_file
                .client_secret
                .or_else(|| cli.reddit_client_secret.clone()),
            user_agent: sc_file.user_agent.or_else(|| cli.reddit_user_agent.clone()),
            subreddit: sc_file
                .subreddit
                .or_else(|| cli.subreddit.clone())
                .unwrap_or(sc_default.subreddit),
            query: sc_file
                .query
                .or_else(|| cli.query.clone())
                .unwrap_or(sc_default.query),
            limit: sc_file.limit.or(cli.limit).unwrap_or(sc_default.limit),
            policy: parse_option(sc_file.policy.as_deref(), "scrape.policy")?
                .or(cli.scrape_policy)
                .unwrap_or(sc_default.policy),
            api_base_url: sc_file.api_base_url.unwrap_or(sc_default.api_base_url),
            auth_url: sc_file.auth_url.unwrap_or(sc_default.auth_url),
        };

        let ex_file = file.export.unwrap_or_default();
        let ex_default = ExportSettings::default();
        let export = ExportSettings {
            path: ex_file
                .path
                .map(PathBuf::from)
                .or_else(|| cli.export_path.clone())
                .unwrap_or(ex_default.path),
            mode: parse_option(ex_file.mode.as_deref(), "export.mode")?
                .or(cli.export_mode)
                .unwrap_or(ex_default.mode),
            sheet_name: ex_file
                .sheet_name
                .or_else(|| cli.sheet_name.clone())
                .unwrap_or(ex_default.sheet_name),
        };

        Ok(Self {
            store_uri,
            db_name,
            collection_name,
            enrichment,
            translation,
            scrape,
            export,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.store_uri.join(format!("{}.db", self.db_name))
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub policy: LabelPolicy,
    pub mode: EnrichmentMode,
    /// When unset, the mode's default filter is used.
    pub filter: Option<RecordFilter>,
    pub page_size: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            policy: LabelPolicy::StrictBand,
            mode: EnrichmentMode::Full,
            filter: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslationSettings {
    /// false means text is scored as is, without calling the translation service.
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
    pub subreddit: String,
    pub query: String,
    pub limit: usize,
    pub policy: LabelPolicy,
    pub api_base_url: String,
    pub auth_url: String,
}

/// Borrowed Reddit app credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedditCredentials<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub user_agent: &'a str,
}

impl ScrapeSettings {
    /// Fails unless client id, secret and user agent are all set and non-empty.
    pub fn credentials(&self) -> Result<RedditCredentials<'_>> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|s| !s.trim().is_empty())
        }
        match (
            present(&self.client_id),
            present(&self.client_secret),
            present(&self.user_agent),
        ) {
            (Some(client_id), Some(client_secret), Some(user_agent)) => Ok(RedditCredentials {
                client_id,
                client_secret,
                user_agent,
            }),
            _ => bail!("Missing REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET, or REDDIT_USER_AGENT"),
        }
    }
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: None,
            subreddit: "all".to_string(),
            query: "zomato review".to_string(),
            limit: 200,
            policy: LabelPolicy::ZeroThreshold,
            api_base_url: "https://oauth.reddit.com".to_string(),
            auth_url: "https://www.reddit.com/api/v1/access_token".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub path: PathBuf,
    pub mode: ExportMode,
    pub sheet_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("zomato_reddit_reviews.xlsx"),
            mode: ExportMode::AppendSheet,
            sheet_name: "Reddit_Reviews_200".to_string(),
        }
    }
}

/// Parses an optional config string with clap's ValueEnum, naming the key on failure.
fn parse_option<T: ValueEnum>(value: Option<&str>, key: &str) -> Result<Option<T>> {
    value
        .map(|s| T::from_str(s, true).map_err(|_| anyhow!("Invalid value '{}' for {}", s, key)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_temp_store_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn base_cli(dir: &TempDir) -> CliConfig {
        CliConfig {
            store_uri: Some(dir.path().to_path_buf()),
            db_name: Some("Reddit".to_string()),
            collection_name: Some("reddit".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_option() {
        assert_eq!(
            parse_option::<LabelPolicy>(Some("zero-threshold"), "p").unwrap(),
            Some(LabelPolicy::ZeroThreshold)
        );
        // Case insensitive
        assert_eq!(
            parse_option::<EnrichmentMode>(Some("SENTIMENT-ONLY"), "m").unwrap(),
            Some(EnrichmentMode::SentimentOnly)
        );
        assert_eq!(parse_option::<LabelPolicy>(None, "p").unwrap(), None);
        let err = parse_option::<LabelPolicy>(Some("vibes"), "enrichment.policy").unwrap_err();
        assert!(err.to_string().contains("enrichment.policy"));
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = make_temp_store_dir();
        let cli = CliConfig {
            policy: Some(LabelPolicy::CompoundBand),
            mode: Some(EnrichmentMode::SentimentOnly),
            page_size: Some(25),
            no_translate: true,
            query: Some("swiggy review".to_string()),
            export_mode: Some(ExportMode::TimestampedFile),
            ..base_cli(&temp_dir)
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.store_uri, temp_dir.path());
        assert_eq!(config.db_name, "Reddit");
        assert_eq!(config.collection_name, "reddit");
        assert_eq!(config.enrichment.policy, LabelPolicy::CompoundBand);
        assert_eq!(config.enrichment.mode, EnrichmentMode::SentimentOnly);
        assert_eq!(config.enrichment.page_size, 25);
        assert!(!config.translation.enabled);
        assert_eq!(config.scrape.query, "swiggy review");
        assert_eq!(config.export.mode, ExportMode::TimestampedFile);
    }

    #[test]
    fn test_resolve_defaults() {
        let temp_dir = make_temp_store_dir();
        let config = AppConfig::resolve(&base_cli(&temp_dir), None).unwrap();

        assert_eq!(config.enrichment.policy, LabelPolicy::StrictBand);
        assert_eq!(config.enrichment.mode, EnrichmentMode::Full);
        assert!(config.enrichment.filter.is_none());
        assert!(config.translation.enabled);
        assert_eq!(config.translation.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.scrape.policy, LabelPolicy::ZeroThreshold);
        assert_eq!(config.scrape.limit, 200);
        assert_eq!(config.export.mode, ExportMode::AppendSheet);
        assert_eq!(config.export.sheet_name, "Reddit_Reviews_200");
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = make_temp_store_dir();
        let cli = CliConfig {
            store_uri: Some(PathBuf::from("/should/be/overridden")),
            policy: Some(LabelPolicy::StrictBand),
            page_size: Some(10),
            translate_timeout_secs: Some(30),
            ..base_cli(&temp_dir)
        };

        let file_config = FileConfig {
            store_uri: Some(temp_dir.path().to_string_lossy().to_string()),
            collection_name: Some("posts".to_string()),
            enrichment: Some(EnrichmentConfig {
                policy: Some("zero-threshold".to_string()),
                ..Default::default()
            }),
            translation: Some(TranslationConfig {
                enabled: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.store_uri, temp_dir.path());
        assert_eq!(config.collection_name, "posts");
        assert_eq!(config.enrichment.policy, LabelPolicy::ZeroThreshold);
        assert!(!config.translation.enabled);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.db_name, "Reddit");
        assert_eq!(config.enrichment.page_size, 10);
        assert_eq!(config.translation.timeout_secs, 30);
    }

    #[test]
    fn test_resolve_missing_required_settings() {
        let temp_dir = make_temp_store_dir();
        for cli in [
            CliConfig::default(),
            CliConfig {
                db_name: None,
                ..base_cli(&temp_dir)
            },
            CliConfig {
                collection_name: Some(String::new()),
                ..base_cli(&temp_dir)
            },
        ] {
            let err = AppConfig::resolve(&cli, None).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Missing STORE_URI, DB_NAME, or COLLECTION_NAME"
            );
        }
    }

    #[test]
    fn test_resolve_nonexistent_store_dir_error() {
        let cli = CliConfig {
            store_uri: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            db_name: Some("db".to_string()),
            collection_name: Some("c".to_string()),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_store_uri_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            store_uri: Some(temp_file.path().to_path_buf()),
            db_name: Some("db".to_string()),
            collection_name: Some("c".to_string()),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_resolve_rejects_invalid_enum_in_toml() {
        let temp_dir = make_temp_store_dir();
        let file_config = FileConfig {
            export: Some(ExportConfig {
                mode: Some("overwrite".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&base_cli(&temp_dir), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("export.mode"));
    }

    #[test]
    fn test_resolve_rejects_zero_page_size() {
        let temp_dir = make_temp_store_dir();
        let cli = CliConfig {
            page_size: Some(0),
            ..base_cli(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_reddit_credentials_required() {
        let temp_dir = make_temp_store_dir();
        let cli = CliConfig {
            reddit_client_id: Some("id".to_string()),
            reddit_user_agent: Some("mention-enrichment/0.1".to_string()),
            ..base_cli(&temp_dir)
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        let err = config.scrape.credentials().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET, or REDDIT_USER_AGENT"
        );

        // Blank values count as missing.
        let blank = CliConfig {
            reddit_client_secret: Some("  ".to_string()),
            ..cli.clone()
        };
        let config = AppConfig::resolve(&blank, None).unwrap();
        assert!(config.scrape.credentials().is_err());

        // Resolving and checking credentials never touches the store.
        assert!(!config.db_path().exists());

        let complete = CliConfig {
            reddit_client_secret: Some("secret".to_string()),
            ..cli
        };
        let config = AppConfig::resolve(&complete, None).unwrap();
        let creds = config.scrape.credentials().unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret, "secret");
        assert_eq!(creds.user_agent, "mention-enrichment/0.1");
    }

    #[test]
    fn test_db_path_helper() {
        let temp_dir = make_temp_store_dir();
        let config = AppConfig::resolve(&base_cli(&temp_dir), None).unwrap();
        assert_eq!(config.db_path(), temp_dir.path().join("Reddit.db"));
    }
}
