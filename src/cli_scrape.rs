use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use mention_enrichment::cli::{exit_code, init_tracing, parse_path};
use mention_enrichment::cli_style::{
    get_styles, print_key_value, print_section_footer, print_section_header, print_success,
    print_warning,
};
use mention_enrichment::config::{AppConfig, CliConfig, FileConfig};
use mention_enrichment::document_store::SqliteDocumentStore;
use mention_enrichment::export::{export_records, ExportMode};
use mention_enrichment::scraping::{import_tweets_csv, RedditClient, ScrapeJob};
use mention_enrichment::sentiment::{LabelPolicy, SentimentScorer};

#[derive(Parser, Debug)]
#[command(name = "mention-scrape", version = env!("APP_VERSION"), styles = get_styles())]
/// Collect mentions into the document store.
struct CliArgs {
    /// Directory holding the SQLite document databases.
    #[clap(long, env = "STORE_URI", value_parser = parse_path, global = true)]
    pub store_uri: Option<PathBuf>,

    /// Database name; the file is `<STORE_URI>/<DB_NAME>.db`.
    #[clap(long, env = "DB_NAME", global = true)]
    pub db_name: Option<String>,

    /// Collection the new records go to.
    #[clap(long, env = "COLLECTION_NAME", global = true)]
    pub collection_name: Option<String>,

    /// TOML config file. Its values override CLI and environment values.
    #[clap(long, value_parser = parse_path, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search Reddit, score every post and store it.
    Reddit(RedditArgs),
    /// Import a tweet export (CSV) without scoring it.
    ImportCsv {
        #[clap(value_parser = parse_path)]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RedditArgs {
    #[clap(long, env = "REDDIT_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    #[clap(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    #[clap(long, env = "REDDIT_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Subreddit to search, `all` for every subreddit.
    #[clap(long)]
    pub subreddit: Option<String>,

    /// Search query.
    #[clap(long)]
    pub query: Option<String>,

    /// Maximum number of posts to fetch.
    #[clap(long)]
    pub limit: Option<usize>,

    /// How polarity maps to a label.
    #[clap(long, value_enum)]
    pub policy: Option<LabelPolicy>,

    /// Also write the stored posts to a spreadsheet.
    #[clap(long)]
    pub export: bool,

    #[clap(long, value_parser = parse_path)]
    pub export_path: Option<PathBuf>,

    #[clap(long, value_enum)]
    pub export_mode: Option<ExportMode>,

    #[clap(long)]
    pub sheet_name: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        let base = CliConfig {
            store_uri: self.store_uri.clone(),
            db_name: self.db_name.clone(),
            collection_name: self.collection_name.clone(),
            ..Default::default()
        };
        match &self.command {
            Command::Reddit(args) => CliConfig {
                reddit_client_id: args.client_id.clone(),
                reddit_client_secret: args.client_secret.clone(),
                reddit_user_agent: args.user_agent.clone(),
                subreddit: args.subreddit.clone(),
                query: args.query.clone(),
                limit: args.limit,
                scrape_policy: args.policy,
                export_path: args.export_path.clone(),
                export_mode: args.export_mode,
                sheet_name: args.sheet_name.clone(),
                ..base
            },
            Command::ImportCsv { .. } => base,
        }
    }
}

fn scrape_reddit(config: &AppConfig, store: &SqliteDocumentStore, export: bool) -> Result<()> {
    let client = RedditClient::connect(&config.scrape)?;
    let scorer = SentimentScorer::with_lexicon(config.scrape.policy);
    let job = ScrapeJob::new(&config.scrape.query, config.scrape.limit, scorer);
    let report = job.execute(&client, store)?;

    print_section_header("Reddit Scrape");
    print_key_value("Query", &config.scrape.query);
    print_key_value("Subreddit", &config.scrape.subreddit);
    print_key_value("Fetched", &report.fetched.to_string());
    print_key_value("Inserted", &report.inserted.to_string());
    print_key_value("Skipped (no body)", &report.skipped.to_string());
    print_key_value("Failed", &report.failed.to_string());
    print_section_footer();

    if export {
        if report.records.is_empty() {
            print_warning("Nothing to export");
        } else {
            let outcome = export_records(&report.records, &config.export)?;
            print_success(&format!(
                "Exported {} rows to {} (sheet '{}')",
                outcome.rows,
                outcome.path.display(),
                outcome.sheet_name
            ));
        }
    }

    if report.failed > 0 {
        print_warning(&format!("{} posts could not be stored", report.failed));
    } else {
        print_success(&format!("Stored {} posts", report.inserted));
    }
    Ok(())
}

fn import_csv(path: &Path, store: &SqliteDocumentStore) -> Result<()> {
    let report = import_tweets_csv(path, store)?;
    if report.failed > 0 {
        print_warning(&format!(
            "Imported {} of {} rows, {} failed",
            report.inserted, report.rows, report.failed
        ));
    } else {
        print_success(&format!("Imported {} rows", report.inserted));
    }
    Ok(())
}

fn run(cli_args: CliArgs) -> Result<()> {
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    if let Command::Reddit(_) = &cli_args.command {
        config.scrape.credentials()?;
    }

    let db_path = config.db_path();
    info!(
        "Opening document store at {:?}, collection '{}'",
        db_path, config.collection_name
    );
    let store = SqliteDocumentStore::open(&db_path, &config.collection_name)?;

    match &cli_args.command {
        Command::Reddit(args) => scrape_reddit(&config, &store, args.export)?,
        Command::ImportCsv { path } => import_csv(path, &store)?,
    }

    store.close()
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli_args = CliArgs::parse();
    exit_code(init_tracing().and_then(|()| run(cli_args)))
}
