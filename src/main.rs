use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use mention_enrichment::cli::{exit_code, init_tracing, parse_path};
use mention_enrichment::cli_style::{
    get_styles, print_empty_list, print_run_summary, print_store_stats, print_success,
    print_warning, record_list_table, run_history_table,
};
use mention_enrichment::config::{AppConfig, CliConfig, FileConfig};
use mention_enrichment::document_store::{
    DocumentStore, Record, RecordCursor, RecordFilter, RunLog, SqliteDocumentStore,
    DEFAULT_PAGE_SIZE,
};
use mention_enrichment::pipeline::{
    reformat_dates, EnrichmentMode, EnrichmentPipeline, RecordOutcome,
};
use mention_enrichment::sentiment::{LabelPolicy, SentimentScorer};
use mention_enrichment::translation::{GoogleTranslateClient, PassthroughTranslator, Translator};

#[derive(Parser, Debug)]
#[command(name = "mention-enrich", version = env!("APP_VERSION"), styles = get_styles())]
/// Clean, translate and score the sentiment of stored mentions.
struct CliArgs {
    /// Directory holding the SQLite document databases.
    #[clap(long, env = "STORE_URI", value_parser = parse_path, global = true)]
    pub store_uri: Option<PathBuf>,

    /// Database name; the file is `<STORE_URI>/<DB_NAME>.db`.
    #[clap(long, env = "DB_NAME", global = true)]
    pub db_name: Option<String>,

    /// Collection of records to work on.
    #[clap(long, env = "COLLECTION_NAME", global = true)]
    pub collection_name: Option<String>,

    /// TOML config file. Its values override CLI and environment values.
    #[clap(long, value_parser = parse_path, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enrich every matching record (default).
    Run(RunArgs),
    /// Show recent pipeline runs.
    History {
        #[clap(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show record and sentiment counts for the collection.
    Stats,
    /// List records in storage order.
    List {
        #[clap(long, default_value_t = 20)]
        limit: usize,

        #[clap(long, value_enum, default_value_t = RecordFilter::All)]
        filter: RecordFilter,

        /// Print one JSON document per line instead of a table.
        #[clap(long)]
        json: bool,
    },
    /// Print one record as JSON.
    Show { id: String },
    /// Rewrite every `created_at` as a `dd-mm-yyyy` day.
    ReformatDates,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// How polarity maps to a label.
    #[clap(long, value_enum)]
    pub policy: Option<LabelPolicy>,

    /// `full` cleans, translates and scores; `sentiment-only` only scores.
    #[clap(long, value_enum)]
    pub mode: Option<EnrichmentMode>,

    /// Records to select. Defaults to `has-text` for full runs and
    /// `missing-sentiment` for sentiment-only runs.
    #[clap(long, value_enum)]
    pub filter: Option<RecordFilter>,

    /// Records fetched per store read.
    #[clap(long)]
    pub page_size: Option<usize>,

    /// Score text without translating it first.
    #[clap(long)]
    pub no_translate: bool,

    /// Base URL of the translation endpoint.
    #[clap(long)]
    pub translate_url: Option<String>,

    /// Timeout in seconds for each translation request.
    #[clap(long)]
    pub translate_timeout_secs: Option<u64>,

    /// Show a progress bar.
    #[clap(long)]
    pub progress: bool,
}

impl CliArgs {
    fn to_cli_config(&self, run: &RunArgs) -> CliConfig {
        CliConfig {
            store_uri: self.store_uri.clone(),
            db_name: self.db_name.clone(),
            collection_name: self.collection_name.clone(),
            policy: run.policy,
            mode: run.mode,
            filter: run.filter,
            page_size: run.page_size,
            no_translate: run.no_translate,
            translate_url: run.translate_url.clone(),
            translate_timeout_secs: run.translate_timeout_secs,
            ..Default::default()
        }
    }
}

fn run_pipeline(config: &AppConfig, store: &SqliteDocumentStore, progress: bool) -> Result<()> {
    let translator: Box<dyn Translator> = if config.translation.enabled {
        Box::new(GoogleTranslateClient::new(&config.translation)?)
    } else {
        info!("Translation disabled, scoring text as is");
        Box::new(PassthroughTranslator)
    };
    let scorer = SentimentScorer::with_lexicon(config.enrichment.policy);
    let pipeline = EnrichmentPipeline::new(&config.enrichment, translator, scorer);

    let bar = if progress {
        let total = store.count(pipeline.filter())?;
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg} [{elapsed_precise}]")?
                .progress_chars("=>-"),
        );
        Some(bar)
    } else {
        None
    };

    let result = pipeline.execute_with_observer(store, &mut |outcome: &RecordOutcome| {
        if let Some(bar) = &bar {
            bar.inc(1);
            bar.set_message(outcome.id().to_string());
        }
    });
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let summary = result?;
    let run_id = store.record_run(&summary)?;
    info!("Recorded run #{}", run_id);

    print_run_summary(&summary);
    if summary.failed > 0 {
        print_warning(&summary.to_string());
    } else {
        print_success(&summary.to_string());
    }
    Ok(())
}

fn show_history(store: &SqliteDocumentStore, limit: usize) -> Result<()> {
    let runs = store.list_runs(limit)?;
    if runs.is_empty() {
        print_empty_list("No pipeline runs recorded yet");
    } else {
        run_history_table(&runs).print();
    }
    Ok(())
}

fn list_records(
    store: &SqliteDocumentStore,
    filter: RecordFilter,
    limit: usize,
    json: bool,
) -> Result<()> {
    let records = RecordCursor::new(store, filter, limit.clamp(1, DEFAULT_PAGE_SIZE))
        .take(limit)
        .collect::<Result<Vec<Record>>>()?;

    if json {
        for record in &records {
            println!("{}", record.to_document());
        }
    } else if records.is_empty() {
        print_empty_list(&format!("No records match '{}'", filter.as_str()));
    } else {
        record_list_table(&records).print();
    }
    Ok(())
}

fn show_record(store: &SqliteDocumentStore, id: &str) -> Result<()> {
    let record = store
        .get(id)?
        .ok_or_else(|| anyhow!("No record with id '{}' in '{}'", id, store.collection()))?;
    println!("{}", serde_json::to_string_pretty(&record.to_document())?);
    Ok(())
}

fn run(cli_args: CliArgs) -> Result<()> {
    let run_args = match &cli_args.command {
        Some(Command::Run(args)) => Some(args),
        _ => None,
    };
    let default_run = RunArgs::default();
    let cli_config = cli_args.to_cli_config(run_args.unwrap_or(&default_run));

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let db_path = config.db_path();
    info!(
        "Opening document store at {:?}, collection '{}'",
        db_path, config.collection_name
    );
    let store = SqliteDocumentStore::open(&db_path, &config.collection_name)?;

    match &cli_args.command {
        None => run_pipeline(&config, &store, false)?,
        Some(Command::Run(args)) => run_pipeline(&config, &store, args.progress)?,
        Some(Command::History { limit }) => show_history(&store, *limit)?,
        Some(Command::Stats) => {
            let stats = store.get_stats()?;
            print_store_stats(store.collection(), &stats);
        }
        Some(Command::List {
            limit,
            filter,
            json,
        }) => list_records(&store, *filter, *limit, *json)?,
        Some(Command::Show { id }) => show_record(&store, id)?,
        Some(Command::ReformatDates) => {
            let report = reformat_dates(&store, config.enrichment.page_size)?;
            let message = format!(
                "Reformatted {} of {} records ({} unparseable)",
                report.updated, report.scanned, report.unparseable
            );
            if report.failed > 0 {
                print_warning(&format!("{}, {} failed", message, report.failed));
            } else {
                print_success(&message);
            }
        }
    }

    store.close()
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli_args = CliArgs::parse();
    exit_code(init_tracing().and_then(|()| run(cli_args)))
}
