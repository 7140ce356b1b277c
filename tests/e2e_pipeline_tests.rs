//! End-to-end tests over a real SQLite document store.

mod common;

use common::{
    canned_posts, create_test_store, db_path, record, CannedSource, FixedAnalyzer,
    PhrasebookTranslator, COLLECTION,
};
use mention_enrichment::config::{
    AppConfig, CliConfig, EnrichmentSettings, ExportSettings, FileConfig,
};
use mention_enrichment::document_store::{
    DocumentStore, Record, RecordCursor, RecordFilter, RunLog, SqliteDocumentStore,
};
use mention_enrichment::export::{export_records, ExportMode};
use mention_enrichment::pipeline::{
    reformat_dates, EnrichmentMode, EnrichmentPipeline, RecordOutcome,
};
use mention_enrichment::scraping::{import_tweets_csv, ScrapeJob};
use mention_enrichment::sentiment::{LabelPolicy, SentimentLabel, SentimentScorer};
use mention_enrichment::translation::PassthroughTranslator;
use serde_json::json;

fn full_pipeline(polarity: f64) -> EnrichmentPipeline {
    EnrichmentPipeline::new(
        &EnrichmentSettings::default(),
        Box::new(PhrasebookTranslator::new(&[(
            "Maza khoop chaan!",
            "Mine is very nice!",
        )])),
        SentimentScorer::new(Box::new(FixedAnalyzer(polarity)), LabelPolicy::StrictBand),
    )
}

#[test]
fn test_marathi_with_emoji_is_cleaned_translated_and_scored() {
    let (store, tmp) = create_test_store();
    store
        .insert(&record("m1", json!({"text": "Maza khoop chaan! 😊", "upvotes": 3})))
        .unwrap();

    let summary = full_pipeline(0.6).execute(&store).unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.translation_fallbacks, 0);
    store.close().unwrap();

    let reopened = SqliteDocumentStore::open(db_path(&tmp), COLLECTION).unwrap();
    let stored = reopened.get("m1").unwrap().unwrap();
    assert_eq!(stored.fields["text"], json!("Mine is very nice!"));
    assert_eq!(
        stored.fields["sentiment"],
        json!({"score": 0.6, "label": "positive"})
    );
    assert_eq!(stored.fields["upvotes"], json!(3));
}

#[test]
fn test_mixed_collection_run() {
    let (store, _tmp) = create_test_store();
    store
        .insert_many(&[
            record("known", json!({"text": "Maza khoop chaan! 😊"})),
            record("unknown", json!({"text": "Ekdum bekaar 😡😡"})),
            record("no-text", json!({"title": "link only"})),
            record("emoji-only", json!({"text": "🔥🔥🔥"})),
            record("number", json!({"text": 42})),
        ])
        .unwrap();

    let settings = EnrichmentSettings {
        filter: Some(RecordFilter::All),
        ..EnrichmentSettings::default()
    };
    let pipeline = EnrichmentPipeline::new(
        &settings,
        Box::new(PhrasebookTranslator::new(&[(
            "Maza khoop chaan!",
            "Mine is very nice!",
        )])),
        SentimentScorer::new(Box::new(FixedAnalyzer(-0.4)), LabelPolicy::StrictBand),
    );

    let mut outcomes = Vec::new();
    let summary = pipeline
        .execute_with_observer(&store, &mut |outcome: &RecordOutcome| {
            outcomes.push(outcome.id().to_string())
        })
        .unwrap();

    assert_eq!(
        outcomes,
        vec!["known", "unknown", "no-text", "emoji-only", "number"]
    );
    assert_eq!(
        summary.to_string(),
        "Processed 5 records: 2 updated, 3 skipped, 0 failed, 0 vanished (1 translation fallbacks)"
    );

    // Untranslatable text is kept as cleaned.
    let unknown = store.get("unknown").unwrap().unwrap();
    assert_eq!(unknown.fields["text"], json!("Ekdum bekaar"));
    assert_eq!(
        unknown.sentiment().unwrap().label,
        SentimentLabel::Negative
    );

    // Skipped records are untouched.
    assert_eq!(
        store.get("no-text").unwrap().unwrap().fields,
        *json!({"title": "link only"}).as_object().unwrap()
    );
    assert_eq!(
        store.get("emoji-only").unwrap().unwrap().fields["text"],
        json!("🔥🔥🔥")
    );
    assert_eq!(store.get("number").unwrap().unwrap().fields["text"], json!(42));
}

#[test]
fn test_runs_are_logged() {
    let (store, _tmp) = create_test_store();
    store
        .insert(&record("m1", json!({"text": "Maza khoop chaan!"})))
        .unwrap();

    let first = full_pipeline(0.6).execute(&store).unwrap();
    store.record_run(&first).unwrap();
    let second = full_pipeline(0.0).execute(&store).unwrap();
    store.record_run(&second).unwrap();

    let runs = store.list_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.collection == COLLECTION));
    assert!(runs.iter().all(|r| r.mode == "full" && r.policy == "strict-band"));
    assert_eq!(store.list_runs(1).unwrap().len(), 1);

    // The second run scored the already translated text.
    let stored = store.get("m1").unwrap().unwrap();
    assert_eq!(stored.sentiment().unwrap().label, SentimentLabel::Neutral);
}

#[test]
fn test_scrape_then_export() {
    let (store, tmp) = create_test_store();
    let job = ScrapeJob::new(
        "zomato review",
        200,
        SentimentScorer::with_lexicon(LabelPolicy::ZeroThreshold),
    );

    let report = job
        .execute(
            &CannedSource {
                posts: canned_posts(250),
            },
            &store,
        )
        .unwrap();

    assert_eq!(report.fetched, 200);
    assert_eq!(report.inserted, 160);
    assert_eq!(report.skipped, 40);
    assert_eq!(report.failed, 0);
    assert_eq!(store.count(RecordFilter::All).unwrap(), 160);

    let stats = store.get_stats().unwrap();
    assert_eq!(stats.with_sentiment, 160);
    // "hot" and "polite" are both positive opinion words.
    assert_eq!(stats.positive, 160);

    let settings = ExportSettings {
        path: tmp.path().join("zomato_reddit_reviews.xlsx"),
        mode: ExportMode::AppendSheet,
        sheet_name: "Reddit_Reviews_200".to_string(),
    };
    let first = export_records(&report.records, &settings).unwrap();
    let second = export_records(&report.records, &settings).unwrap();

    assert_eq!(first.rows, 160);
    assert_eq!(first.sheet_name, "Reddit_Reviews_200");
    assert_eq!(second.sheet_name, "Reddit_Reviews_200_2");
    assert_eq!(first.path, second.path);
}

#[test]
fn test_imported_tweets_are_scored_by_sentiment_only_run() {
    let (store, tmp) = create_test_store();
    let csv_path = tmp.path().join("tweets.csv");
    std::fs::write(
        &csv_path,
        "Text Content,Date,Reply Count,Like Count,Tweet by,Profile User Name\n\
         Food arrived cold again #zomato,2024-05-01,2,9,Pune,hungry_one\n\
         Delivery was quick :),2024-05-02,0,1,,Chennai\n",
    )
    .unwrap();

    let import = import_tweets_csv(&csv_path, &store).unwrap();
    assert_eq!(import.inserted, 2);
    assert_eq!(store.count(RecordFilter::MissingSentiment).unwrap(), 2);

    let settings = EnrichmentSettings {
        mode: EnrichmentMode::SentimentOnly,
        policy: LabelPolicy::ZeroThreshold,
        ..EnrichmentSettings::default()
    };
    let pipeline = EnrichmentPipeline::new(
        &settings,
        Box::new(PassthroughTranslator),
        SentimentScorer::with_lexicon(settings.policy),
    );
    assert_eq!(pipeline.filter(), RecordFilter::MissingSentiment);

    let summary = pipeline.execute(&store).unwrap();
    assert_eq!(summary.updated, 2);
    assert_eq!(store.count(RecordFilter::MissingSentiment).unwrap(), 0);

    let stats = store.get_stats().unwrap();
    assert_eq!(stats.negative, 1);
    assert_eq!(stats.positive, 1);

    // Nothing left to score.
    let again = pipeline.execute(&store).unwrap();
    assert_eq!(again.fetched, 0);
}

#[test]
fn test_config_file_drives_store_location() {
    let tmp = tempfile::TempDir::new().unwrap();
    let file_config: FileConfig = toml::from_str(&format!(
        r#"
        store_uri = "{}"
        db_name = "Twitter"

        [enrichment]
        mode = "sentiment-only"
        page_size = 25
        "#,
        tmp.path().display()
    ))
    .unwrap();
    let cli = CliConfig {
        db_name: Some("Reddit".to_string()),
        collection_name: Some("twitters".to_string()),
        ..Default::default()
    };

    let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();
    assert_eq!(config.db_path(), tmp.path().join("Twitter.db"));
    assert_eq!(config.enrichment.mode, EnrichmentMode::SentimentOnly);
    assert_eq!(config.enrichment.page_size, 25);

    let store = SqliteDocumentStore::open(config.db_path(), &config.collection_name).unwrap();
    assert_eq!(store.collection(), "twitters");
    assert!(config.db_path().exists());
}

#[test]
fn test_scraped_and_imported_dates_become_days() {
    let (store, tmp) = create_test_store();
    let job = ScrapeJob::new(
        "zomato review",
        10,
        SentimentScorer::with_lexicon(LabelPolicy::ZeroThreshold),
    );
    job.execute(
        &CannedSource {
            posts: canned_posts(10),
        },
        &store,
    )
    .unwrap();

    let csv_path = tmp.path().join("tweets.csv");
    std::fs::write(
        &csv_path,
        "Text Content,Date,Reply Count,Like Count,Tweet by,Profile User Name\n\
         Food arrived cold again #zomato,2024-05-01,2,9,Pune,hungry_one\n",
    )
    .unwrap();
    import_tweets_csv(&csv_path, &store).unwrap();

    let report = reformat_dates(&store, 3).unwrap();
    assert_eq!(report.scanned, 9);
    assert_eq!(report.updated, 9);

    let records = RecordCursor::new(&store, RecordFilter::All, 4)
        .collect::<anyhow::Result<Vec<Record>>>()
        .unwrap();
    assert_eq!(records.len(), 9);
    for record in &records {
        let day = record.fields["created_at"].as_str().unwrap();
        assert_eq!(day.len(), "dd-mm-yyyy".len());
        assert_eq!(&day[2..3], "-");
    }
    let tweet = records.last().unwrap().to_document();
    assert_eq!(tweet["created_at"], json!("01-05-2024"));
    assert_eq!(
        tweet.as_object().unwrap().keys().next().map(String::as_str),
        Some("id")
    );
}
