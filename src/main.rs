//! # news_outdatedness
//!
//! Tooling for research on predicting when news goes stale. Every stage is a
//! one-shot batch job over JSON files:
//!
//! ```text
//! collect ──► articles.json ──► index ──► dataset.json ──► label ──► labeled.json
//!                                                                        │
//!   validate ◄── review.json (filled in by hand) ◄── sample ◄────────────┘
//! ```
//!
//! ## Usage
//!
//! ```sh
//! news_outdatedness collect --start 2025-05-01 --end 2025-05-12 -o data/articles.json
//! news_outdatedness label -i data/dataset.json -o data/labeled.json
//! ```
//!
//! ## Stages
//!
//! 1. **Collect**: query the news API day by day, extract and clean each
//!    article, keep one record per URL
//! 2. **Index**: give each collected article a positional id
//! 3. **Label**: run the ordered labeling rules over every record
//! 4. **Sample**: draw records for human review
//! 5. **Validate**: score rule labels against reviewed labels, write CSV
//!    reports and log a tracking run

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod collector;
mod config;
mod error;
mod extract;
mod models;
mod outputs;
mod pos;
mod rules;
mod sample;
mod text;
mod tracking;
mod utils;
mod validate;

use api::MediastackClient;
use cli::{Cli, CollectArgs, Command, IoArgs, SampleArgs, ValidateArgs};
use collector::Collector;
use config::{load_config, RunConfig};
use error::PipelineError;
use extract::HtmlExtractor;
use outputs::json::{read_articles, read_dataset, write_json};
use outputs::tables::{confusion_table, report_table};
use pos::LexiconTagger;
use rules::RuleEngine;
use sample::{sample_for_review, Strategy};
use text::{StopWords, TextCleaner};
use tracking::{log_validation, read_api_key, HttpTracker, OfflineTracker, Tracker};
use utils::ensure_writable_parent;

fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("news_outdatedness/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[instrument(level = "info", skip_all, fields(output = %args.output.display()))]
async fn run_collect(config: &RunConfig, args: CollectArgs) -> Result<(), Box<dyn Error>> {
    let Some(api_key) = args.api_key.filter(|k| !k.trim().is_empty()) else {
        error!("No news API key; set MEDIASTACK_API_KEY or pass --api-key");
        return Err(PipelineError::MissingApiKey.into());
    };
    ensure_writable_parent(&args.output).await?;

    let client = http_client()?;
    let stop_words = StopWords::english().with_extra(&config.cleaning.extra_stop_words);
    let cleaner = TextCleaner::new(stop_words.clone(), config.cleaning.noise_phrases.clone());
    let reference = args.reference_date.unwrap_or(config.reference_date);
    info!(start = %args.start, end = %args.end, %reference, "Collecting articles");

    let collector = Collector::new(
        MediastackClient::new(client.clone(), &config.collector, api_key),
        HtmlExtractor::new(client, stop_words),
        cleaner,
        reference,
        config.collector.delay(),
    );
    let collection = collector.collect_range(args.start, args.end).await?;

    println!("{collection}");
    write_json(&collection.into_articles(), &args.output).await?;
    println!("File saved to: {}", args.output.display());
    Ok(())
}

#[instrument(level = "info", skip_all, fields(input = %args.input.display()))]
async fn run_index(args: IoArgs) -> Result<(), Box<dyn Error>> {
    let articles = read_articles(&args.input).await?;
    let dataset = models::dataset_from_articles(&articles)?;
    write_json(&dataset, &args.output).await?;
    info!(records = dataset.len(), "Indexed articles");
    Ok(())
}

#[instrument(level = "info", skip_all, fields(input = %args.input.display()))]
async fn run_label(config: &RunConfig, args: IoArgs) -> Result<(), Box<dyn Error>> {
    let mut dataset = read_dataset(&args.input).await?;
    let engine = RuleEngine::new(LexiconTagger::new(), config.rules.past_event_keywords.clone());

    let report = engine.label_dataset(&mut dataset);
    println!("{report}");
    write_json(&dataset, &args.output).await?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(input = %args.io.input.display()))]
async fn run_sample(config: &RunConfig, args: SampleArgs) -> Result<(), Box<dyn Error>> {
    let strategy = match (args.size, args.per_class) {
        (Some(n), None) => Strategy::Uniform(n),
        (None, Some(n)) => Strategy::PerClass(n),
        _ => return Err("pass exactly one of --size or --per-class".into()),
    };
    let seed = args.seed.unwrap_or(config.sampling.seed);

    let dataset = read_dataset(&args.io.input).await?;
    let sample = sample_for_review(&dataset, strategy, seed)?;
    write_json(&sample, &args.io.output).await?;
    println!("Saved {} records for review to {}", sample.len(), args.io.output.display());
    Ok(())
}

async fn open_tracker(config: &RunConfig, args: &ValidateArgs) -> Result<Tracker, Box<dyn Error>> {
    if let Some(dir) = &args.offline_dir {
        info!(dir = %dir.display(), "Tracking offline");
        return Ok(Tracker::Offline(OfflineTracker::new(dir)));
    }
    let key = read_api_key(&args.key_file).await?;
    let Some(url) = args.tracking_url.clone().or(config.tracking.endpoint.clone()) else {
        return Err("no tracking endpoint; pass --tracking-url, set tracking.endpoint or use --offline-dir".into());
    };
    Ok(Tracker::Http(HttpTracker::login(http_client()?, &url, key).await?))
}

async fn write_table_csv(table: &outputs::tables::Table, path: &Path) -> Result<(), Box<dyn Error>> {
    table.write_csv(path).await?;
    println!("Saved {}", path.display());
    Ok(())
}

#[instrument(level = "info", skip_all, fields(input = %args.input.display()))]
async fn run_validate(config: &RunConfig, args: ValidateArgs) -> Result<(), Box<dyn Error>> {
    let mut tracker = open_tracker(config, &args).await?;

    let dataset = read_dataset(&args.input).await?;
    let validation = validate::validate(&dataset);
    println!("Classification Report:");
    println!("{}", serde_json::to_string_pretty(&validation.report)?);

    write_table_csv(&report_table(&validation.report), &args.metrics_csv).await?;
    write_table_csv(&confusion_table(&validation.confusion), &args.confusion_csv).await?;

    log_validation(
        &mut tracker,
        &config.tracking.project,
        &config.tracking.run_name,
        &validation,
    )
    .await?;
    if let Tracker::Offline(offline) = &tracker {
        if let Some(path) = offline.path() {
            println!("Tracking run saved to {}", path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_outdatedness starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, "Parsed CLI arguments");

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(e);
        }
    };

    let result = match args.command {
        Command::Collect(a) => run_collect(&config, a).await,
        Command::Index(a) => run_index(a).await,
        Command::Label(a) => run_label(&config, a).await,
        Command::Sample(a) => run_sample(&config, a).await,
        Command::Validate(a) => run_validate(&config, a).await,
    };
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    result
}
