//! Command-line interface definitions.
//!
//! One subcommand per pipeline stage. Secrets can come from flags or the
//! environment (a `.env` file is loaded first).

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// News outdatedness research pipeline.
///
/// ```sh
/// news_outdatedness collect --start 2025-05-01 --end 2025-05-12 -o data/articles.json
/// news_outdatedness index -i data/articles.json -o data/dataset.json
/// news_outdatedness label -i data/dataset.json -o data/labeled.json
/// news_outdatedness sample -i data/labeled.json -o data/review.json --per-class 60
/// news_outdatedness validate -i data/review.json --offline-dir runs
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML run configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect articles from the news API over a date range
    Collect(CollectArgs),
    /// Turn a collected article array into a keyed dataset
    Index(IoArgs),
    /// Apply the labeling rules to a keyed dataset
    Label(IoArgs),
    /// Draw a review sample from a labeled dataset
    Sample(SampleArgs),
    /// Compare rule labels with reviewed labels
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// First day to collect (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day to collect, included (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Output JSON array of articles
    #[arg(short, long)]
    pub output: PathBuf,

    /// News API access key
    #[arg(long, env = "MEDIASTACK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Reference date for `t` (RFC 3339); overrides the configuration
    #[arg(long)]
    pub reference_date: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct IoArgs {
    /// Input JSON file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output JSON file
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("size_mode").required(true).args(["size", "per_class"])))]
pub struct SampleArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Draw this many records uniformly from all labeled records
    #[arg(long)]
    pub size: Option<usize>,

    /// Draw this many records from each label class
    #[arg(long)]
    pub per_class: Option<usize>,

    /// Random seed; overrides the configuration
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Reviewed sample JSON file
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(long, default_value = "validation_metrics.csv")]
    pub metrics_csv: PathBuf,

    #[arg(long, default_value = "confusion_matrix.csv")]
    pub confusion_csv: PathBuf,

    /// File holding the tracking service key
    #[arg(long, default_value = "wandb-api-key.txt")]
    pub key_file: PathBuf,

    /// Tracking service base URL; overrides the configuration
    #[arg(long, env = "TRACKING_URL")]
    pub tracking_url: Option<String>,

    /// Record the run as JSONL under this directory instead of posting it
    #[arg(long, conflicts_with = "tracking_url")]
    pub offline_dir: Option<PathBuf>,
}
