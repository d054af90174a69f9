//! JSON file input and output.
//!
//! Two document shapes live on disk:
//!
//! ```text
//! articles.json   [ {article}, {article}, ... ]          written by `collect`
//! dataset.json    { "0": {record}, "1": {record}, ... }  every later stage
//! ```
//!
//! Files are pretty printed with two-space indentation and keep non-ASCII
//! characters as-is.

use crate::models::{Article, Dataset, Record};
use crate::utils::looks_truncated;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `value` to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    let bytes = json.len();
    fs::write(path, json).await?;
    info!(bytes, "Wrote JSON file");
    Ok(())
}

/// Read a keyed dataset.
///
/// # Arguments
/// * `path` - JSON object of id → record
///
/// # Returns
/// The records in file order.
///
/// # Errors
/// A flat array (the collector's shape) is rejected with a hint instead of a
/// bare type error. A record that does not decode (say, `"label": true`) is
/// reported with its id.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_dataset(path: &Path) -> Result<Dataset, Box<dyn Error>> {
    let raw = fs::read_to_string(path).await?;
    let entries = match serde_json::from_str::<IndexMap<String, Value>>(&raw) {
        Ok(entries) => entries,
        Err(e) if raw.trim_start().starts_with('[') => return Err(format!(
            "{} holds a JSON array of articles, not a keyed dataset; convert it with `index` first ({e})",
            path.display()
        )
        .into()),
        Err(e) if looks_truncated(&e) => {
            error!(error = %e, "Dataset file ends early");
            return Err(format!("{} looks truncated: {e}", path.display()).into());
        }
        Err(e) => return Err(e.into()),
    };

    let mut dataset = Dataset::with_capacity(entries.len());
    for (id, value) in entries {
        let record: Record = serde_json::from_value(value).map_err(|e| {
            error!(%id, error = %e, "Malformed record");
            format!("{}: record {id}: {e}", path.display())
        })?;
        dataset.insert(id, record);
    }
    info!(records = dataset.len(), "Loaded dataset");
    Ok(dataset)
}

/// Read the collector's article array.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_articles(path: &Path) -> Result<Vec<Article>, Box<dyn Error>> {
    let raw = fs::read_to_string(path).await?;
    let articles: Vec<Article> = serde_json::from_str(&raw)?;
    info!(articles = articles.len(), "Loaded articles");
    Ok(articles)
}
