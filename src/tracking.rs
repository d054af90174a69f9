//! Experiment tracking for validation runs.
//!
//! A run is a sequence of [`RunEvent`]s: `init`, any number of `metrics` and
//! `table` events, then `finish`. Two backends record them:
//!
//! - [`HttpTracker`] posts each event as JSON to a tracking service,
//!   authenticated with a bearer key.
//! - [`OfflineTracker`] appends each event as one JSON line to
//!   `<dir>/<project>/<run>.jsonl`, to be synced or inspected later.

use crate::error::PipelineError;
use crate::outputs::tables::{confusion_table, report_table, Table};
use crate::validate::Validation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// One event of a tracking run, serialized with an `"event"` tag.
///
/// ```text
/// {"event":"init","project":"news-outdatedness","name":"rule-validation"}
/// {"event":"metrics","values":{"precision_0":0.8,…}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// Opens a run; must come first.
    Init {
        project: String,
        name: String,
    },
    /// Named scalar metrics, in insertion order.
    Metrics {
        values: IndexMap<String, f64>,
    },
    /// A table logged under `key`, header row in `columns`.
    Table {
        key: String,
        columns: Vec<String>,
        data: Vec<Vec<Value>>,
    },
    /// Closes the run.
    Finish,
}

impl RunEvent {
    /// A `table` event carrying `table`'s header and rows.
    pub fn table(key: &str, table: &Table) -> Self {
        RunEvent::Table {
            key: key.to_string(),
            columns: table.header(),
            data: table.data(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RunEvent::Init { .. } => "init",
            RunEvent::Metrics { .. } => "metrics",
            RunEvent::Table { .. } => "table",
            RunEvent::Finish => "finish",
        }
    }
}

/// Something that records the events of a tracking run.
pub trait ExperimentTracker {
    /// Record one event.
    ///
    /// # Arguments
    ///
    /// * `event` - The next event of the run; the first must be `init`
    ///
    /// # Errors
    ///
    /// [`PipelineError::Tracking`] when the backend rejects or cannot store
    /// the event, or when an event arrives before `init`.
    async fn record(&mut self, event: RunEvent) -> Result<(), PipelineError>;
}

/// Read a tracking key from a secrets file, trimming surrounding whitespace.
///
/// # Errors
///
/// Fails when the file cannot be read, and with
/// [`PipelineError::EmptyCredential`] when it holds only whitespace.
pub async fn read_api_key(path: &Path) -> Result<String, Box<dyn Error>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("cannot read tracking key from {}: {e}", path.display()))?;
    let key = raw.trim();
    if key.is_empty() {
        return Err(PipelineError::EmptyCredential(path.display().to_string()).into());
    }
    Ok(key.to_string())
}

#[derive(Debug, Deserialize)]
struct RunCreated {
    id: String,
}

/// Tracking service client.
///
/// `POST {base}/runs` opens a run and returns its id; every later event goes to
/// `POST {base}/runs/{id}/events`.
#[derive(Debug)]
pub struct HttpTracker {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    run_id: Option<String>,
}

fn tracking_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Tracking(e.to_string())
}

impl HttpTracker {
    /// Check the key against the service before any event is sent.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `base_url` - Service root; a trailing `/` is ignored
    /// * `api_key` - Bearer key
    ///
    /// # Errors
    ///
    /// [`PipelineError::Tracking`] when the service is unreachable or
    /// answers `GET {base}/viewer` with a non-success status.
    #[instrument(level = "info", skip(client, api_key))]
    pub async fn login(
        client: reqwest::Client,
        base_url: &str,
        api_key: String,
    ) -> Result<Self, PipelineError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let resp = client
            .get(format!("{base_url}/viewer"))
            .bearer_auth(&api_key)
            .send()
            .await
            .map_err(tracking_err)?;
        if !resp.status().is_success() {
            return Err(PipelineError::Tracking(format!(
                "login rejected with status {}",
                resp.status()
            )));
        }
        info!("Logged in to tracking service");
        Ok(Self {
            client,
            base_url,
            api_key,
            run_id: None,
        })
    }

    fn events_url(&self) -> Result<String, PipelineError> {
        match &self.run_id {
            Some(id) => Ok(format!("{}/runs/{id}/events", self.base_url)),
            None => Err(PipelineError::Tracking("run not initialised".to_string())),
        }
    }
}

impl ExperimentTracker for HttpTracker {
    /// Post `event`. `init` goes to `/runs` and stores the returned run id;
    /// everything else goes to that run's `/events`.
    async fn record(&mut self, event: RunEvent) -> Result<(), PipelineError> {
        let url = match &event {
            RunEvent::Init { .. } => format!("{}/runs", self.base_url),
            _ => self.events_url()?,
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&event)
            .send()
            .await
            .map_err(tracking_err)?;
        if !resp.status().is_success() {
            return Err(PipelineError::Tracking(format!(
                "{} event rejected with status {}",
                event.kind(),
                resp.status()
            )));
        }

        if matches!(event, RunEvent::Init { .. }) {
            let created: RunCreated = resp.json().await.map_err(tracking_err)?;
            info!(run_id = %created.id, "Tracking run started");
            self.run_id = Some(created.id);
        } else {
            debug!(kind = event.kind(), "Sent tracking event");
        }
        Ok(())
    }
}

/// Local JSONL backend.
#[derive(Debug)]
pub struct OfflineTracker {
    dir: PathBuf,
    file: Option<PathBuf>,
}

impl OfflineTracker {
    /// A tracker writing runs under `dir`; nothing touches disk before `init`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file: None,
        }
    }

    /// Log file of the current run, once `init` has been recorded.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    async fn append(&self, path: &Path, event: &RunEvent) -> Result<(), PipelineError> {
        let mut line = serde_json::to_string(event).map_err(tracking_err)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(tracking_err)?;
        file.write_all(line.as_bytes()).await.map_err(tracking_err)?;
        Ok(())
    }
}

impl ExperimentTracker for OfflineTracker {
    async fn record(&mut self, event: RunEvent) -> Result<(), PipelineError> {
        if let RunEvent::Init { project, name } = &event {
            let dir = self.dir.join(project);
            tokio::fs::create_dir_all(&dir).await.map_err(tracking_err)?;
            let path = dir.join(format!("{name}.jsonl"));
            info!(path = %path.display(), "Offline tracking run started");
            self.file = Some(path);
        }
        let Some(path) = self.file.clone() else {
            return Err(PipelineError::Tracking("run not initialised".to_string()));
        };
        self.append(&path, &event).await?;
        debug!(kind = event.kind(), "Appended tracking event");
        Ok(())
    }
}

/// The backend picked at startup.
#[derive(Debug)]
pub enum Tracker {
    Http(HttpTracker),
    Offline(OfflineTracker),
}

impl ExperimentTracker for Tracker {
    async fn record(&mut self, event: RunEvent) -> Result<(), PipelineError> {
        match self {
            Tracker::Http(t) => t.record(event).await,
            Tracker::Offline(t) => t.record(event).await,
        }
    }
}

/// Log a validation as one complete run.
///
/// Sends `init`, the scalar metrics, the classification report and the
/// confusion matrix as tables, then `finish`.
///
/// # Arguments
///
/// * `tracker` - Backend to record into
/// * `project` - Project the run belongs to
/// * `run_name` - Name of the run
/// * `validation` - Metrics and matrix to log
///
/// # Errors
///
/// The first event the backend rejects stops the run and is returned.
#[instrument(level = "info", skip(tracker, validation))]
pub async fn log_validation<T: ExperimentTracker>(
    tracker: &mut T,
    project: &str,
    run_name: &str,
    validation: &Validation,
) -> Result<(), PipelineError> {
    tracker
        .record(RunEvent::Init {
            project: project.to_string(),
            name: run_name.to_string(),
        })
        .await?;

    let values = validation
        .report
        .scalars()
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    tracker.record(RunEvent::Metrics { values }).await?;

    tracker
        .record(RunEvent::table(
            "classification_report_table",
            &report_table(&validation.report),
        ))
        .await?;
    tracker
        .record(RunEvent::table(
            "confusion_matrix_table",
            &confusion_table(&validation.confusion),
        ))
        .await?;

    tracker.record(RunEvent::Finish).await?;
    info!("Tracking run finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{ClassificationReport, ConfusionMatrix};

    #[derive(Default)]
    struct Recorder {
        events: Vec<RunEvent>,
    }

    impl ExperimentTracker for Recorder {
        async fn record(&mut self, event: RunEvent) -> Result<(), PipelineError> {
            self.events.push(event);
            Ok(())
        }
    }

    fn validation() -> Validation {
        let confusion = ConfusionMatrix {
            counts: [[2, 0], [1, 1]],
        };
        Validation {
            report: ClassificationReport::from_confusion(&confusion),
            confusion,
        }
    }

    #[tokio::test]
    async fn test_log_validation_event_order() {
        let mut rec = Recorder::default();
        log_validation(&mut rec, "proj", "run", &validation())
            .await
            .unwrap();

        let kinds: Vec<&str> = rec.events.iter().map(RunEvent::kind).collect();
        assert_eq!(kinds, vec!["init", "metrics", "table", "table", "finish"]);

        match &rec.events[1] {
            RunEvent::Metrics { values } => {
                assert_eq!(values.len(), 10);
                assert_eq!(values["accuracy"], 0.75);
                assert_eq!(values["support_0"], 2.0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match &rec.events[3] {
            RunEvent::Table { key, columns, .. } => {
                assert_eq!(key, "confusion_matrix_table");
                assert_eq!(columns, &vec!["actual", "pred_0", "pred_1"]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_offline_tracker_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = OfflineTracker::new(dir.path());
        log_validation(&mut tracker, "proj", "run", &validation())
            .await
            .unwrap();

        let path = dir.path().join("proj/run.jsonl");
        assert_eq!(tracker.path(), Some(path.as_path()));
        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0]["event"], "init");
        assert_eq!(lines[0]["project"], "proj");
        assert_eq!(lines[2]["key"], "classification_report_table");
        assert_eq!(lines[4], serde_json::json!({"event": "finish"}));
    }

    #[tokio::test]
    async fn test_offline_tracker_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = OfflineTracker::new(dir.path());
        let err = tracker.record(RunEvent::Finish).await.unwrap_err();
        assert!(matches!(err, PipelineError::Tracking(_)));
    }

    #[tokio::test]
    async fn test_read_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.txt");

        std::fs::write(&path, "  secret-key\n").unwrap();
        assert_eq!(read_api_key(&path).await.unwrap(), "secret-key");

        std::fs::write(&path, "\n").unwrap();
        let err = read_api_key(&path).await.unwrap_err();
        assert!(err.to_string().contains("is empty"));

        assert!(read_api_key(&dir.path().join("missing.txt")).await.is_err());
    }
}
