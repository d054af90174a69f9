//! Run configuration.
//!
//! Everything here has a default, so the YAML file is optional and may set
//! any subset of keys:
//!
//! ```yaml
//! reference_date: 2025-05-12T00:00:00Z
//! collector:
//!   delay_ms: 500
//! rules:
//!   past_event_keywords: [olympics, brexit]
//! tracking:
//!   endpoint: https://tracking.example.org/api
//! ```
//!
//! Secrets are not read from here; see the CLI.

use crate::rules::DEFAULT_PAST_EVENT_KEYWORDS;
use crate::sample::DEFAULT_SEED;
use crate::text::DEFAULT_NOISE_PHRASES;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Date the day offset `t` is measured from.
    pub reference_date: DateTime<Utc>,
    pub collector: CollectorConfig,
    pub cleaning: CleaningConfig,
    pub rules: RulesConfig,
    pub sampling: SamplingConfig,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub endpoint: String,
    pub languages: String,
    pub limit: u32,
    pub timeout_secs: u64,
    pub delay_ms: u64,
}

impl CollectorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub noise_phrases: Vec<String>,
    /// Added to the English stop-word list.
    pub extra_stop_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub past_event_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub project: String,
    pub run_name: String,
    pub endpoint: Option<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Midnight UTC on 2025-05-12.
pub fn default_reference_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 12, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reference_date: default_reference_date(),
            collector: CollectorConfig::default(),
            cleaning: CleaningConfig::default(),
            rules: RulesConfig::default(),
            sampling: SamplingConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://api.mediastack.com/v1/news".to_string(),
            languages: "en".to_string(),
            limit: 100,
            timeout_secs: 10,
            delay_ms: 1000,
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            noise_phrases: owned(DEFAULT_NOISE_PHRASES),
            extra_stop_words: Vec::new(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            past_event_keywords: owned(DEFAULT_PAST_EVENT_KEYWORDS),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { seed: DEFAULT_SEED }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            project: "news-outdatedness-validation".to_string(),
            run_name: "rulebased_vs_reviewed_table".to_string(),
            endpoint: None,
        }
    }
}

/// Load the YAML run configuration, or the defaults when no path is given.
///
/// # Arguments
///
/// * `path` - Optional YAML file; keys it leaves out keep their defaults
///
/// # Errors
///
/// Fails when the file cannot be read or is not valid configuration YAML,
/// naming the path in the message.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
    let config: RunConfig = serde_yaml::from_str(&raw)
        .map_err(|e| format!("cannot parse config {}: {e}", path.display()))?;
    info!(reference_date = %config.reference_date, "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.reference_date.to_rfc3339(), "2025-05-12T00:00:00+00:00");
        assert_eq!(config.collector.limit, 100);
        assert_eq!(config.collector.timeout(), Duration::from_secs(10));
        assert_eq!(config.collector.delay(), Duration::from_secs(1));
        assert_eq!(config.sampling.seed, 42);
        assert_eq!(config.tracking.project, "news-outdatedness-validation");
        assert!(config.rules.past_event_keywords.contains(&"brexit".to_string()));
        assert!(config.cleaning.noise_phrases.contains(&"click here".to_string()));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "reference_date: 2024-01-01T00:00:00Z\ncollector:\n  delay_ms: 0\nrules:\n  past_event_keywords: [olympics]\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.reference_date.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(config.collector.delay_ms, 0);
        assert_eq!(config.collector.limit, 100);
        assert_eq!(config.rules.past_event_keywords, vec!["olympics"]);
        assert_eq!(config.sampling.seed, 42);
    }

    #[test]
    fn test_bad_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "collector: [not, a, map]\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
        assert!(load_config(Some(&dir.path().join("missing.yaml"))).is_err());
    }
}
