//! News API client.
//!
//! The collector asks a [`NewsSource`] for the stubs of one calendar day at a
//! time. [`MediastackClient`] is the production source:
//!
//! ```text
//! GET {endpoint}?access_key=…&languages=en&date=YYYY-MM-DD&limit=100
//! -> { "pagination": {…}, "data": [ {stub}, {stub}, … ] }
//! ```
//!
//! A response without a `data` array is an error for that day only; stubs
//! that do not decode are dropped one by one.

use crate::config::CollectorConfig;
use crate::error::PipelineError;
use crate::utils::elapsed_ms;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// One item of the API's `data` array.
///
/// Every field is optional; the collector decides which gaps are fatal for
/// an article and which get a fallback.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiArticle {
    /// Article URL, the collector's identity key.
    pub url: Option<String>,
    /// Publication timestamp, RFC 3339.
    pub published_at: Option<String>,
    /// Publisher name.
    pub source: Option<String>,
    /// Teaser text; replaces the extracted summary when non-empty.
    pub description: Option<String>,
    /// Image URL; replaces the extracted top image when non-empty.
    pub image: Option<String>,
    pub category: Option<String>,
}

/// A provider of article stubs by publication day.
///
/// The collector only talks to this trait, so tests can swap in a canned
/// source.
pub trait NewsSource {
    /// Fetch the stubs of every article published on `day`.
    ///
    /// # Arguments
    ///
    /// * `day` - Publication day to query
    ///
    /// # Returns
    ///
    /// The decodable stubs of that day, in API order, or an error if the
    /// request or the response shape failed.
    async fn fetch_day(&self, day: NaiveDate) -> Result<Vec<ApiArticle>, Box<dyn Error>>;
}

/// Decode the `data` array of a response body.
///
/// # Arguments
///
/// * `body` - Parsed JSON response
/// * `day` - Day the response belongs to, for log and error context
///
/// # Returns
///
/// Every stub that decodes. Stubs that do not are logged and dropped.
///
/// # Errors
///
/// [`PipelineError::UnexpectedResponse`] when `data` is missing or not an
/// array (the API reports bad keys and quota errors this way).
pub fn parse_stubs(body: &Value, day: NaiveDate) -> Result<Vec<ApiArticle>, PipelineError> {
    let Some(items) = body.get("data").and_then(Value::as_array) else {
        return Err(PipelineError::UnexpectedResponse {
            context: day.to_string(),
            reason: "no data array".to_string(),
        });
    };

    Ok(items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match ApiArticle::deserialize(item) {
            Ok(stub) => Some(stub),
            Err(e) => {
                warn!(%day, index = i, error = %e, "Dropping undecodable stub");
                None
            }
        })
        .collect())
}

/// [`NewsSource`] backed by the mediastack `/v1/news` endpoint.
///
/// One request per day, no pagination: the API's `limit` caps the day.
#[derive(Debug, Clone)]
pub struct MediastackClient {
    client: reqwest::Client,
    endpoint: String,
    access_key: String,
    languages: String,
    limit: u32,
    timeout: Duration,
}

impl MediastackClient {
    /// Create a client from the collector configuration.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `config` - Endpoint, languages, page limit and timeout
    /// * `access_key` - API access key
    pub fn new(client: reqwest::Client, config: &CollectorConfig, access_key: String) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            access_key,
            languages: config.languages.clone(),
            limit: config.limit,
            timeout: config.timeout(),
        }
    }

    /// The query URL for one day, with every parameter percent-encoded.
    pub fn request_url(&self, day: NaiveDate) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("access_key", self.access_key.clone()),
                ("languages", self.languages.clone()),
                ("date", day.format("%Y-%m-%d").to_string()),
                ("limit", self.limit.to_string()),
            ],
        )
    }
}

impl NewsSource for MediastackClient {
    #[instrument(level = "info", skip_all, fields(%day))]
    async fn fetch_day(&self, day: NaiveDate) -> Result<Vec<ApiArticle>, Box<dyn Error>> {
        let t0 = Instant::now();
        let url = self.request_url(day)?;

        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        let body: Value = resp.json().await?;
        let stubs = parse_stubs(&body, day)?;

        info!(
            stubs = stubs.len(),
            elapsed_ms = elapsed_ms(t0),
            "Fetched day from news API"
        );
        debug!(urls = ?stubs.iter().filter_map(|s| s.url.as_deref()).collect::<Vec<_>>());
        Ok(stubs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    #[test]
    fn test_request_url_params() {
        let client = MediastackClient::new(
            reqwest::Client::new(),
            &CollectorConfig::default(),
            "k&y".to_string(),
        );
        let url = client.request_url(day()).unwrap();
        assert_eq!(url.host_str(), Some("api.mediastack.com"));
        assert_eq!(url.path(), "/v1/news");
        assert_eq!(
            url.query(),
            Some("access_key=k%26y&languages=en&date=2025-04-01&limit=100")
        );
    }

    #[test]
    fn test_parse_stubs() {
        let body = json!({
            "pagination": {"limit": 100, "offset": 0, "count": 3, "total": 3},
            "data": [
                {"url": "https://a.example/1", "published_at": "2025-04-01T10:00:00+00:00",
                 "source": "a", "description": null, "image": null, "category": "general",
                 "title": "ignored"},
                {"url": "https://a.example/2"},
                {"url": 42}
            ]
        });
        let stubs = parse_stubs(&body, day()).unwrap();
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].category.as_deref(), Some("general"));
        assert_eq!(stubs[0].description, None);
        assert_eq!(stubs[1].published_at, None);
    }

    #[test]
    fn test_missing_data_array_is_an_error() {
        let err = parse_stubs(&json!({"error": {"code": "invalid_access_key"}}), day()).unwrap_err();
        assert!(matches!(err, PipelineError::UnexpectedResponse { .. }));
        assert!(parse_stubs(&json!({"data": {}}), day()).is_err());
    }
}
