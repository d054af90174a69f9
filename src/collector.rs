//! Day-by-day article collection.
//!
//! For each day of an inclusive range the collector asks its [`NewsSource`]
//! for that day's stubs, extracts every article page, cleans the body and
//! stores the result keyed by URL:
//!
//! ```text
//! day ──► fetch_day ──► [stub, stub, …] ──► extract ──► clean ──► Article
//!                                                                   │
//!                         Collection { url → Article } ◄────────────┘
//! ```
//!
//! A failed day is logged and skipped, as is a failed article; neither stops
//! the range. Items are processed one at a time and a fixed delay separates
//! consecutive days.

use crate::api::{ApiArticle, NewsSource};
use crate::error::PipelineError;
use crate::extract::ArticleExtractor;
use crate::models::Article;
use crate::text::TextCleaner;
use crate::utils::{days_inclusive, truncate_for_log};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `published` to `reference`, rounded toward negative
/// infinity. Articles published after the reference date get a negative `t`.
///
/// # Arguments
///
/// * `reference` - The "now" of the dataset
/// * `published` - Publication timestamp, any offset
///
/// # Returns
///
/// The day offset stored as the article's `t`.
pub fn compute_t(reference: DateTime<Utc>, published: DateTime<FixedOffset>) -> i64 {
    (reference - published.with_timezone(&Utc))
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY)
}

/// Collected articles plus the counters behind the run summary.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Collection {
    /// Stubs returned by the API.
    pub requested: usize,
    /// Articles processed successfully, duplicates included.
    pub saved: usize,
    pub articles: IndexMap<String, Article>,
}

impl Collection {
    /// Store `article`, replacing in place any earlier article with its URL.
    pub fn insert(&mut self, article: Article) {
        self.articles.insert(article.url.clone(), article);
    }

    /// The unique articles in first-seen URL order.
    pub fn into_articles(self) -> Vec<Article> {
        self.articles.into_values().collect()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total processed: {}", self.requested)?;
        writeln!(f, "Total saved: {}", self.saved)?;
        write!(f, "Unique articles: {}", self.articles.len())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Drives collection over a date range.
///
/// Generic over where stubs come from ([`NewsSource`]) and how pages are
/// read ([`ArticleExtractor`]); production wires in
/// [`MediastackClient`](crate::api::MediastackClient) and
/// [`HtmlExtractor`](crate::extract::HtmlExtractor).
pub struct Collector<S, E> {
    source: S,
    extractor: E,
    cleaner: TextCleaner,
    reference: DateTime<Utc>,
    delay: Duration,
}

impl<S: NewsSource, E: ArticleExtractor> Collector<S, E> {
    /// Create a collector.
    ///
    /// # Arguments
    ///
    /// * `source` - Stub provider, queried once per day
    /// * `extractor` - Page downloader and parser
    /// * `cleaner` - Produces `clean_body` from the extracted text
    /// * `reference` - Reference date for `t`
    /// * `delay` - Pause between consecutive days
    pub fn new(
        source: S,
        extractor: E,
        cleaner: TextCleaner,
        reference: DateTime<Utc>,
        delay: Duration,
    ) -> Self {
        Self {
            source,
            extractor,
            cleaner,
            reference,
            delay,
        }
    }

    /// Build an [`Article`] from one API stub.
    ///
    /// The API's `description` and `image` win over the extracted summary
    /// and top image when they are non-empty.
    ///
    /// # Errors
    ///
    /// Fails when the stub has no URL, its `published_at` is missing or not
    /// RFC 3339, or extraction fails.
    #[instrument(level = "debug", skip_all, fields(url = ?item.url))]
    pub async fn process_item(&self, item: &ApiArticle) -> Result<Article, Box<dyn Error>> {
        let url = non_empty(item.url.as_deref()).ok_or("stub has no url")?;
        let published_at = item
            .published_at
            .as_deref()
            .ok_or("stub has no published_at")?;
        let published = DateTime::parse_from_rfc3339(published_at)
            .map_err(|e| format!("bad published_at {published_at:?}: {e}"))?;

        let extracted = self.extractor.extract(url).await?;
        let clean_body = self.cleaner.clean_text(&extracted.text);

        let summary = match non_empty(item.description.as_deref()) {
            Some(d) => d.to_string(),
            None => extracted.summary,
        };
        let image_url = match non_empty(item.image.as_deref()) {
            Some(i) => i.to_string(),
            None => extracted.top_image,
        };

        debug!(title = %truncate_for_log(&extracted.title, 80), "Processed article");
        Ok(Article {
            source: item.source.clone().unwrap_or_default(),
            url: url.to_string(),
            date: published.format("%Y-%m-%d").to_string(),
            time: published.format("%H:%M:%S").to_string(),
            title: extracted.title,
            body: extracted.text,
            clean_body,
            summary,
            keywords: extracted.keywords,
            image_url,
            category: item.category.clone().unwrap_or_default(),
            t: compute_t(self.reference, published),
        })
    }

    /// Collect one day into `collection`.
    ///
    /// A failed API request skips the day; a failed article skips the
    /// article. Both are logged as warnings.
    #[instrument(level = "info", skip(self, collection))]
    pub async fn collect_day(&self, day: NaiveDate, collection: &mut Collection) {
        let items = match self.source.fetch_day(day).await {
            Ok(items) => items,
            Err(e) => {
                warn!(%day, error = %e, "News API request failed; skipping day");
                return;
            }
        };

        let articles: Vec<Article> = stream::iter(items.iter())
            .then(|item| async move {
                match self.process_item(item).await {
                    Ok(article) => Some(article),
                    Err(e) => {
                        warn!(url = ?item.url, error = %e, "Failed to process article");
                        None
                    }
                }
            })
            .filter_map(std::future::ready)
            .collect()
            .await;

        collection.requested += items.len();
        collection.saved += articles.len();
        if articles.is_empty() {
            warn!(%day, "No valid articles");
        } else {
            info!(%day, collected = articles.len(), "Collected articles");
        }
        for article in articles {
            collection.insert(article);
        }
    }

    /// Collect every day from `start` to `end`, both included.
    ///
    /// # Arguments
    ///
    /// * `start` - First publication day
    /// * `end` - Last publication day
    ///
    /// # Returns
    ///
    /// The unique articles by URL plus the processed/saved counters.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidDateRange`] when `start` is after `end`.
    /// Per-day and per-article failures are not errors.
    #[instrument(level = "info", skip(self))]
    pub async fn collect_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Collection, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let mut collection = Collection::default();
        for (i, day) in days_inclusive(start, end).enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.collect_day(day, &mut collection).await;
        }

        info!(
            requested = collection.requested,
            saved = collection.saved,
            unique = collection.articles.len(),
            "Collection finished"
        );
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractedArticle;
    use chrono::TimeZone;
    use std::collections::HashMap;

    struct FakeSource {
        days: HashMap<NaiveDate, Vec<ApiArticle>>,
    }

    impl NewsSource for FakeSource {
        async fn fetch_day(&self, day: NaiveDate) -> Result<Vec<ApiArticle>, Box<dyn Error>> {
            self.days
                .get(&day)
                .cloned()
                .ok_or_else(|| format!("no response for {day}").into())
        }
    }

    struct FakeExtractor;

    impl ArticleExtractor for FakeExtractor {
        async fn extract(&self, url: &str) -> Result<ExtractedArticle, Box<dyn Error>> {
            if url.contains("broken") {
                return Err("connection reset".into());
            }
            Ok(ExtractedArticle {
                title: format!("Title of {url}"),
                text: "Councils approved budgets. Subscribe for updates.".to_string(),
                summary: "Extractor summary".to_string(),
                top_image: "https://img.example/top.jpg".to_string(),
                keywords: vec!["council".to_string()],
            })
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 12, 0, 0, 0).unwrap()
    }

    fn stub(url: &str, published_at: &str) -> ApiArticle {
        ApiArticle {
            url: Some(url.to_string()),
            published_at: Some(published_at.to_string()),
            source: Some("wire".to_string()),
            ..ApiArticle::default()
        }
    }

    fn collector(days: HashMap<NaiveDate, Vec<ApiArticle>>) -> Collector<FakeSource, FakeExtractor> {
        Collector::new(
            FakeSource { days },
            FakeExtractor,
            TextCleaner::default(),
            reference(),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_compute_t_floors() {
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap();
        assert_eq!(compute_t(reference(), at("2025-05-09T00:00:00+00:00")), 3);
        assert_eq!(compute_t(reference(), at("2025-05-08T23:59:59+00:00")), 3);
        assert_eq!(compute_t(reference(), at("2025-05-11T12:00:00+00:00")), 0);
        assert_eq!(compute_t(reference(), at("2025-05-12T06:00:00+00:00")), -1);
        assert_eq!(compute_t(reference(), at("2025-05-12T01:00:00+02:00")), 0);
    }

    #[tokio::test]
    async fn test_process_item_builds_article() {
        let c = collector(HashMap::new());
        let mut item = stub("https://a.example/1", "2025-05-10T08:30:00+00:00");
        item.category = Some("politics".to_string());
        item.description = Some("API description".to_string());

        let a = c.process_item(&item).await.unwrap();
        assert_eq!(a.date, "2025-05-10");
        assert_eq!(a.time, "08:30:00");
        assert_eq!(a.t, 1);
        assert_eq!(a.summary, "API description");
        assert_eq!(a.image_url, "https://img.example/top.jpg");
        assert_eq!(a.category, "politics");
        assert_eq!(a.source, "wire");
        assert_eq!(a.clean_body, "council approved budget");
    }

    #[tokio::test]
    async fn test_process_item_fallbacks_and_failures() {
        let c = collector(HashMap::new());
        let mut item = stub("https://a.example/1", "2025-05-10T08:30:00Z");
        item.source = None;
        item.description = Some(String::new());
        let a = c.process_item(&item).await.unwrap();
        assert_eq!(a.summary, "Extractor summary");
        assert_eq!(a.source, "");
        assert_eq!(a.category, "");

        assert!(c.process_item(&stub("https://a.example/2", "yesterday")).await.is_err());
        assert!(c.process_item(&ApiArticle::default()).await.is_err());
        assert!(c
            .process_item(&stub("https://broken.example/", "2025-05-10T08:30:00Z"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_collect_range_dedups_and_skips_failed_days() {
        let mut days = HashMap::new();
        days.insert(
            day(1),
            vec![
                stub("https://a.example/1", "2025-05-01T10:00:00+00:00"),
                stub("https://broken.example/x", "2025-05-01T11:00:00+00:00"),
            ],
        );
        // day 2 has no response and is skipped
        days.insert(
            day(3),
            vec![
                stub("https://a.example/2", "2025-05-03T10:00:00+00:00"),
                stub("https://a.example/1", "2025-05-03T12:00:00+00:00"),
            ],
        );

        let c = collector(days);
        let collection = c.collect_range(day(1), day(3)).await.unwrap();

        assert_eq!(collection.requested, 4);
        assert_eq!(collection.saved, 3);
        let urls: Vec<&String> = collection.articles.keys().collect();
        assert_eq!(urls, vec!["https://a.example/1", "https://a.example/2"]);
        assert_eq!(collection.articles["https://a.example/1"].date, "2025-05-03");

        let again = c.collect_range(day(1), day(3)).await.unwrap();
        assert_eq!(again, collection);
    }

    #[tokio::test]
    async fn test_collect_range_rejects_reversed_dates() {
        let c = collector(HashMap::new());
        assert!(matches!(
            c.collect_range(day(5), day(1)).await,
            Err(PipelineError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_collection_summary() {
        let collection = Collection {
            requested: 4,
            saved: 3,
            articles: IndexMap::new(),
        };
        assert_eq!(
            collection.to_string(),
            "Total processed: 4\nTotal saved: 3\nUnique articles: 0"
        );
    }
}
