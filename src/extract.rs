//! Article page download and extraction.
//!
//! Given an article URL, fetch the page and pull out what the collector
//! stores:
//!
//! | field       | first choice         | fallbacks                            |
//! |-------------|----------------------|--------------------------------------|
//! | `title`     | `og:title`           | `<h1>`, `<title>`                    |
//! | `text`      | `<article>` `<p>`s   | every `<p>`                          |
//! | `summary`   | `og:description`     | meta description, leading sentences  |
//! | `top_image` | `og:image`           | none                                 |
//! | `keywords`  | top terms by count   |                                      |
//!
//! Keywords are the most frequent alphabetic, non-stop-word terms of the
//! title and body; ties keep first-seen order.

use crate::text::{leading_sentences, StopWords};
use crate::utils::elapsed_ms;
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, instrument};
use url::Url;

pub const KEYWORD_COUNT: usize = 10;
const SUMMARY_SENTENCES: usize = 3;

/// What the extractor recovers from one article page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedArticle {
    pub title: String,
    /// Body paragraphs joined by blank lines.
    pub text: String,
    pub summary: String,
    /// Absolute URL of the lead image, or empty.
    pub top_image: String,
    /// Most frequent terms, most frequent first.
    pub keywords: Vec<String>,
}

/// Turns an article URL into its extracted content.
pub trait ArticleExtractor {
    /// Download and extract one article.
    ///
    /// # Arguments
    ///
    /// * `url` - Article page URL
    ///
    /// # Returns
    ///
    /// The extracted fields, or an error if the page could not be fetched
    /// or parsed.
    async fn extract(&self, url: &str) -> Result<ExtractedArticle, Box<dyn Error>>;
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn meta_content(document: &Html, selector: &str) -> Result<Option<String>, Box<dyn Error>> {
    let selector = Selector::parse(selector).map_err(|e| e.to_string())?;
    Ok(document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string))
}

fn first_text(document: &Html, selector: &str) -> Result<Option<String>, Box<dyn Error>> {
    let selector = Selector::parse(selector).map_err(|e| e.to_string())?;
    Ok(document
        .select(&selector)
        .map(element_text)
        .find(|t| !t.is_empty()))
}

fn paragraphs(document: &Html, selector: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let selector = Selector::parse(selector).map_err(|e| e.to_string())?;
    Ok(document
        .select(&selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect())
}

/// Most frequent terms of `text`, skipping stop-words and non-alphabetic tokens.
///
/// # Arguments
///
/// * `text` - Text to count terms in
/// * `stop_words` - Terms never returned
/// * `n` - Maximum number of terms
///
/// # Returns
///
/// Up to `n` lower-cased terms, most frequent first; ties keep first-seen
/// order.
pub fn top_keywords(text: &str, stop_words: &StopWords, n: usize) -> Vec<String> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() > 1 && w.chars().all(char::is_alphabetic))
        .filter(|w| !stop_words.contains(w))
    {
        *counts.entry(word).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(n).map(|(w, _)| w).collect()
}

/// Extract an article from its HTML; `url` resolves a relative top image.
///
/// # Errors
///
/// Only an invalid CSS selector fails; missing elements give empty fields.
pub fn parse_html(
    html: &str,
    url: &str,
    stop_words: &StopWords,
) -> Result<ExtractedArticle, Box<dyn Error>> {
    let document = Html::parse_document(html);

    let title = match meta_content(&document, r#"meta[property="og:title"]"#)? {
        Some(t) => t,
        None => first_text(&document, "h1")?
            .or(first_text(&document, "title")?)
            .unwrap_or_default(),
    };

    let mut body = paragraphs(&document, "article p")?;
    if body.is_empty() {
        body = paragraphs(&document, "p")?;
    }
    let text = body.join("\n\n");

    let summary = match meta_content(&document, r#"meta[property="og:description"]"#)? {
        Some(s) => s,
        None => match meta_content(&document, r#"meta[name="description"]"#)? {
            Some(s) => s,
            None => leading_sentences(&text, SUMMARY_SENTENCES).to_string(),
        },
    };

    let top_image = meta_content(&document, r#"meta[property="og:image"]"#)?
        .map(|src| match Url::parse(url).and_then(|base| base.join(&src)) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => src,
        })
        .unwrap_or_default();

    let keywords = top_keywords(&format!("{title}\n{text}"), stop_words, KEYWORD_COUNT);

    Ok(ExtractedArticle {
        title,
        text,
        summary,
        top_image,
        keywords,
    })
}

/// Downloads pages with reqwest and extracts them with [`parse_html`].
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    client: reqwest::Client,
    stop_words: StopWords,
}

impl HtmlExtractor {
    /// Create an extractor sharing `client`; `stop_words` feed the keywords.
    pub fn new(client: reqwest::Client, stop_words: StopWords) -> Self {
        Self { client, stop_words }
    }
}

impl ArticleExtractor for HtmlExtractor {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<ExtractedArticle, Box<dyn Error>> {
        let t0 = Instant::now();
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let article = parse_html(&html, url, &self.stop_words)?;
        debug!(
            bytes = article.text.len(),
            elapsed_ms = elapsed_ms(t0),
            "Parsed article"
        );
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html><head>
  <title>Site | Flood warning</title>
  <meta property="og:title" content="Flood warning issued for river towns">
  <meta property="og:image" content="/img/flood.jpg">
</head><body>
  <nav><p>Menu</p></nav>
  <h1>Flood warning</h1>
  <article>
    <p>The river rose overnight. Flood defences held in most towns.</p>
    <p>Officials said the flood   peak is expected Friday.</p>
  </article>
</body></html>"#;

    #[test]
    fn test_parse_html_prefers_open_graph_and_article_body() {
        let a = parse_html(PAGE, "https://news.example/2025/flood", &StopWords::english()).unwrap();
        assert_eq!(a.title, "Flood warning issued for river towns");
        assert_eq!(
            a.text,
            "The river rose overnight. Flood defences held in most towns.\n\nOfficials said the flood peak is expected Friday."
        );
        assert_eq!(a.top_image, "https://news.example/img/flood.jpg");
        assert_eq!(
            a.summary,
            "The river rose overnight. Flood defences held in most towns.\n\nOfficials said the flood peak is expected Friday."
        );
        assert_eq!(a.keywords[0], "flood");
        assert!(!a.keywords.contains(&"the".to_string()));
        assert!(a.keywords.len() <= KEYWORD_COUNT);
    }

    #[test]
    fn test_parse_html_fallbacks() {
        let html = r#"<html><head><title>Plain page</title>
            <meta name="description" content="A short description."></head>
            <body><p>One.</p><p>Two.</p></body></html>"#;
        let a = parse_html(html, "not a url", &StopWords::english()).unwrap();
        assert_eq!(a.title, "Plain page");
        assert_eq!(a.text, "One.\n\nTwo.");
        assert_eq!(a.summary, "A short description.");
        assert_eq!(a.top_image, "");
    }

    #[test]
    fn test_parse_html_empty_page() {
        let a = parse_html("", "https://news.example/", &StopWords::english()).unwrap();
        assert_eq!(a, ExtractedArticle::default());
    }

    #[test]
    fn test_top_keywords_ranks_by_count() {
        let words = top_keywords(
            "Budget vote: the budget passed, 2025 budget talks and vote count",
            &StopWords::english(),
            2,
        );
        assert_eq!(words, vec!["budget", "vote"]);
    }
}
