//! Text cleaning for collected article bodies.
//!
//! [`TextCleaner::clean_text`] turns raw (possibly HTML) body text into a
//! normalized token string for NLP work:
//!
//! 1. lower-case, strip markup, transliterate to ASCII
//! 2. split into sentences and drop the ones containing a noise phrase
//! 3. strip URLs, email-like tokens, digits and punctuation
//! 4. tokenize, drop stop-words, lemmatize and rejoin with single spaces
//!
//! The cleaner owns its stop-word set and lemmatizer. Build it once per
//! process and share it by reference; it is never mutated after construction.

pub mod lemma;

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::collections::HashSet;

pub use lemma::Lemmatizer;

static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());
static URL_OR_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www\S+|\S+@\S+").unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Phrases marking boilerplate sentences (newsletter prompts, photo credits).
pub const DEFAULT_NOISE_PHRASES: &[&str] = &[
    "subscribe",
    "sign up",
    "follow us",
    "download the app",
    "photo by",
    "reporting by",
    "read more",
    "share this",
    "get the app",
    "contact us",
    "click here",
    "read our",
    "help us improve",
];

const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// A set of lower-case stop-words.
#[derive(Debug, Clone)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    /// The standard English stop-word list.
    pub fn english() -> Self {
        Self(ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect())
    }

    /// Extend the set with additional words (lower-cased).
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0
            .extend(extra.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }
}

/// Does `sentence` contain one of the noise phrases?
pub fn is_noise(sentence: &str, phrases: &[String]) -> bool {
    let sentence = sentence.to_lowercase();
    phrases.iter().any(|p| sentence.contains(p.as_str()))
}

/// Extract the text content of an HTML fragment.
pub fn strip_markup(text: &str) -> String {
    Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<String>()
}

/// The first `n` sentences of `text`, closing punctuation included.
pub fn leading_sentences(text: &str, n: usize) -> &str {
    let end = match n.checked_sub(1) {
        None => 0,
        Some(i) => SENTENCE_BOUNDARY
            .find_iter(text)
            .nth(i)
            .map_or(text.len(), |m| m.start() + 1),
    };
    text[..end].trim()
}

/// The cleaning pipeline, configured once per process.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    stop_words: StopWords,
    noise_phrases: Vec<String>,
    lemmatizer: Lemmatizer,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new(
            StopWords::english(),
            DEFAULT_NOISE_PHRASES.iter().map(|p| p.to_string()).collect(),
        )
    }
}

impl TextCleaner {
    pub fn new(stop_words: StopWords, noise_phrases: Vec<String>) -> Self {
        Self {
            stop_words,
            noise_phrases: noise_phrases.into_iter().map(|p| p.to_lowercase()).collect(),
            lemmatizer: Lemmatizer::new(),
        }
    }

    /// Clean and normalize raw body text.
    ///
    /// # Arguments
    ///
    /// * `text` - Body text, possibly with HTML markup
    ///
    /// # Returns
    ///
    /// Lemmatized content words joined by single spaces, in input order.
    /// Empty input gives an empty string.
    pub fn clean_text(&self, text: &str) -> String {
        let text = text.to_lowercase();
        let text = strip_markup(&text);
        let text = deunicode(&text);

        let kept = SENTENCE_BOUNDARY
            .split(&text)
            .filter(|s| !is_noise(s, &self.noise_phrases))
            .collect::<Vec<_>>()
            .join(" ");

        let text = URL_OR_EMAIL.replace_all(&kept, "");
        let text = DIGITS.replace_all(&text, "");
        let text: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        let text = WHITESPACE.replace_all(&text, " ");

        text.trim()
            .split(' ')
            .filter(|w| !w.is_empty() && !self.stop_words.contains(w))
            .map(|w| self.lemmatizer.lemmatize(w))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
