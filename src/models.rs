//! Data models shared by every stage.
//!
//! - [`Article`]: one collected news article, as written by `collect`
//! - [`Label`]: the binary outdatedness label
//! - [`Record`]: one entry of a keyed dataset, carrying whatever fields the
//!   input had plus the labeling columns
//! - [`Dataset`]: id → record mapping, kept in input order
//!
//! The collector writes a flat JSON array of [`Article`]s while every labeling
//! stage reads and writes a keyed [`Dataset`]. [`dataset_from_articles`] is the
//! only bridge between the two shapes.

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

/// A collected news article.
///
/// Identity is the `url`; the collector never keeps two articles with the
/// same URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// Source name as reported by the news API.
    pub source: String,
    /// Canonical article URL.
    pub url: String,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    /// Publication time, `HH:MM:SS`.
    pub time: String,
    pub title: String,
    /// Full body text as extracted from the page.
    pub body: String,
    /// Body text after the cleaning pipeline.
    pub clean_body: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub image_url: String,
    pub category: String,
    /// Whole days between the reference date and the publication timestamp.
    pub t: i64,
}

/// Binary outdatedness label.
///
/// The numeric encoding follows what the labeling rules emit: `1` means the
/// article is still current, `0` means it is outdated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Outdated,
    Current,
}

impl Label {
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Outdated => 0,
            Label::Current => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Label> {
        match value {
            0 => Some(Label::Outdated),
            1 => Some(Label::Current),
            _ => None,
        }
    }

    /// Both classes in index order (`0`, then `1`).
    pub const ALL: [Label; 2] = [Label::Outdated, Label::Current];
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

struct LabelVisitor;

impl<'de> Visitor<'de> for LabelVisitor {
    type Value = Label;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a label: 0 or 1, as integer, float or string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Label, E> {
        Err(E::custom(format!("label must be 0 or 1, got boolean {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Label, E> {
        u8::try_from(v)
            .ok()
            .and_then(Label::from_u8)
            .ok_or_else(|| E::custom(format!("label out of range: {v}")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Label, E> {
        u64::try_from(v)
            .map_err(|_| E::custom(format!("label out of range: {v}")))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Label, E> {
        if v == 0.0 {
            Ok(Label::Outdated)
        } else if v == 1.0 {
            Ok(Label::Current)
        } else {
            Err(E::custom(format!("label out of range: {v}")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Label, E> {
        match v.trim() {
            "0" | "0.0" => Ok(Label::Outdated),
            "1" | "1.0" => Ok(Label::Current),
            other => Err(E::custom(format!("label out of range: {other:?}"))),
        }
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Label, D::Error> {
        deserializer.deserialize_any(LabelVisitor)
    }
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// One entry of a keyed dataset.
///
/// Every field the stages do not interpret stays in `fields`, in its original
/// order, and is written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Record {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<Option<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_comment: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub reviewed_label: Option<Option<Label>>,
}

impl Record {
    /// The label, treating an absent key and `null` alike.
    pub fn label(&self) -> Option<Label> {
        self.label.flatten()
    }

    pub fn reviewed_label(&self) -> Option<Label> {
        self.reviewed_label.flatten()
    }

    pub fn title(&self) -> &str {
        self.text_field("title")
    }

    pub fn summary(&self) -> &str {
        self.text_field("summary")
    }

    /// The `t` day offset as stored, accepting numbers and numeric strings.
    ///
    /// Fractional values are kept as-is so the rule thresholds compare
    /// against the raw number (`365.5` is past `365`).
    ///
    /// # Returns
    /// `None` when `t` is missing, `null`, non-numeric or not finite.
    pub fn t(&self) -> Option<f64> {
        let t = match self.fields.get("t")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        t.filter(|t| t.is_finite())
    }

    fn text_field(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// Record id → record, in input order.
pub type Dataset = IndexMap<String, Record>;

/// Convert the collector's flat array into a keyed dataset.
///
/// Ids are the zero-based positions of the articles.
pub fn dataset_from_articles(articles: &[Article]) -> Result<Dataset, Box<dyn Error>> {
    let mut dataset = Dataset::with_capacity(articles.len());
    for (i, article) in articles.iter().enumerate() {
        let Value::Object(fields) = serde_json::to_value(article)? else {
            return Err(format!("article {} did not serialize to an object", article.url).into());
        };
        dataset.insert(
            i.to_string(),
            Record {
                fields,
                ..Record::default()
            },
        );
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(url: &str, t: i64) -> Article {
        Article {
            source: "BBC".to_string(),
            url: url.to_string(),
            date: "2025-05-10".to_string(),
            time: "08:15:00".to_string(),
            title: "Markets rally".to_string(),
            body: "Body".to_string(),
            clean_body: "body".to_string(),
            summary: "Summary".to_string(),
            keywords: vec!["markets".to_string()],
            image_url: "https://example.com/a.jpg".to_string(),
            category: "business".to_string(),
            t,
        }
    }

    #[test]
    fn test_label_accepts_int_float_and_string() {
        let labels: Vec<Label> = serde_json::from_str(r#"[0, 1, 0.0, 1.0, "1"]"#).unwrap();
        assert_eq!(
            labels,
            vec![
                Label::Outdated,
                Label::Current,
                Label::Outdated,
                Label::Current,
                Label::Current
            ]
        );
    }

    #[test]
    fn test_label_rejects_other_values() {
        assert!(serde_json::from_str::<Label>("2").is_err());
        assert!(serde_json::from_str::<Label>("0.5").is_err());
        assert!(serde_json::from_str::<Label>(r#""yes""#).is_err());
        let err = serde_json::from_str::<Label>("true").unwrap_err();
        assert!(err.to_string().contains("label must be 0 or 1"));
    }

    #[test]
    fn test_label_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Label::Current).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Label::Outdated).unwrap(), "0");
    }

    #[test]
    fn test_record_preserves_unknown_fields_in_order() {
        let raw = r#"{"url":"https://a","title":"T","zeta":3,"alpha":[1,2],"t":4}"#;
        let record: Record = serde_json::from_str(raw).unwrap();
        assert_eq!(record.label, None);
        let keys: Vec<&String> = record.fields.keys().collect();
        assert_eq!(keys, vec!["url", "title", "zeta", "alpha", "t"]);
        assert_eq!(serde_json::to_string(&record).unwrap(), raw);
    }

    #[test]
    fn test_record_distinguishes_null_from_absent() {
        let with_null: Record = serde_json::from_str(r#"{"title":"x","label":null}"#).unwrap();
        assert_eq!(with_null.label, Some(None));
        assert_eq!(with_null.label(), None);

        let absent: Record = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.label, None);

        let out = serde_json::to_value(&with_null).unwrap();
        assert_eq!(out, json!({"title": "x", "label": null}));
    }

    #[test]
    fn test_record_reads_float_labels() {
        let record: Record =
            serde_json::from_str(r#"{"label":1.0,"reviewed_label":0.0,"label_comment":"rule_1"}"#)
                .unwrap();
        assert_eq!(record.label(), Some(Label::Current));
        assert_eq!(record.reviewed_label(), Some(Label::Outdated));
        assert_eq!(record.label_comment.as_deref(), Some("rule_1"));
    }

    #[test]
    fn test_record_t_is_lenient() {
        let parse = |v: Value| -> Option<f64> {
            let record: Record = serde_json::from_value(json!({ "t": v })).unwrap();
            record.t()
        };
        assert_eq!(parse(json!(7)), Some(7.0));
        assert_eq!(parse(json!(-2)), Some(-2.0));
        assert_eq!(parse(json!(3.7)), Some(3.7));
        assert_eq!(parse(json!("12")), Some(12.0));
        assert_eq!(parse(json!(" 365.5 ")), Some(365.5));
        assert_eq!(parse(json!("NaN")), None);
        assert_eq!(parse(json!("soon")), None);
        assert_eq!(parse(Value::Null), None);

        let missing: Record = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.t(), None);
    }

    #[test]
    fn test_record_text_fields_default_to_empty() {
        let record: Record = serde_json::from_value(json!({"title": null})).unwrap();
        assert_eq!(record.title(), "");
        assert_eq!(record.summary(), "");
    }

    #[test]
    fn test_dataset_from_articles_uses_positional_ids() {
        let articles = vec![article("https://a", 1), article("https://b", 2)];
        let dataset = dataset_from_articles(&articles).unwrap();

        let ids: Vec<&String> = dataset.keys().collect();
        assert_eq!(ids, vec!["0", "1"]);
        assert_eq!(dataset["1"].fields["url"], json!("https://b"));
        assert_eq!(dataset["0"].t(), Some(1.0));
        assert_eq!(dataset["0"].label, None);
    }

    #[test]
    fn test_article_round_trip_field_order() {
        let json = serde_json::to_string(&article("https://a", 5)).unwrap();
        let source_pos = json.find("\"source\"").unwrap();
        let t_pos = json.find("\"t\"").unwrap();
        assert!(source_pos < t_pos);
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(back.t, 5);
    }
}
