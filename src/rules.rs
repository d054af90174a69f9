//! Rule-based outdatedness labeling.
//!
//! [`RuleEngine::assign_label`] walks a decision list and stops at the first
//! step that decides:
//!
//! 1. an existing label is kept (`existing`)
//! 2. ambiguous titles are skipped (`ambiguous_skipped`)
//! 3. records without a usable `t` are skipped (`invalid_t`)
//! 4. the ordered [`RULES`] table is evaluated, first match wins
//! 5. otherwise the record stays unlabeled (`no_rule_applied`)
//!
//! Every decision carries a [`Reason`], written to the dataset as
//! `label_comment`. The comment trail is how rule coverage is measured.

use crate::models::{Dataset, Label, Record};
use crate::pos::{PosTagger, Tag, Token};
use itertools::Itertools;
use std::fmt;
use tracing::{debug, info, instrument};

/// Titles with fewer alphabetic tokens than this are ambiguous.
pub const MIN_TITLE_TOKENS: usize = 5;

/// Default keywords naming events that are known to be over.
pub const DEFAULT_PAST_EVENT_KEYWORDS: &[&str] = &[
    "olympics",
    "covid",
    "president biden",
    "president obama",
    "brexit",
    "tokyo 2020",
    "world cup",
    "election 2020",
    "pandemic",
    "lockdown",
    "covid-19",
];

/// Dominant verb tense of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tense {
    /// A modal governing a main verb ("will vote").
    Future,
    /// Present tense (`VBP`/`VBZ`).
    Ongoing,
    /// Past tense or participle (`VBD`/`VBN`).
    Past,
    Unknown,
}

/// Identifier of one rule of [`RULES`], written as `rule_N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    Rule1,
    Rule2,
    Rule3,
    Rule4,
    Rule5,
    Rule6,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::Rule1 => "rule_1",
            RuleId::Rule2 => "rule_2",
            RuleId::Rule3 => "rule_3",
            RuleId::Rule4 => "rule_4",
            RuleId::Rule5 => "rule_5",
            RuleId::Rule6 => "rule_6",
        }
    }
}

/// Why a record got (or did not get) its label.
///
/// The string form (`existing`, `rule_3`, …) is the `label_comment` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// The record already had a label.
    Existing,
    /// Too short, or no main verb.
    AmbiguousSkipped,
    /// `t` missing, non-numeric or negative.
    InvalidT,
    Rule(RuleId),
    NoRuleApplied,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Existing => "existing",
            Reason::AmbiguousSkipped => "ambiguous_skipped",
            Reason::InvalidT => "invalid_t",
            Reason::Rule(id) => id.as_str(),
            Reason::NoRuleApplied => "no_rule_applied",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of labeling one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub label: Option<Label>,
    pub reason: Reason,
}

impl Decision {
    fn unlabeled(reason: Reason) -> Self {
        Self {
            label: None,
            reason,
        }
    }
}

/// What the ordered rules look at.
#[derive(Debug, Clone, Copy)]
pub struct Facts<'a> {
    /// Day offset, known to be non-negative. Fractional days are kept.
    pub t: f64,
    pub tense: Tense,
    /// Lower-cased title.
    pub title: &'a str,
    /// Lower-cased summary.
    pub summary: &'a str,
    pub past_event_keywords: &'a [String],
}

/// One predicate/outcome pair of the decision list.
pub struct Rule {
    pub id: RuleId,
    pub outcome: Label,
    pub applies: fn(&Facts<'_>) -> bool,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("outcome", &self.outcome)
            .finish()
    }
}

/// The labeling rules, in evaluation order.
pub const RULES: [Rule; 6] = [
    Rule {
        id: RuleId::Rule1,
        outcome: Label::Current,
        applies: |f| f.t <= 3.0,
    },
    Rule {
        id: RuleId::Rule2,
        outcome: Label::Current,
        applies: |f| f.tense == Tense::Ongoing && f.t <= 10.0,
    },
    Rule {
        id: RuleId::Rule3,
        outcome: Label::Outdated,
        applies: |f| f.tense == Tense::Future && f.t > 90.0,
    },
    Rule {
        id: RuleId::Rule4,
        outcome: Label::Outdated,
        applies: |f| f.summary.contains("today") && f.t > 0.0,
    },
    Rule {
        id: RuleId::Rule5,
        outcome: Label::Outdated,
        applies: |f| {
            f.t > 30.0
                && f
                    .past_event_keywords
                    .iter()
                    .any(|kw| f.title.contains(kw.as_str()))
        },
    },
    Rule {
        id: RuleId::Rule6,
        outcome: Label::Outdated,
        applies: |f| f.t > 365.0,
    },
];

/// The first rule whose predicate holds.
pub fn first_match<'r>(rules: &'r [Rule], facts: &Facts<'_>) -> Option<&'r Rule> {
    rules.iter().find(|rule| (rule.applies)(facts))
}

/// Does a modal at this point govern a main verb (skipping adverbs and
/// auxiliaries, as in "will not be held")?
fn modal_governs_verb(rest: &[Token]) -> bool {
    for token in rest {
        if token.is_main_verb() {
            return true;
        }
        if token.tag == Tag::RB || (token.aux && token.tag.is_verb()) {
            continue;
        }
        return false;
    }
    false
}

/// Applies the decision list with a given part-of-speech tagger.
#[derive(Debug)]
pub struct RuleEngine<T> {
    tagger: T,
    past_event_keywords: Vec<String>,
}

impl<T: PosTagger> RuleEngine<T> {
    /// Create an engine.
    ///
    /// # Arguments
    ///
    /// * `tagger` - Part-of-speech tagger for ambiguity and tense checks
    /// * `past_event_keywords` - Phrases for `rule_5`, matched lower-cased
    pub fn new(tagger: T, past_event_keywords: Vec<String>) -> Self {
        Self {
            tagger,
            past_event_keywords: past_event_keywords
                .into_iter()
                .map(|kw| kw.to_lowercase())
                .collect(),
        }
    }

    /// A title is ambiguous when it has too few alphabetic tokens or no main
    /// verb to anchor a tense on.
    pub fn is_ambiguous(&self, title: &str) -> bool {
        let tokens = self.tagger.tag(title.trim());
        let alpha = tokens.iter().filter(|t| t.is_alpha()).count();
        let has_verb = tokens.iter().any(Token::is_main_verb);
        alpha < MIN_TITLE_TOKENS || !has_verb
    }

    /// Future if a modal governs a main verb, else ongoing on a present
    /// tense verb, else past on a past tense or participle.
    pub fn detect_tense(&self, text: &str) -> Tense {
        let tokens = self.tagger.tag(text.trim());
        let future = tokens
            .iter()
            .enumerate()
            .any(|(i, t)| t.tag == Tag::MD && modal_governs_verb(&tokens[i + 1..]));
        if future {
            Tense::Future
        } else if tokens.iter().any(|t| matches!(t.tag, Tag::VBP | Tag::VBZ)) {
            Tense::Ongoing
        } else if tokens.iter().any(|t| matches!(t.tag, Tag::VBD | Tag::VBN)) {
            Tense::Past
        } else {
            Tense::Unknown
        }
    }

    /// Label one record. Pure: depends only on the record and the engine's
    /// fixed configuration.
    ///
    /// # Arguments
    ///
    /// * `record` - Reads `label`, `title`, `summary` and `t`
    ///
    /// # Returns
    ///
    /// The label to store (or none) and the reason behind it.
    pub fn assign_label(&self, record: &Record) -> Decision {
        if let Some(label) = record.label() {
            return Decision {
                label: Some(label),
                reason: Reason::Existing,
            };
        }
        if self.is_ambiguous(record.title()) {
            return Decision::unlabeled(Reason::AmbiguousSkipped);
        }

        let title = record.title().to_lowercase();
        let summary = record.summary().to_lowercase();
        let tense = self.detect_tense(&title);

        let t = match record.t() {
            Some(t) if t >= 0.0 => t,
            _ => return Decision::unlabeled(Reason::InvalidT),
        };

        let facts = Facts {
            t,
            tense,
            title: &title,
            summary: &summary,
            past_event_keywords: &self.past_event_keywords,
        };
        match first_match(&RULES, &facts) {
            Some(rule) => Decision {
                label: Some(rule.outcome),
                reason: Reason::Rule(rule.id),
            },
            None => Decision::unlabeled(Reason::NoRuleApplied),
        }
    }

    /// Label every record in place and report the distribution.
    ///
    /// Every record gets `label` (possibly `null`) and `label_comment`.
    #[instrument(level = "info", skip_all, fields(records = dataset.len()))]
    pub fn label_dataset(&self, dataset: &mut Dataset) -> LabelReport {
        let mut report = LabelReport::default();
        for (id, record) in dataset.iter_mut() {
            let decision = self.assign_label(record);
            debug!(%id, reason = %decision.reason, label = ?decision.label, "Labeled record");
            record.label = Some(decision.label);
            record.label_comment = Some(decision.reason.to_string());
            report.decisions.push(decision);
        }
        info!(
            total = report.total(),
            current = report.count(Some(Label::Current)),
            outdated = report.count(Some(Label::Outdated)),
            unlabeled = report.count(None),
            "Rule-based labeling complete"
        );
        report
    }
}

/// Distribution of reasons and labels after a labeling run.
#[derive(Debug, Default)]
pub struct LabelReport {
    decisions: Vec<Decision>,
}

impl LabelReport {
    pub fn total(&self) -> usize {
        self.decisions.len()
    }

    pub fn count(&self, label: Option<Label>) -> usize {
        self.decisions.iter().filter(|d| d.label == label).count()
    }

    /// Reason codes with their counts, most frequent first.
    pub fn reason_counts(&self) -> Vec<(Reason, usize)> {
        self.decisions
            .iter()
            .map(|d| d.reason)
            .counts()
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())))
            .collect()
    }
}

impl fmt::Display for LabelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Label comment counts:")?;
        for (reason, count) in self.reason_counts() {
            writeln!(f, "  {:<20}{count:>8}", reason.as_str())?;
        }
        writeln!(f)?;
        writeln!(f, "Label value counts:")?;
        let mut values = vec![
            ("1", self.count(Some(Label::Current))),
            ("0", self.count(Some(Label::Outdated))),
            ("null", self.count(None)),
        ];
        values.sort_by(|a, b| b.1.cmp(&a.1));
        for (name, count) in values.into_iter().filter(|(_, c)| *c > 0) {
            writeln!(f, "  {name:<20}{count:>8}")?;
        }
        writeln!(f)?;
        writeln!(f, "Total rows: {}", self.total())?;
        writeln!(f, "  Label 0: {}", self.count(Some(Label::Outdated)))?;
        writeln!(f, "  Label 1: {}", self.count(Some(Label::Current)))?;
        write!(f, "  Unlabeled: {}", self.count(None))
    }
}
