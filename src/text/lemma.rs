//! Noun lemmatizer.
//!
//! Reduces plural nouns to their singular form with an exception table and
//! WordNet-style detachment rules. Without a dictionary to confirm a
//! candidate, the suffix rules are guarded so common singular words ending in
//! `s` (`business`, `crisis`, `status`, `news`) pass through untouched.
//! Words that are not plural nouns come back unchanged.

use std::collections::HashMap;

const EXCEPTIONS: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("oxen", "ox"),
    ("data", "datum"),
    ("media", "medium"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("theses", "thesis"),
    ("diagnoses", "diagnosis"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("wolves", "wolf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("quizzes", "quiz"),
    ("gases", "gas"),
    ("heroes", "hero"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("echoes", "echo"),
    ("vetoes", "veto"),
    ("torpedoes", "torpedo"),
];

/// Heads of `-man` compounds whose plural is `-men` (`chairmen`, `spokeswomen`).
const MAN_COMPOUNDS: &[&str] = &[
    "chair", "spokes", "business", "congress", "police", "fire", "gentle", "sports", "fisher",
    "country", "sales", "crafts", "states", "trades", "committee", "council", "alder", "middle",
    "camera", "anchor", "gun", "noble", "horse", "work", "fore", "clergy", "journey", "hench",
    "news", "frontiers", "lay", "mail", "post", "sea", "air", "fresh", "longshore",
];

/// Singulars of `-us` nouns that pluralize with `-es`.
const US_SINGULARS: &[&str] = &[
    "bus", "virus", "bonus", "campus", "census", "status", "focus", "surplus", "consensus",
    "prospectus", "syllabus", "chorus", "circus", "genius", "walrus", "octopus", "apparatus",
    "caucus", "hiatus", "nexus", "sinus", "exodus", "fetus", "cactus", "abacus", "lotus",
];

/// Singulars ending in `e` that the suffix rules would otherwise over-strip
/// (`movies` is not `movy`, `headaches` is not `headach`).
const E_SINGULARS: &[&str] = &[
    "movie", "cookie", "calorie", "zombie", "rookie", "selfie", "brownie", "goalie", "hoodie",
    "smoothie", "prairie", "pie", "tie", "lie", "auntie", "newbie", "genie", "hippie", "veggie",
    "birdie", "headache", "ache", "cache", "niche", "moustache", "mustache", "avalanche",
    "cliche", "psyche",
];

const INVARIANT: &[&str] = &[
    "news",
    "series",
    "species",
    "means",
    "headquarters",
    "politics",
    "economics",
    "physics",
    "athletics",
    "olympics",
    "gas",
    "yes",
    "this",
    "was",
    "has",
    "does",
    "always",
    "perhaps",
    "whereas",
    "across",
    "canvas",
    "atlas",
    "chaos",
    "texas",
    "paris",
    "lens",
];

/// Plural-to-singular noun lemmatizer.
///
/// Built once per process; lookups never mutate it.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<&'static str, &'static str>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            exceptions: EXCEPTIONS.iter().copied().collect(),
        }
    }

    /// Lemmatize a single lower-case token.
    pub fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = self.exceptions.get(word) {
            return (*lemma).to_string();
        }
        if word.len() <= 3 || INVARIANT.contains(&word) || !word.is_ascii() {
            return word.to_string();
        }

        if let Some(stem) = word.strip_suffix("men") {
            let (head, singular) = match stem.strip_suffix("wo") {
                Some(head) => (head, "woman"),
                None => (stem, "man"),
            };
            if MAN_COMPOUNDS.contains(&head) {
                return format!("{head}{singular}");
            }
        }
        if let Some(singular) = word.strip_suffix('s') {
            if E_SINGULARS.contains(&singular) {
                return singular.to_string();
            }
        }
        if let Some(stem) = word.strip_suffix("ies") {
            if word.len() > 4 {
                return format!("{stem}y");
            }
            return word.to_string();
        }
        for suffix in ["ches", "shes", "xes", "zes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        if let Some(stem) = word.strip_suffix("es") {
            if stem.ends_with("ss") || US_SINGULARS.contains(&stem) {
                return stem.to_string();
            }
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }
        match word.strip_suffix('s') {
            Some(stem) => stem.to_string(),
            None => word.to_string(),
        }
    }
}
