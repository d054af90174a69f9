//! Part-of-speech tagging for headlines.
//!
//! The labeling rules only need a handful of Penn Treebank distinctions:
//! modals (`MD`), the verb tenses (`VB`, `VBD`, `VBN`, `VBP`, `VBZ`, `VBG`) and
//! whether a verb is an auxiliary (`be`, `have`, `do`, modals) or a main verb.
//! [`LexiconTagger`] gets there with a verb lexicon (irregular forms plus
//! regular verbs common in news copy), closed-class word lists, suffix
//! heuristics for unknown words and a left-to-right context pass.
//!
//! Anything implementing [`PosTagger`] can be plugged into the rule engine.

use std::collections::HashMap;

/// Penn Treebank tags, reduced to what the rules and their tests need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    MD,
    VB,
    VBD,
    VBN,
    VBP,
    VBZ,
    VBG,
    NN,
    NNS,
    NNP,
    PRP,
    DT,
    IN,
    TO,
    CC,
    JJ,
    RB,
    CD,
    POS,
    Punct,
}

impl Tag {
    pub fn is_verb(self) -> bool {
        matches!(
            self,
            Tag::VB | Tag::VBD | Tag::VBN | Tag::VBP | Tag::VBZ | Tag::VBG
        )
    }

    fn is_nominal(self) -> bool {
        matches!(self, Tag::NN | Tag::NNS | Tag::NNP | Tag::PRP | Tag::CD)
    }

    /// Tags after which an ambiguous noun/verb form reads as a noun.
    fn opens_noun_phrase(self) -> bool {
        matches!(self, Tag::DT | Tag::IN | Tag::JJ | Tag::POS | Tag::CC)
    }
}

/// A tagged token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub tag: Tag,
    /// Auxiliary or modal rather than a main verb.
    pub aux: bool,
}

impl Token {
    pub fn is_alpha(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphabetic)
    }

    /// A verb carrying lexical meaning (not an auxiliary or modal).
    pub fn is_main_verb(&self) -> bool {
        self.tag.is_verb() && !self.aux
    }
}

/// Assigns part-of-speech tags to a piece of text.
pub trait PosTagger {
    /// Tokenize and tag `text`, one [`Token`] per word, clitic or
    /// punctuation mark.
    fn tag(&self, text: &str) -> Vec<Token>;
}

/// Surface forms a verb lexicon entry can take.
#[derive(Debug, Clone, Copy, Default)]
struct Forms {
    base: bool,
    third: bool,
    past: bool,
    participle: bool,
    gerund: bool,
}

impl Forms {
    fn any(self) -> bool {
        self.base || self.third || self.past || self.participle || self.gerund
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuxKind {
    Modal,
    Be,
    Have,
    Do,
}

/// First-pass reading of a token, before context is applied.
#[derive(Debug, Clone, Copy)]
enum Lexical {
    Fixed(Tag),
    Aux(AuxKind, Tag),
    Verb(Forms),
    Noun { plural: bool, proper: bool },
}

const IRREGULAR: &[(&str, &str, &str)] = &[
    ("say", "said", "said"),
    ("make", "made", "made"),
    ("go", "went", "gone"),
    ("take", "took", "taken"),
    ("come", "came", "come"),
    ("see", "saw", "seen"),
    ("know", "knew", "known"),
    ("get", "got", "gotten"),
    ("give", "gave", "given"),
    ("find", "found", "found"),
    ("think", "thought", "thought"),
    ("tell", "told", "told"),
    ("become", "became", "become"),
    ("leave", "left", "left"),
    ("feel", "felt", "felt"),
    ("bring", "brought", "brought"),
    ("begin", "began", "begun"),
    ("keep", "kept", "kept"),
    ("hold", "held", "held"),
    ("write", "wrote", "written"),
    ("stand", "stood", "stood"),
    ("hear", "heard", "heard"),
    ("let", "let", "let"),
    ("mean", "meant", "meant"),
    ("set", "set", "set"),
    ("meet", "met", "met"),
    ("run", "ran", "run"),
    ("pay", "paid", "paid"),
    ("sit", "sat", "sat"),
    ("speak", "spoke", "spoken"),
    ("lead", "led", "led"),
    ("grow", "grew", "grown"),
    ("lose", "lost", "lost"),
    ("fall", "fell", "fallen"),
    ("send", "sent", "sent"),
    ("build", "built", "built"),
    ("understand", "understood", "understood"),
    ("draw", "drew", "drawn"),
    ("break", "broke", "broken"),
    ("spend", "spent", "spent"),
    ("cut", "cut", "cut"),
    ("rise", "rose", "risen"),
    ("drive", "drove", "driven"),
    ("buy", "bought", "bought"),
    ("wear", "wore", "worn"),
    ("choose", "chose", "chosen"),
    ("seek", "sought", "sought"),
    ("throw", "threw", "thrown"),
    ("catch", "caught", "caught"),
    ("deal", "dealt", "dealt"),
    ("win", "won", "won"),
    ("fight", "fought", "fought"),
    ("sell", "sold", "sold"),
    ("shoot", "shot", "shot"),
    ("strike", "struck", "struck"),
    ("hit", "hit", "hit"),
    ("put", "put", "put"),
    ("quit", "quit", "quit"),
    ("shut", "shut", "shut"),
    ("hurt", "hurt", "hurt"),
    ("cost", "cost", "cost"),
    ("split", "split", "split"),
    ("spread", "spread", "spread"),
    ("bet", "bet", "bet"),
    ("sink", "sank", "sunk"),
    ("swear", "swore", "sworn"),
    ("steal", "stole", "stolen"),
    ("freeze", "froze", "frozen"),
    ("forget", "forgot", "forgotten"),
    ("hide", "hid", "hidden"),
    ("ride", "rode", "ridden"),
    ("shake", "shook", "shaken"),
    ("slide", "slid", "slid"),
    ("swing", "swung", "swung"),
    ("tear", "tore", "torn"),
    ("wake", "woke", "woken"),
    ("beat", "beat", "beaten"),
    ("bite", "bit", "bitten"),
    ("blow", "blew", "blown"),
    ("fly", "flew", "flown"),
    ("eat", "ate", "eaten"),
    ("drink", "drank", "drunk"),
    ("sing", "sang", "sung"),
    ("flee", "fled", "fled"),
    ("feed", "fed", "fed"),
    ("lay", "laid", "laid"),
    ("lend", "lent", "lent"),
    ("bend", "bent", "bent"),
    ("dig", "dug", "dug"),
    ("hang", "hung", "hung"),
    ("light", "lit", "lit"),
    ("read", "read", "read"),
    ("undergo", "underwent", "undergone"),
    ("withdraw", "withdrew", "withdrawn"),
    ("overcome", "overcame", "overcome"),
    ("uphold", "upheld", "upheld"),
    ("oversee", "oversaw", "overseen"),
    ("forecast", "forecast", "forecast"),
    ("broadcast", "broadcast", "broadcast"),
    ("show", "showed", "shown"),
    ("prove", "proved", "proven"),
    ("sweep", "swept", "swept"),
    ("sleep", "slept", "slept"),
    ("stick", "stuck", "stuck"),
    ("teach", "taught", "taught"),
    ("rebuild", "rebuilt", "rebuilt"),
    ("arise", "arose", "arisen"),
];

const REGULAR: &[&str] = &[
    "accept", "accuse", "add", "admit", "agree", "aim", "allow", "announce", "appeal", "appear",
    "approve", "argue", "arrest", "arrive", "ask", "attack", "avoid", "back", "ban", "battle",
    "blame", "block", "boost", "call", "cancel", "celebrate", "change", "charge", "claim",
    "clash", "close", "collapse", "confirm", "consider", "continue", "criticize", "cross",
    "crash", "damage", "debate", "decide", "declare", "decline", "defeat", "defend", "delay",
    "deliver", "demand", "deny", "deploy", "destroy", "die", "discover", "discuss", "dismiss",
    "drop", "earn", "ease", "emerge", "end", "enter", "erupt", "escape", "evacuate", "expand",
    "expect", "explain", "face", "fail", "fear", "file", "fire", "force", "gain", "grab",
    "happen", "help", "hike", "hope", "host", "ignore", "impose", "improve", "include",
    "increase", "investigate", "join", "jump", "kill", "land", "launch", "lift", "like", "list",
    "live", "look", "love", "mark", "miss", "move", "name", "need", "note", "offer", "open",
    "order", "pass", "pick", "plan", "play", "pledge", "plunge", "post", "praise", "predict",
    "prepare", "press", "prevent", "promise", "protest", "provide", "pull", "push",
    "question", "raise", "rally", "rank", "reach", "recall", "receive", "record", "recover",
    "reduce", "reform", "reject", "release", "rely", "remain", "remember", "remove", "reopen",
    "repeat", "replace", "report", "request", "require", "rescue", "resign", "respond",
    "retire", "return", "reveal", "rule", "sanction", "save", "secure", "seem", "seize",
    "serve", "settle", "share", "shift", "sign", "slam", "slash", "slip", "soar", "spark",
    "spur", "start", "stay", "step", "stop", "struggle", "sue", "suffer", "support", "surge",
    "suspend", "target", "test", "threaten", "top", "track", "trade", "travel", "try",
    "tumble", "turn", "unveil", "urge", "use", "visit", "vote", "vow", "wait", "walk", "want",
    "warn", "watch", "weigh", "welcome", "work", "worry", "worsen", "uncover", "matter",
    "acquire", "halt", "slump", "climb", "rebound", "signal", "mull", "tout", "seal", "clinch",
    "edge", "extend", "restore", "resume", "expose", "oust", "elect", "merge", "invest", "hire",
    "spike", "ruin", "shock", "stun", "hail", "honor", "mourn", "quash", "revive", "tighten",
    "loosen", "overturn", "convict", "detain",
];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "every", "each", "some", "any", "no",
    "all", "another", "both", "either", "neither",
];

const PREPOSITIONS: &[&str] = &[
    "of", "in", "on", "at", "by", "for", "with", "from", "into", "onto", "over", "after",
    "before", "amid", "against", "about", "during", "under", "between", "through", "without",
    "within", "across", "near", "since", "until", "as", "than", "per", "via", "despite",
    "toward", "towards", "behind", "among", "around", "beyond", "off", "out", "up", "down",
    "if", "while", "because", "though", "although", "whether", "beneath", "above", "below",
    "inside", "outside", "upon", "along", "throughout", "underneath", "beside", "alongside",
    "amongst", "unlike",
];

const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "his", "its",
    "our", "their", "my", "your", "who", "what", "which", "whom", "whose",
];

const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet", "so", "&"];

const ADVERBS: &[&str] = &[
    "not", "n't", "now", "also", "again", "still", "just", "never", "soon", "already", "today",
    "tonight", "yesterday", "tomorrow", "here", "there", "then", "ever", "even", "very", "too",
    "once", "later", "back", "away", "ago", "almost", "nearly", "only", "why", "how", "when",
    "where",
];

const ADJECTIVES: &[&str] = &[
    "new", "old", "big", "high", "low", "former", "first", "last", "major", "key", "latest",
    "ancient", "local", "global", "national", "public", "early", "late", "next", "final",
    "young", "small", "large", "huge", "great", "best", "worst", "rare", "deadly", "recent",
];

/// Capitalized forms that name something even though the lower-case word is
/// in the verb lexicon.
const PROPER_NAMES: &[&str] = &["Fed", "FED", "Lent"];

const NOT_ADVERBS: &[&str] = &[
    "family", "italy", "july", "supply", "apply", "reply", "ally", "belly", "rally", "assembly",
    "bully", "jelly", "holly",
];

const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "ical", "less"];

fn aux_reading(lower: &str) -> Option<(AuxKind, Tag)> {
    let reading = match lower {
        "will" | "would" | "shall" | "should" | "can" | "could" | "may" | "might" | "must"
        | "'ll" | "'d" | "wo" | "ca" | "sha" => (AuxKind::Modal, Tag::MD),
        "be" => (AuxKind::Be, Tag::VB),
        "am" | "are" | "'re" | "'m" => (AuxKind::Be, Tag::VBP),
        "is" => (AuxKind::Be, Tag::VBZ),
        "was" | "were" => (AuxKind::Be, Tag::VBD),
        "been" => (AuxKind::Be, Tag::VBN),
        "being" => (AuxKind::Be, Tag::VBG),
        "have" | "'ve" => (AuxKind::Have, Tag::VBP),
        "has" => (AuxKind::Have, Tag::VBZ),
        "had" => (AuxKind::Have, Tag::VBD),
        "having" => (AuxKind::Have, Tag::VBG),
        "do" => (AuxKind::Do, Tag::VBP),
        "does" => (AuxKind::Do, Tag::VBZ),
        "did" => (AuxKind::Do, Tag::VBD),
        _ => return None,
    };
    Some(reading)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Short consonant-vowel-consonant stems double their final consonant
/// (`ban` → `banned`, `stop` → `stopping`).
fn doubles_final(base: &str) -> bool {
    let chars: Vec<char> = base.chars().collect();
    let n = chars.len();
    n >= 3
        && n <= 4
        && !is_vowel(chars[n - 1])
        && !matches!(chars[n - 1], 'w' | 'x' | 'y')
        && is_vowel(chars[n - 2])
        && !is_vowel(chars[n - 3])
}

fn third_person(base: &str) -> String {
    if let Some(stem) = base.strip_suffix('y') {
        if !stem.ends_with(is_vowel) {
            return format!("{stem}ies");
        }
    }
    if ["s", "sh", "ch", "x", "z", "o"].iter().any(|s| base.ends_with(s)) {
        return format!("{base}es");
    }
    format!("{base}s")
}

fn regular_past(base: &str) -> String {
    if base.ends_with('e') {
        return format!("{base}d");
    }
    if let Some(stem) = base.strip_suffix('y') {
        if !stem.ends_with(is_vowel) {
            return format!("{stem}ied");
        }
    }
    if doubles_final(base) {
        let last = base.chars().last().unwrap_or_default();
        return format!("{base}{last}ed");
    }
    format!("{base}ed")
}

fn gerund(base: &str) -> String {
    if let Some(stem) = base.strip_suffix("ie") {
        return format!("{stem}ying");
    }
    if base.ends_with('e') && !base.ends_with("ee") && base != "be" {
        return format!("{}ing", &base[..base.len() - 1]);
    }
    if doubles_final(base) {
        let last = base.chars().last().unwrap_or_default();
        return format!("{base}{last}ing");
    }
    format!("{base}ing")
}

/// Split text into word, clitic and punctuation tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        let chunk = chunk.replace(['\u{2019}', '\u{2018}'], "'");
        let chars: Vec<char> = chunk.chars().collect();
        let is_edge = |c: &char| !c.is_alphanumeric() && *c != '$' && *c != '%';

        let start = chars.iter().position(|c| !is_edge(c)).unwrap_or(chars.len());
        let end = chars
            .iter()
            .rposition(|c| !is_edge(c))
            .map(|i| i + 1)
            .unwrap_or(start);

        tokens.extend(chars[..start].iter().map(char::to_string));
        if start < end {
            let core: String = chars[start..end].iter().collect();
            split_core(&core, &mut tokens);
        }
        tokens.extend(chars[end.max(start)..].iter().map(char::to_string));
    }
    tokens
}

fn split_core(core: &str, tokens: &mut Vec<String>) {
    let lower = core.to_lowercase();
    if lower.len() > 3 && lower.ends_with("n't") {
        split_hyphens(&core[..core.len() - 3], tokens);
        tokens.push(core[core.len() - 3..].to_string());
        return;
    }
    for clitic in ["'s", "'re", "'ll", "'ve", "'d", "'m"] {
        if lower.len() > clitic.len() && lower.ends_with(clitic) {
            let at = core.len() - clitic.len();
            split_hyphens(&core[..at], tokens);
            tokens.push(core[at..].to_string());
            return;
        }
    }
    split_hyphens(core, tokens);
}

fn split_hyphens(word: &str, tokens: &mut Vec<String>) {
    let mut parts = word.split('-').peekable();
    while let Some(part) = parts.next() {
        if !part.is_empty() {
            tokens.push(part.to_string());
        }
        if parts.peek().is_some() {
            tokens.push("-".to_string());
        }
    }
}

/// Lexicon and suffix based tagger.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    verbs: HashMap<String, Forms>,
}

impl Default for LexiconTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconTagger {
    pub fn new() -> Self {
        let mut verbs: HashMap<String, Forms> = HashMap::new();
        let mut add = |form: String, f: fn(&mut Forms)| f(verbs.entry(form).or_default());

        for &(base, past, participle) in IRREGULAR {
            add(base.to_string(), |f| f.base = true);
            add(third_person(base), |f| f.third = true);
            add(past.to_string(), |f| f.past = true);
            add(participle.to_string(), |f| f.participle = true);
            add(gerund(base), |f| f.gerund = true);
        }
        for &base in REGULAR {
            let past = regular_past(base);
            add(base.to_string(), |f| f.base = true);
            add(third_person(base), |f| f.third = true);
            add(past.clone(), |f| f.past = true);
            add(past, |f| f.participle = true);
            add(gerund(base), |f| f.gerund = true);
        }
        Self { verbs }
    }

    /// First-pass reading of `token`. A capital letter marks a proper noun
    /// only when `capital_is_proper` (not sentence-initial, not title case).
    fn lexical(&self, token: &str, capital_is_proper: bool) -> Lexical {
        let lower = token.to_lowercase();

        if !token.chars().any(char::is_alphanumeric) {
            return Lexical::Fixed(Tag::Punct);
        }
        if token.chars().any(|c| c.is_ascii_digit()) {
            return Lexical::Fixed(Tag::CD);
        }
        if lower == "'s" {
            return Lexical::Fixed(Tag::POS);
        }
        if lower == "to" {
            return Lexical::Fixed(Tag::TO);
        }
        if let Some((kind, tag)) = aux_reading(&lower) {
            return Lexical::Aux(kind, tag);
        }
        if DETERMINERS.contains(&lower.as_str()) {
            return Lexical::Fixed(Tag::DT);
        }
        if PRONOUNS.contains(&lower.as_str()) {
            return Lexical::Fixed(Tag::PRP);
        }
        if CONJUNCTIONS.contains(&lower.as_str()) {
            return Lexical::Fixed(Tag::CC);
        }
        if PREPOSITIONS.contains(&lower.as_str()) {
            return Lexical::Fixed(Tag::IN);
        }
        if ADVERBS.contains(&lower.as_str()) {
            return Lexical::Fixed(Tag::RB);
        }
        if PROPER_NAMES.contains(&token) {
            return Lexical::Noun {
                plural: false,
                proper: true,
            };
        }
        if let Some(forms) = self.verbs.get(&lower) {
            return Lexical::Verb(*forms);
        }
        if ADJECTIVES.contains(&lower.as_str()) {
            return Lexical::Fixed(Tag::JJ);
        }

        let proper = capital_is_proper && token.chars().next().is_some_and(char::is_uppercase);
        if lower.len() > 4 && lower.ends_with("ly") && !NOT_ADVERBS.contains(&lower.as_str()) {
            return Lexical::Fixed(Tag::RB);
        }
        if lower.len() > 4 && lower.ends_with("ed") && !proper {
            return Lexical::Verb(Forms {
                past: true,
                participle: true,
                ..Forms::default()
            });
        }
        if lower.len() > 5 && lower.ends_with("ing") && !proper {
            return Lexical::Verb(Forms {
                gerund: true,
                ..Forms::default()
            });
        }
        if !proper && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return Lexical::Fixed(Tag::JJ);
        }
        let plural = lower.len() > 3
            && lower.ends_with('s')
            && !lower.ends_with("ss")
            && !lower.ends_with("us")
            && !lower.ends_with("is");
        Lexical::Noun { plural, proper }
    }

    /// Is the next non-adverb token a verb an auxiliary of `kind` can govern?
    fn governs_verb(kind: AuxKind, rest: &[Lexical]) -> bool {
        let next = rest
            .iter()
            .find(|l| !matches!(l, Lexical::Fixed(Tag::RB)));
        match (kind, next) {
            (AuxKind::Have, Some(Lexical::Verb(f))) => f.participle,
            (AuxKind::Have, Some(Lexical::Aux(AuxKind::Be, Tag::VBN))) => true,
            (AuxKind::Do, Some(Lexical::Verb(f))) => f.base,
            (AuxKind::Do, Some(Lexical::Aux(AuxKind::Have, Tag::VBP))) => true,
            _ => false,
        }
    }
}

/// Context carried from the previous non-adverb token.
#[derive(Debug, Clone, Copy)]
struct Prev {
    tag: Tag,
    aux: Option<AuxKind>,
    first: bool,
}

/// Headlines in title case capitalize most words, so capitals say nothing
/// about proper nouns there.
fn is_title_case(words: &[String]) -> bool {
    let capitals: Vec<bool> = words
        .iter()
        .filter_map(|w| w.chars().next().filter(|c| c.is_alphabetic()))
        .map(char::is_uppercase)
        .collect();
    let upper = capitals.iter().filter(|&&c| c).count();
    capitals.len() >= 3 && upper * 3 >= capitals.len() * 2
}

/// Reading of an unknown word that sits between a bare subject and the start
/// of an object, as in "scientists uncover ancient ruins" or
/// "Microsoft acquires startup". Only used before any verb has been seen.
fn subject_verb(plural: bool, prev: Option<Prev>, next: Option<&Lexical>) -> Option<Tag> {
    let opens_object = matches!(
        next,
        Some(Lexical::Fixed(Tag::DT | Tag::JJ | Tag::PRP | Tag::CD) | Lexical::Noun { .. })
    );
    if !opens_object {
        return None;
    }
    match (plural, prev?) {
        (false, Prev { tag: Tag::NNS, .. }) => Some(Tag::VBP),
        (true, Prev { tag: Tag::NNP, .. }) => Some(Tag::VBZ),
        (true, Prev { tag: Tag::NN, first: true, .. }) => Some(Tag::VBZ),
        _ => None,
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, text: &str) -> Vec<Token> {
        let words = tokenize(text);
        let title_case = is_title_case(&words);
        let lexical: Vec<Lexical> = words
            .iter()
            .enumerate()
            .map(|(i, w)| self.lexical(w, i > 0 && !title_case))
            .collect();

        let mut out: Vec<Token> = Vec::with_capacity(words.len());
        let mut prev: Option<Prev> = None;
        let mut seen_verb = false;

        for (i, (word, lex)) in words.iter().zip(lexical.iter()).enumerate() {
            let after_modal_or_to = matches!(prev, Some(Prev { tag: Tag::MD | Tag::TO, .. }));

            let (tag, aux_kind) = match *lex {
                Lexical::Fixed(tag) => (tag, None),
                Lexical::Noun { proper: true, .. } => (Tag::NNP, None),
                Lexical::Noun { plural, .. } => {
                    let verb = if seen_verb {
                        None
                    } else {
                        subject_verb(plural, prev, lexical.get(i + 1))
                    };
                    let noun = if plural { Tag::NNS } else { Tag::NN };
                    (verb.unwrap_or(noun), None)
                }
                Lexical::Aux(AuxKind::Modal, tag) => (tag, Some(AuxKind::Modal)),
                Lexical::Aux(AuxKind::Be, tag) => {
                    let tag = if after_modal_or_to { Tag::VB } else { tag };
                    (tag, Some(AuxKind::Be))
                }
                Lexical::Aux(kind, tag) => {
                    let tag = if after_modal_or_to && tag != Tag::VBG {
                        Tag::VB
                    } else {
                        tag
                    };
                    let governs = Self::governs_verb(kind, &lexical[i + 1..]);
                    (tag, governs.then_some(kind))
                }
                Lexical::Verb(forms) => (resolve_verb(forms, prev, i == 0), None),
            };

            let aux = aux_kind.is_some();
            seen_verb |= tag.is_verb() || tag == Tag::MD;
            out.push(Token {
                text: word.clone(),
                tag,
                aux,
            });
            if tag != Tag::RB {
                prev = Some(Prev {
                    tag,
                    aux: aux_kind,
                    first: i == 0,
                });
            }
        }
        out
    }
}

fn resolve_verb(forms: Forms, prev: Option<Prev>, first: bool) -> Tag {
    debug_assert!(forms.any());
    match prev {
        Some(Prev { tag: Tag::MD | Tag::TO, .. }) if forms.base => return Tag::VB,
        Some(Prev {
            aux: Some(AuxKind::Do),
            ..
        }) if forms.base => return Tag::VB,
        Some(Prev {
            aux: Some(AuxKind::Have),
            ..
        }) if forms.participle => return Tag::VBN,
        Some(Prev {
            aux: Some(AuxKind::Be),
            ..
        }) => {
            if forms.gerund {
                return Tag::VBG;
            }
            if forms.participle {
                return Tag::VBN;
            }
        }
        _ => {}
    }

    let noun_context = first || prev.is_some_and(|p| p.tag.opens_noun_phrase());
    if noun_context {
        if forms.third {
            return Tag::NNS;
        }
        if forms.base {
            return Tag::NN;
        }
        if forms.gerund && !first {
            return Tag::NN;
        }
        if forms.past && !first {
            return Tag::JJ;
        }
    }

    let verb_context = prev.is_none_or(|p| p.tag.is_nominal() || p.tag.is_verb());
    if forms.third {
        Tag::VBZ
    } else if forms.base && verb_context {
        Tag::VBP
    } else if forms.past {
        Tag::VBD
    } else if forms.participle {
        Tag::VBN
    } else if forms.gerund {
        Tag::VBG
    } else {
        Tag::NN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<(String, Tag)> {
        LexiconTagger::new()
            .tag(text)
            .into_iter()
            .map(|t| (t.text, t.tag))
            .collect()
    }

    fn tag_of(text: &str, word: &str) -> Tag {
        tags(text)
            .into_iter()
            .find(|(w, _)| w == word)
            .map(|(_, t)| t)
            .unwrap_or_else(|| panic!("{word} not found in {text}"))
    }

    #[test]
    fn test_tokenize_splits_punctuation_and_clitics() {
        assert_eq!(
            tokenize("Biden's plan won't pass, critics say."),
            vec!["Biden", "'s", "plan", "wo", "n't", "pass", ",", "critics", "say", "."]
        );
        assert_eq!(tokenize("COVID-19 cases"), vec!["COVID", "-", "19", "cases"]);
        assert_eq!(tokenize("\"Quoted\""), vec!["\"", "Quoted", "\""]);
    }

    #[test]
    fn test_inflections() {
        assert_eq!(third_person("push"), "pushes");
        assert_eq!(third_person("rally"), "rallies");
        assert_eq!(third_person("vote"), "votes");
        assert_eq!(regular_past("ban"), "banned");
        assert_eq!(regular_past("deny"), "denied");
        assert_eq!(regular_past("vote"), "voted");
        assert_eq!(gerund("vote"), "voting");
        assert_eq!(gerund("stop"), "stopping");
        assert_eq!(gerund("die"), "dying");
    }

    #[test]
    fn test_present_tense_headline() {
        assert_eq!(tag_of("government announces new climate policy", "announces"), Tag::VBZ);
        assert_eq!(tag_of("protesters reject new election law", "reject"), Tag::VBP);
    }

    #[test]
    fn test_past_tense_headline() {
        assert_eq!(tag_of("storm destroyed homes across the coast", "destroyed"), Tag::VBD);
        assert_eq!(tag_of("team won the final last night", "won"), Tag::VBD);
        assert_eq!(tag_of("minister has resigned after scandal", "resigned"), Tag::VBN);
    }

    #[test]
    fn test_modal_governs_base_verb() {
        let tokens = LexiconTagger::new().tag("council will vote on the budget");
        assert_eq!(tokens[1].tag, Tag::MD);
        assert!(tokens[1].aux);
        assert_eq!(tokens[2].tag, Tag::VB);
        assert!(tokens[2].is_main_verb());
    }

    #[test]
    fn test_be_is_auxiliary() {
        let tokens = LexiconTagger::new().tag("the winner is clear");
        let is = tokens.iter().find(|t| t.text == "is").unwrap();
        assert_eq!(is.tag, Tag::VBZ);
        assert!(is.aux);
        assert!(!tokens.iter().any(Token::is_main_verb));
    }

    #[test]
    fn test_have_as_main_verb() {
        let tokens = LexiconTagger::new().tag("voters have doubts about the plan");
        let have = tokens.iter().find(|t| t.text == "have").unwrap();
        assert!(have.is_main_verb());
    }

    #[test]
    fn test_noun_readings_after_determiner() {
        assert_eq!(tag_of("the attack on the embassy", "attack"), Tag::NN);
        assert_eq!(tag_of("the votes were counted", "votes"), Tag::NNS);
    }

    #[test]
    fn test_unknown_words_use_suffixes() {
        assert_eq!(tag_of("officials quietly greenlit plans", "quietly"), Tag::RB);
        assert_eq!(tag_of("villagers relocated overnight", "relocated"), Tag::VBD);
        assert_eq!(tag_of("a dangerous storm", "dangerous"), Tag::JJ);
    }

    #[test]
    fn test_unknown_verb_between_subject_and_object() {
        let text = "scientists unearth ancient city beneath the desert";
        assert_eq!(tag_of(text, "unearth"), Tag::VBP);
        assert_eq!(tag_of(text, "beneath"), Tag::IN);
        assert_eq!(tag_of("Nvidia eclipses rivals in chip race", "eclipses"), Tag::VBZ);
        // Noun compounds stay nouns.
        assert_eq!(tag_of("weather update", "update"), Tag::NN);
        assert_eq!(tag_of("the best photos of the year", "photos"), Tag::NNS);
    }

    #[test]
    fn test_title_case_words_are_not_proper_nouns() {
        let text = "Researchers Unearth Ancient City Beneath The Desert";
        assert_eq!(tag_of(text, "Unearth"), Tag::VBP);
        assert_eq!(tag_of("Researchers Uncover Ancient City", "Uncover"), Tag::VBP);
        assert_eq!(tag_of("Voters in Ohio Uncover fraud", "Ohio"), Tag::NNP);
    }

    #[test]
    fn test_widened_lexicon() {
        let text = "Why the new pope matters for Catholics around the world";
        assert_eq!(tag_of(text, "matters"), Tag::VBZ);
        assert_eq!(tag_of(text, "new"), Tag::JJ);
        assert_eq!(tag_of(text, "Catholics"), Tag::NNP);
    }

    #[test]
    fn test_fed_is_a_name() {
        assert_eq!(tag_of("Fed Holds Rates Steady", "Fed"), Tag::NNP);
        assert_eq!(tag_of("Fed Holds Rates Steady", "Holds"), Tag::VBZ);
        assert_eq!(tag_of("protesters were fed by volunteers", "fed"), Tag::VBN);
    }

    #[test]
    fn test_alpha_tokens() {
        let tokens = LexiconTagger::new().tag("Tokyo 2020 games, finally!");
        let alpha: Vec<&str> = tokens
            .iter()
            .filter(|t| t.is_alpha())
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(alpha, vec!["Tokyo", "games", "finally"]);
    }
}
