//! Shallow part-of-speech tagging.
//!
//! Lines are tokenized Treebank-style (punctuation and clitics split off) and
//! each token receives a Penn Treebank tag from a closed-class lexicon, a
//! table of common verb forms, and suffix rules for open-class words. The
//! tagger is deliberately small: it only needs to be good enough to produce
//! the nine per-line category counts used as classifier features.
//!
//! ```text
//! "Installing the new system"  ->  VBG DT JJ NN
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TagError;

// ---------------------------------------------------------------------------
// Tags and categories
// ---------------------------------------------------------------------------

/// Penn Treebank part-of-speech tags.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    CC,
    CD,
    DT,
    EX,
    IN,
    JJ,
    JJR,
    JJS,
    MD,
    NN,
    NNS,
    NNP,
    NNPS,
    PDT,
    POS,
    PRP,
    PRPS,
    RB,
    RBR,
    RBS,
    TO,
    UH,
    VB,
    VBD,
    VBG,
    VBN,
    VBP,
    VBZ,
    WDT,
    WP,
    WPS,
    WRB,
    /// Punctuation and symbols.
    Punct,
}

impl Tag {
    /// The grammatical bucket this tag is counted under, if any.
    pub fn category(self) -> Option<PosCategory> {
        use Tag::*;
        match self {
            VB | VBD | VBG | VBN | VBP | VBZ => Some(PosCategory::Verb),
            NN | NNS | NNP | NNPS => Some(PosCategory::Noun),
            JJ | JJR | JJS => Some(PosCategory::Adjective),
            RB | RBR | RBS => Some(PosCategory::Adverb),
            PRP | PRPS | WP | WPS => Some(PosCategory::Pronoun),
            CD => Some(PosCategory::Cardinal),
            CC => Some(PosCategory::Conjunction),
            PDT => Some(PosCategory::Predeterminer),
            UH => Some(PosCategory::Interjection),
            _ => None,
        }
    }

    fn is_verb(self) -> bool {
        matches!(self.category(), Some(PosCategory::Verb))
    }
}

/// The nine categories counted per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosCategory {
    Verb,
    Noun,
    Adjective,
    Adverb,
    Pronoun,
    Cardinal,
    Conjunction,
    Predeterminer,
    Interjection,
}

/// Per-line part-of-speech counts.
///
/// Field names match the feature manifest so the struct can be flattened
/// straight into a serialized line record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosCounts {
    pub num_verbs: u32,
    pub num_nouns: u32,
    pub num_adjectives: u32,
    pub num_adverbs: u32,
    pub num_pronouns: u32,
    pub num_cardinals: u32,
    pub num_conjunctions: u32,
    pub num_predeterminers: u32,
    pub num_interjections: u32,
}

impl PosCounts {
    pub fn add(&mut self, category: PosCategory) {
        let slot = match category {
            PosCategory::Verb => &mut self.num_verbs,
            PosCategory::Noun => &mut self.num_nouns,
            PosCategory::Adjective => &mut self.num_adjectives,
            PosCategory::Adverb => &mut self.num_adverbs,
            PosCategory::Pronoun => &mut self.num_pronouns,
            PosCategory::Cardinal => &mut self.num_cardinals,
            PosCategory::Conjunction => &mut self.num_conjunctions,
            PosCategory::Predeterminer => &mut self.num_predeterminers,
            PosCategory::Interjection => &mut self.num_interjections,
        };
        *slot += 1;
    }

    pub fn from_tags(tags: &[Tag]) -> Self {
        let mut counts = Self::default();
        for category in tags.iter().filter_map(|t| t.category()) {
            counts.add(category);
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Clitic suffixes split off the end of a word token.
const CLITICS: &[&str] = &["n't", "'s", "'re", "'ve", "'ll", "'d", "'m"];

/// Split text into word, number, and punctuation tokens.
///
/// Curly apostrophes are folded to `'`. Contractions are split the way the
/// Penn Treebank does (`don't` -> `do` `n't`, `system's` -> `system` `'s`).
pub fn tokenize(text: &str) -> Vec<String> {
    static RE_TOKEN: OnceLock<Regex> = OnceLock::new();
    let re = RE_TOKEN.get_or_init(|| {
        Regex::new(concat!(
            r"\p{N}+(?:[.,]\p{N}+)*",
            r"|\p{L}[\p{L}\p{M}\p{N}]*(?:[-'][\p{L}\p{N}]+)*",
            r"|[^\s\p{L}\p{N}]",
        ))
        .unwrap()
    });

    let folded = text.replace(['\u{2019}', '\u{2018}'], "'");
    let mut tokens = Vec::new();
    for m in re.find_iter(&folded) {
        let word = m.as_str();
        match split_clitic(word) {
            Some((base, clitic)) => {
                tokens.push(base.to_string());
                tokens.push(clitic.to_string());
            }
            None => tokens.push(word.to_string()),
        }
    }
    tokens
}

fn split_clitic(word: &str) -> Option<(&str, &str)> {
    for clitic in CLITICS {
        let Some(cut) = word.len().checked_sub(clitic.len()) else {
            continue;
        };
        if cut > 0 && word.is_char_boundary(cut) && word[cut..].eq_ignore_ascii_case(clitic) {
            return Some((&word[..cut], &word[cut..]));
        }
    }
    None
}

fn is_word_token(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

// ---------------------------------------------------------------------------
// Lexicon
// ---------------------------------------------------------------------------

const LEXICON: &[(Tag, &[&str])] = &[
    (Tag::CC, &["and", "or", "but", "nor", "yet", "plus", "&"]),
    (
        Tag::DT,
        &[
            "the", "a", "an", "this", "these", "those", "each", "every", "either", "neither",
            "another", "any", "some", "no",
        ],
    ),
    (Tag::PDT, &["all", "both", "half", "such"]),
    (
        Tag::IN,
        &[
            "of", "in", "on", "at", "by", "for", "from", "with", "about", "above", "across",
            "after", "against", "along", "among", "around", "as", "before", "behind", "below",
            "beneath", "beside", "between", "beyond", "despite", "during", "except", "inside",
            "into", "like", "near", "onto", "outside", "over", "per", "since", "than", "that",
            "through", "throughout", "toward", "towards", "under", "underneath", "unlike",
            "until", "upon", "via", "within", "without", "whether", "if", "because", "although",
            "though", "while", "whereas", "unless",
        ],
    ),
    (Tag::TO, &["to"]),
    (
        Tag::MD,
        &[
            "can", "could", "may", "might", "must", "shall", "should", "will", "would", "'ll",
            "'d",
        ],
    ),
    (
        Tag::PRP,
        &[
            "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "myself",
            "yourself", "himself", "herself", "itself", "ourselves", "themselves",
        ],
    ),
    (Tag::PRPS, &["my", "your", "his", "its", "our", "their", "her"]),
    (Tag::WDT, &["which", "whatever", "whichever"]),
    (Tag::WP, &["who", "whom", "what", "whoever"]),
    (Tag::WPS, &["whose"]),
    (
        Tag::WRB,
        &["how", "when", "where", "why", "whenever", "wherever"],
    ),
    (
        Tag::RB,
        &[
            "not", "n't", "very", "also", "too", "so", "just", "only", "then", "now", "here",
            "always", "never", "often", "sometimes", "already", "still", "even", "again",
            "almost", "quite", "rather", "well", "however", "therefore", "thus", "perhaps",
            "soon", "ever", "instead", "together", "away", "back", "once", "twice", "else",
            "further", "furthermore", "moreover", "hence", "indeed", "up", "out", "off", "down",
        ],
    ),
    (Tag::RBR, &["more"]),
    (Tag::RBS, &["most", "least"]),
    (
        Tag::JJ,
        &[
            "good", "new", "first", "last", "long", "great", "little", "own", "other", "old",
            "right", "big", "high", "different", "small", "large", "next", "early", "young",
            "important", "few", "public", "bad", "same", "able", "many", "much", "several",
            "full", "key", "main", "general", "specific", "final", "major", "basic", "current",
            "additional", "various", "free", "possible", "real", "simple", "clear", "certain",
            "strong", "whole", "true", "available", "recent", "second", "third",
        ],
    ),
    (
        Tag::JJR,
        &[
            "better", "worse", "larger", "smaller", "higher", "lower", "greater", "bigger",
            "older", "newer", "earlier", "later", "fewer", "less",
        ],
    ),
    (
        Tag::JJS,
        &[
            "best", "worst", "largest", "smallest", "highest", "lowest", "greatest", "biggest",
            "latest",
        ],
    ),
    (
        Tag::UH,
        &[
            "oh", "ah", "wow", "hey", "hello", "hi", "yes", "alas", "oops", "ouch", "hmm", "uh",
            "um", "okay", "ok", "please", "thanks", "hooray", "bravo",
        ],
    ),
    (
        Tag::CD,
        &[
            "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
            "ten", "eleven", "twelve", "twenty", "thirty", "forty", "fifty", "hundred",
            "thousand", "million", "billion",
        ],
    ),
    (Tag::VBZ, &["is", "has", "does"]),
    (Tag::VBP, &["are", "am", "have", "do", "'re", "'ve", "'m"]),
    (
        Tag::VBD,
        &[
            "was", "were", "had", "did", "said", "went", "got", "made", "knew", "thought",
            "took", "saw", "came", "gave", "told", "felt", "became", "left", "meant", "kept",
            "began", "brought", "wrote", "stood", "lost", "paid", "met", "led", "understood",
            "spoke", "spent", "grew", "won", "bought", "sent", "built", "fell", "ran", "found",
        ],
    ),
    (
        Tag::VBN,
        &[
            "been", "gone", "known", "taken", "seen", "given", "written", "begun", "spoken",
            "grown", "shown", "done", "fallen", "chosen", "driven", "eaten",
        ],
    ),
    (Tag::VBG, &["being", "having", "doing"]),
    (Tag::VB, &["be"]),
];

/// Regular base-form verbs whose inflections are recognised by suffix.
const BASE_VERBS: &[&str] = &[
    "say", "go", "get", "make", "know", "think", "take", "see", "come", "want", "look", "use",
    "find", "give", "tell", "work", "call", "try", "ask", "need", "feel", "become", "leave",
    "put", "mean", "keep", "let", "begin", "seem", "help", "show", "hear", "play", "run",
    "move", "live", "believe", "bring", "happen", "write", "provide", "sit", "stand", "lose",
    "pay", "meet", "include", "continue", "learn", "change", "lead", "understand", "watch",
    "follow", "stop", "create", "speak", "read", "allow", "add", "spend", "grow", "open",
    "walk", "win", "offer", "remember", "consider", "appear", "buy", "wait", "serve", "send",
    "expect", "build", "stay", "fall", "cut", "reach", "remain", "suggest", "raise", "pass",
    "sell", "require", "decide", "describe", "define", "apply", "ensure", "develop", "submit",
    "explain", "identify", "select", "install", "configure", "complete", "register", "prepare",
    "enter", "click", "choose", "check", "obtain", "receive", "contain", "achieve", "improve",
];

/// Suffixes that mark adjectives.
const ADJECTIVE_SUFFIXES: &[&str] = &[
    "able", "ible", "ous", "ful", "ive", "ical", "ic", "less", "ish", "ary", "al",
];

/// Suffixes that mark nouns.
const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ment", "ness", "ity", "ance", "ence", "ship", "ism", "ist", "ogy", "age",
    "ure", "ery", "er", "or",
];

// ---------------------------------------------------------------------------
// PosTagger
// ---------------------------------------------------------------------------

/// Owned part-of-speech tagger.
///
/// Construct once with [`PosTagger::new`] and share by reference (it is
/// `Send + Sync`). Construction builds the lexicon hash tables, a one-time
/// cost of a few hundred insertions; tagging itself allocates only the token
/// list.
#[derive(Debug, Clone)]
pub struct PosTagger {
    lexicon: HashMap<&'static str, Tag>,
    base_verbs: HashSet<&'static str>,
}

impl Default for PosTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl PosTagger {
    pub fn new() -> Self {
        let mut lexicon = HashMap::new();
        for (tag, words) in LEXICON {
            for word in *words {
                lexicon.entry(*word).or_insert(*tag);
            }
        }
        let base_verbs = BASE_VERBS.iter().copied().collect();
        Self {
            lexicon,
            base_verbs,
        }
    }

    /// Tag every token of `text`.
    ///
    /// Returns [`TagError::NoTokens`] when the text holds no word or number
    /// token at all (pure punctuation, empty input).
    pub fn tag(&self, text: &str) -> Result<Vec<(String, Tag)>, TagError> {
        let tokens = tokenize(text);
        if !tokens.iter().any(|t| is_word_token(t)) {
            return Err(TagError::NoTokens(text.to_string()));
        }

        let mut tagged: Vec<(String, Tag)> = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let prev = tagged.last().map(|(w, t): &(String, Tag)| (w.as_str(), *t));
            let next = tokens.get(i + 1).map(String::as_str);
            let tag = self.tag_token(token, i, prev, next);
            tagged.push((token.clone(), tag));
        }
        Ok(tagged)
    }

    /// Tag `text` and bucket the tags into [`PosCounts`].
    pub fn counts(&self, text: &str) -> Result<PosCounts, TagError> {
        let tags: Vec<Tag> = self.tag(text)?.into_iter().map(|(_, t)| t).collect();
        Ok(PosCounts::from_tags(&tags))
    }

    fn tag_token(
        &self,
        token: &str,
        index: usize,
        prev: Option<(&str, Tag)>,
        next: Option<&str>,
    ) -> Tag {
        if !is_word_token(token) {
            return if token == "&" { Tag::CC } else { Tag::Punct };
        }
        if token.starts_with(|c: char| c.is_numeric()) {
            return Tag::CD;
        }

        let lower = token.to_lowercase();
        let prev_tag = prev.map(|(_, t)| t);

        if lower == "'s" {
            return match prev_tag {
                Some(Tag::PRP) | Some(Tag::EX) | Some(Tag::WP) => Tag::VBZ,
                _ => Tag::POS,
            };
        }
        if lower == "there" {
            return if next.is_some_and(|n| self.is_be_form(n)) {
                Tag::EX
            } else {
                Tag::RB
            };
        }
        if let Some(&tag) = self.lexicon.get(lower.as_str()) {
            return self.adjust_closed_class(tag, next);
        }

        if let Some(tag) = self.verb_form(&lower, index, prev) {
            return tag;
        }

        let capitalized = token.starts_with(|c: char| c.is_uppercase());
        if capitalized && index > 0 {
            return if token.len() > 3 && token.ends_with('s') && !is_upper_word(token) {
                Tag::NNPS
            } else {
                Tag::NNP
            };
        }
        if is_upper_word(token) && token.chars().count() > 1 {
            return Tag::NNP;
        }

        suffix_tag(&lower, prev)
    }

    /// Context fixes for ambiguous closed-class words.
    fn adjust_closed_class(&self, tag: Tag, next: Option<&str>) -> Tag {
        let next_lower = next.map(str::to_lowercase);
        let next_is_word = next.is_some_and(is_word_token);
        match tag {
            // "all the", "both these" -> predeterminer; bare "all" -> determiner.
            Tag::PDT => match next_lower.as_deref() {
                Some(n) if self.lexicon.get(n) == Some(&Tag::DT)
                    || self.lexicon.get(n) == Some(&Tag::PRPS) =>
                {
                    Tag::PDT
                }
                _ => Tag::DT,
            },
            // "her" before a word is possessive, otherwise an object pronoun.
            Tag::PRPS if !next_is_word => Tag::PRP,
            _ => tag,
        }
    }

    fn is_be_form(&self, word: &str) -> bool {
        matches!(
            word.to_lowercase().as_str(),
            "is" | "are" | "was" | "were" | "be" | "been" | "'s" | "'re"
        )
    }

    /// Recognise inflections of known base verbs.
    fn verb_form(&self, lower: &str, index: usize, prev: Option<(&str, Tag)>) -> Option<Tag> {
        let prev_tag = prev.map(|(_, t)| t);
        let after_determiner = matches!(prev_tag, Some(Tag::DT) | Some(Tag::PRPS) | Some(Tag::JJ));

        if self.base_verbs.contains(lower) {
            if after_determiner {
                return Some(Tag::NN);
            }
            return Some(match prev_tag {
                Some(Tag::TO) | Some(Tag::MD) => Tag::VB,
                None if index == 0 => Tag::VB,
                Some(Tag::PRP) | Some(Tag::NNS) => Tag::VBP,
                _ => Tag::VB,
            });
        }

        if let Some(stem) = strip_verb_s(lower) {
            if self.base_verbs.contains(stem) {
                return Some(if after_determiner { Tag::NNS } else { Tag::VBZ });
            }
        }

        if let Some(stem) = strip_suffix_variants(lower, "ing") {
            if stem.iter().any(|s| self.base_verbs.contains(s.as_str())) {
                return Some(Tag::VBG);
            }
        }

        if let Some(stem) = strip_suffix_variants(lower, "ed") {
            if stem.iter().any(|s| self.base_verbs.contains(s.as_str())) {
                return Some(past_form(prev));
            }
        }

        None
    }
}

fn is_upper_word(token: &str) -> bool {
    token.chars().any(char::is_alphabetic) && token.to_uppercase() == token
}

/// `requires` -> `require`, `applies` -> `apply`, `watches` -> `watch`.
fn strip_verb_s(word: &str) -> Option<&str> {
    if word.len() < 3 || !word.ends_with('s') || word.ends_with("ss") {
        return None;
    }
    // The caller only accepts stems present in the verb table, so returning
    // the plain `-s` stem covers `uses`, `makes`, `provides`.
    Some(&word[..word.len() - 1])
}

/// Candidate stems for `word` minus `suffix`: the bare stem, the stem plus
/// `e` (`using` -> `use`), the stem with a doubled final consonant removed
/// (`running` -> `run`), and `ied` -> `y` (`applied` -> `apply`).
fn strip_suffix_variants(word: &str, suffix: &str) -> Option<Vec<String>> {
    let stem = word.strip_suffix(suffix)?;
    if stem.len() < 2 {
        return None;
    }
    let mut variants = vec![stem.to_string(), format!("{stem}e")];
    let mut tail = stem.chars().rev();
    if let (Some(last), Some(before)) = (tail.next(), tail.next()) {
        if last == before {
            variants.push(stem[..stem.len() - last.len_utf8()].to_string());
        }
    }
    if suffix == "ed" {
        if let Some(root) = stem.strip_suffix('i') {
            variants.push(format!("{root}y"));
        }
    }
    Some(variants)
}

/// `-ed` forms are participles after a form of *have* or *be*, past tense
/// otherwise.
fn past_form(prev: Option<(&str, Tag)>) -> Tag {
    match prev {
        Some((word, _))
            if matches!(
                word.to_lowercase().as_str(),
                "has" | "have" | "had" | "is" | "are" | "was" | "were" | "be" | "been" | "being"
            ) =>
        {
            Tag::VBN
        }
        Some((_, tag)) if tag.is_verb() => Tag::VBN,
        _ => Tag::VBD,
    }
}

/// Open-class fallback driven by word endings.
fn suffix_tag(lower: &str, prev: Option<(&str, Tag)>) -> Tag {
    let len = lower.chars().count();

    if len > 4 && lower.ends_with("ly") {
        return Tag::RB;
    }
    if len > 5 && lower.ends_with("ing") {
        return Tag::VBG;
    }
    if len > 4 && lower.ends_with("ed") {
        return past_form(prev);
    }
    if len > 4 && NOUN_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return Tag::NN;
    }
    if len > 4 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return Tag::JJ;
    }
    if len > 3
        && lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return Tag::NNS;
    }
    Tag::NN
}
