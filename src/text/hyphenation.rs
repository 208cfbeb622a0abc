//! Line-end hyphenation heuristics for word pairs.
//!
//! Scanned text often splits words at line ends: "wonder-" on one line and
//! "ful" on the next should read "wonderful". A pair of words is treated as
//! hyphenated when the first ends with a continuation hyphen, the second
//! starts with a lowercase letter and the second is not a conjunction
//! ("pre- and post-processing" keeps its dash). Known compound prefixes keep
//! their hyphen and are glued instead ("self-" + "regulation").
//!
//! Soft hyphens (U+00AD) always mark a break opportunity and are never
//! compounds.

/// Soft hyphen.
pub const SOFT_HYPHEN: char = '\u{00AD}';

/// Conjunctions that follow a dangling hyphen in elliptic compounds.
const CONJUNCTIONS: &[&str] = &[
    "and", "or", "nor", "but", "as", "to", "und", "oder", "bzw", "sowie", "et", "ou", "y", "o", "e",
];

/// Prefixes whose hyphen belongs to the word.
const COMPOUND_PREFIXES: &[&str] = &[
    "self", "non", "anti", "pre", "post", "co", "ex", "multi", "semi", "sub", "super", "ultra",
    "cross", "inter", "intra", "counter", "mid", "well", "ill", "all", "half", "high", "low", "full",
];

/// How a line-end word pair should be rejoined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HyphenDecision {
    /// Drop the hyphen and join: "wonder-" + "ful" = "wonderful"
    Hyphenated,
    /// Keep the hyphen and join: "self-" + "regulation" = "self-regulation"
    Compound,
    /// Leave the words separate
    Separate,
}

/// Hyphenation handler for word pairs across line breaks.
#[derive(Debug, Clone)]
pub struct HyphenationHandler {
    /// Minimum length of the continuation word
    /// (prevents joining single letters that might be list markers)
    min_continuation_length: usize,

    /// Whether to keep hyphens of known compound prefixes
    preserve_compounds: bool,
}

impl Default for HyphenationHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl HyphenationHandler {
    /// Create a new hyphenation handler with default settings.
    pub fn new() -> Self {
        Self {
            min_continuation_length: 2,
            preserve_compounds: true,
        }
    }

    /// Set minimum continuation length for word joining.
    pub fn with_min_continuation_length(mut self, len: usize) -> Self {
        self.min_continuation_length = len;
        self
    }

    /// Set whether to preserve compound words.
    pub fn with_preserve_compounds(mut self, preserve: bool) -> Self {
        self.preserve_compounds = preserve;
        self
    }

    /// Check if a word ends with a continuation hyphen.
    ///
    /// A continuation hyphen is a soft hyphen or a hard hyphen (`-`) with a
    /// letter right before it; a lone dash or "123-" is not.
    pub fn is_continuation_hyphen(text: &str) -> bool {
        let trimmed = text.trim_end();
        let mut chars = trimmed.chars().rev();
        match chars.next() {
            Some('-') | Some(SOFT_HYPHEN) => chars.next().is_some_and(|c| c.is_alphabetic()),
            _ => false,
        }
    }

    /// The word without its trailing hyphen, if it has one.
    pub fn strip_hyphen(text: &str) -> &str {
        text.strip_suffix('-')
            .or_else(|| text.strip_suffix(SOFT_HYPHEN))
            .unwrap_or(text)
    }

    /// Whether a word is a conjunction that can follow an elliptic compound.
    pub fn is_conjunction(word: &str) -> bool {
        let lower = word.to_lowercase();
        CONJUNCTIONS.contains(&lower.as_str())
    }

    fn is_compound_prefix(first_part: &str) -> bool {
        let lower = first_part.to_lowercase();
        COMPOUND_PREFIXES.contains(&lower.as_str())
    }

    /// Decide how a word at a line end joins the first word of the next line.
    pub fn decide(&self, word: &str, next: &str) -> HyphenDecision {
        if !Self::is_continuation_hyphen(word) {
            return HyphenDecision::Separate;
        }
        if next.chars().count() < self.min_continuation_length
            || !next.chars().next().is_some_and(char::is_lowercase)
            || Self::is_conjunction(next)
        {
            return HyphenDecision::Separate;
        }
        let word = word.trim_end();
        let is_soft_hyphen = word.ends_with(SOFT_HYPHEN);
        if !is_soft_hyphen && self.preserve_compounds && Self::is_compound_prefix(Self::strip_hyphen(word)) {
            return HyphenDecision::Compound;
        }
        HyphenDecision::Hyphenated
    }

    /// Whether the pair should be joined with the hyphen dropped.
    pub fn should_join(&self, word: &str, next: &str) -> bool {
        self.decide(word, next) == HyphenDecision::Hyphenated
    }
}
