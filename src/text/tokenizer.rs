//! Tokenizers used to segment word strings into tokens.
//!
//! A document picks its tokenizer by name through the `tokenizer` document
//! property. Two tokenizers are registered out of the box: `default`
//! (words, numbers and single punctuation marks) and `whitespace`.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, RwLock};

/// Name of [`DefaultTokenizer`] in the registry.
pub const DEFAULT_TOKENIZER_NAME: &str = "default";
/// Name of [`WhitespaceTokenizer`] in the registry.
pub const WHITESPACE_TOKENIZER_NAME: &str = "whitespace";

/// Splits text into tokens.
pub trait Tokenizer: Send + Sync + fmt::Debug {
    /// Registry name.
    fn name(&self) -> &str;

    /// Byte ranges of the tokens in `text`, in order, never overlapping.
    fn tokenize(&self, text: &str) -> Vec<Range<usize>>;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize {
        self.tokenize(text).len()
    }
}

lazy_static! {
    /// Letters with inner apostrophes, numbers with inner separators, or any
    /// other single non-space character.
    static ref RE_TOKEN: Regex =
        Regex::new(r"[\p{L}\p{M}]+(?:['\x{2019}][\p{L}\p{M}]+)*|\p{N}+(?:[.,]\p{N}+)*|[^\s\p{L}\p{M}\p{N}]").unwrap();

    static ref REGISTRY: RwLock<HashMap<String, Arc<dyn Tokenizer>>> = {
        let mut tokenizers: HashMap<String, Arc<dyn Tokenizer>> = HashMap::new();
        tokenizers.insert(DEFAULT_TOKENIZER_NAME.to_string(), Arc::new(DefaultTokenizer));
        tokenizers.insert(WHITESPACE_TOKENIZER_NAME.to_string(), Arc::new(WhitespaceTokenizer));
        RwLock::new(tokenizers)
    };
}

/// Word, number and punctuation tokenizer.
///
/// # Examples
///
/// ```
/// use image_markup::text::{DefaultTokenizer, Tokenizer};
///
/// let text = "Don't pay 1,000.50 $!";
/// let tokens: Vec<&str> = DefaultTokenizer.tokenize(text).into_iter().map(|r| &text[r]).collect();
/// assert_eq!(tokens, vec!["Don't", "pay", "1,000.50", "$", "!"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokenizer;

impl Tokenizer for DefaultTokenizer {
    fn name(&self) -> &str {
        DEFAULT_TOKENIZER_NAME
    }

    fn tokenize(&self, text: &str) -> Vec<Range<usize>> {
        RE_TOKEN.find_iter(text).map(|m| m.range()).collect()
    }
}

/// Tokenizer that splits on whitespace only.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn name(&self) -> &str {
        WHITESPACE_TOKENIZER_NAME
    }

    fn tokenize(&self, text: &str) -> Vec<Range<usize>> {
        let mut tokens = Vec::new();
        let mut start = None;
        for (i, c) in text.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    tokens.push(s..i);
                    start = None;
                },
                (false, None) => start = Some(i),
                _ => {},
            }
        }
        if let Some(s) = start {
            tokens.push(s..text.len());
        }
        tokens
    }
}

/// The tokenizer used when a document does not name one.
pub fn default_tokenizer() -> Arc<dyn Tokenizer> {
    Arc::new(DefaultTokenizer)
}

/// Look up a registered tokenizer.
pub fn tokenizer_by_name(name: &str) -> Option<Arc<dyn Tokenizer>> {
    REGISTRY.read().ok().and_then(|registry| registry.get(name).cloned())
}

/// Register a tokenizer under its own name, replacing any previous one.
pub fn register_tokenizer(tokenizer: Arc<dyn Tokenizer>) {
    if let Ok(mut registry) = REGISTRY.write() {
        log::debug!("Registering tokenizer '{}'", tokenizer.name());
        registry.insert(tokenizer.name().to_string(), tokenizer);
    }
}
