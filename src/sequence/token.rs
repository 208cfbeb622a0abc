//! Tokens of the text-sequence view.

use crate::model::WordId;

/// A token: one or more words rendered as a single string, followed by the
/// whitespace that separates it from the next token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImToken {
    pub(crate) words: Vec<WordId>,
    /// Characters each word contributes to `value`, parallel to `words`.
    pub(crate) word_lens: Vec<usize>,
    pub(crate) value: String,
    pub(crate) whitespace: String,
    pub(crate) start_offset: usize,
}

impl ImToken {
    pub(crate) fn new(words: Vec<WordId>, word_lens: Vec<usize>, value: String) -> Self {
        Self {
            words,
            word_lens,
            value,
            whitespace: String::new(),
            start_offset: 0,
        }
    }

    /// Words making up this token, in stream order.
    pub fn words(&self) -> &[WordId] {
        &self.words
    }

    /// First word of the token.
    pub fn first_word(&self) -> Option<WordId> {
        self.words.first().copied()
    }

    /// Last word of the token.
    pub fn last_word(&self) -> Option<WordId> {
        self.words.last().copied()
    }

    /// Token string.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whitespace following the token.
    pub fn whitespace(&self) -> &str {
        &self.whitespace
    }

    /// Character offset of the token in the sequence text.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Token length in characters.
    pub fn char_len(&self) -> usize {
        self.word_lens.iter().sum()
    }

    /// Character offset just past the token value.
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.char_len()
    }

    /// Length of token plus whitespace, in characters.
    pub(crate) fn span_len(&self) -> usize {
        self.char_len() + self.whitespace.chars().count()
    }

    /// Same content as another token, offsets aside.
    pub(crate) fn same_content(&self, other: &ImToken) -> bool {
        self.words == other.words && self.value == other.value && self.whitespace == other.whitespace
    }
}
