//! The flat token sequence and character-level editing.

use crate::config::SequenceConfig;
use crate::error::{Error, Result};
use crate::model::{Document, NextRelation, WordId, WordState, TEXT_STREAM_TYPE_DELETED};
use crate::sequence::builder::{collect_words, group_tokens, whitespace_between, SequenceScope};
use crate::sequence::token::ImToken;
use crate::text::alignment::map_new_to_old;
use crate::text::hyphenation::{HyphenationHandler, SOFT_HYPHEN};
use std::collections::HashMap;
use std::ops::Range;

/// Read access to a sequence of tokens as text.
pub trait TokenText {
    /// Number of tokens.
    fn size(&self) -> usize;

    /// Token string at `index`; empty when out of range.
    fn value_at(&self, index: usize) -> &str;

    /// Whitespace after the token at `index`; empty when out of range.
    fn whitespace_after(&self, index: usize) -> &str;

    /// Full text: every token followed by its whitespace.
    fn text(&self) -> String {
        let mut text = String::new();
        for i in 0..self.size() {
            text.push_str(self.value_at(i));
            text.push_str(self.whitespace_after(i));
        }
        text
    }

    /// Text of tokens `start..end`, without the whitespace after the last.
    fn text_between(&self, start: usize, end: usize) -> String {
        let end = end.min(self.size());
        let mut text = String::new();
        for i in start..end {
            text.push_str(self.value_at(i));
            if i + 1 < end {
                text.push_str(self.whitespace_after(i));
            }
        }
        text
    }
}

/// A replaced range of tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSwap {
    /// Index of the first replaced token
    pub start: usize,
    /// Number of tokens removed
    pub removed: usize,
    /// Number of tokens inserted in their place
    pub inserted: usize,
    /// Words deleted by the edit
    pub deleted_words: Vec<WordId>,
}

/// Observer of token replacements.
///
/// `before_swap` sees the sequence as it was, with the document already
/// updated; `after_swap` sees the new sequence.
pub trait TokenSwapObserver {
    /// Called before the tokens are replaced.
    fn before_swap(&mut self, doc: &mut Document, sequence: &TokenSequence, swap: &TokenSwap) -> Result<()>;

    /// Called once the new tokens are in place.
    fn after_swap(&mut self, doc: &Document, sequence: &TokenSequence, swap: &TokenSwap);
}

impl TokenSwapObserver for () {
    fn before_swap(&mut self, _doc: &mut Document, _sequence: &TokenSequence, _swap: &TokenSwap) -> Result<()> {
        Ok(())
    }

    fn after_swap(&mut self, _doc: &Document, _sequence: &TokenSequence, _swap: &TokenSwap) {}
}

/// The words of a scope flattened into tokens with synthesized whitespace.
#[derive(Debug, Clone)]
pub struct TokenSequence {
    tokens: Vec<ImToken>,
    word_tokens: HashMap<WordId, usize>,
    config: SequenceConfig,
}

impl TokenSequence {
    /// Build the sequence for a scope of a document.
    pub fn build(doc: &Document, scope: &SequenceScope, config: &SequenceConfig) -> Self {
        let words = collect_words(doc, scope, config);
        let tokens = group_tokens(doc, &words, config);
        log::debug!(
            "Built token sequence of {} tokens from {} words ({:?})",
            tokens.len(),
            words.len(),
            config.normalization
        );
        let mut sequence = Self {
            tokens,
            word_tokens: HashMap::new(),
            config: config.clone(),
        };
        sequence.reindex();
        sequence
    }

    fn reindex(&mut self) {
        self.word_tokens.clear();
        let mut offset = 0;
        for (i, token) in self.tokens.iter_mut().enumerate() {
            token.start_offset = offset;
            offset += token.span_len();
            for &w in &token.words {
                self.word_tokens.insert(w, i);
            }
        }
    }

    /// All tokens.
    pub fn tokens(&self) -> &[ImToken] {
        &self.tokens
    }

    /// Token at `index`.
    pub fn token(&self, index: usize) -> Option<&ImToken> {
        self.tokens.get(index)
    }

    /// Configuration the sequence was built with.
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Index of the token containing `word`.
    pub fn token_of_word(&self, word: WordId) -> Option<usize> {
        self.word_tokens.get(&word).copied()
    }

    /// Position of a word: its token index and its index within the token.
    pub fn word_position(&self, word: WordId) -> Option<(usize, usize)> {
        let token = self.token_of_word(word)?;
        let within = self.tokens[token].words.iter().position(|w| *w == word)?;
        Some((token, within))
    }

    /// Words of the sequence in order.
    pub fn words(&self) -> impl Iterator<Item = WordId> + '_ {
        self.tokens.iter().flat_map(|t| t.words.iter().copied())
    }

    /// Total length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.start_offset + t.span_len())
    }

    /// Index of the token whose value or trailing whitespace covers the
    /// character `offset`.
    pub fn token_at_offset(&self, offset: usize) -> Option<usize> {
        if offset >= self.char_len() {
            return None;
        }
        Some(self.span_index_at(offset))
    }

    fn span_index_at(&self, offset: usize) -> usize {
        let index = self
            .tokens
            .partition_point(|t| t.start_offset + t.span_len() <= offset);
        index.min(self.tokens.len().saturating_sub(1))
    }

    /// Replace `length` characters at `offset` with `text` and reconcile the
    /// underlying words.
    ///
    /// The edit window is widened to whole tokens, across tokens glued
    /// without whitespace, and over the following token when the edit
    /// reaches into whitespace. The new window text is split on whitespace into
    /// runs; each run is assigned a contiguous range of the window's words by
    /// aligning it against the old text, so an edit inside a word changes
    /// only that word. Words left without characters are deleted from their
    /// stream. Fails with [`Error::TooManyTokens`] when the document's
    /// tokenizer finds more tokens in the new window text than the window
    /// has words; the document is then left untouched.
    pub fn set_chars(
        &mut self,
        doc: &mut Document,
        text: &str,
        offset: usize,
        length: usize,
        observer: &mut dyn TokenSwapObserver,
    ) -> Result<()> {
        let total = self.char_len();
        if offset > total {
            return Err(Error::InvalidArgument(format!(
                "offset {} past end of text of length {}",
                offset, total
            )));
        }
        let end = offset.saturating_add(length).min(total);
        if self.tokens.is_empty() {
            let tokens = doc.tokenizer().count(text);
            if tokens == 0 {
                return Ok(());
            }
            return Err(Error::TooManyTokens { tokens, words: 0 });
        }

        let n = self.tokens.len();
        let mut s = self.span_index_at(offset);
        let mut e = if end > offset { self.span_index_at(end - 1) } else { s };
        while s > 0 && self.tokens[s - 1].whitespace.is_empty() {
            s -= 1;
        }
        if e + 1 < n && offset.max(end) > self.tokens[e].end_offset() {
            e += 1;
        }
        while e + 1 < n && self.tokens[e].whitespace.is_empty() {
            e += 1;
        }

        let window = EditWindow::capture(doc, &self.tokens[s..=e], &self.config);
        let rel_start = offset - self.tokens[s].start_offset;
        let rel_end = end - self.tokens[s].start_offset;
        let new_chars: Vec<char> = window.chars[..rel_start]
            .iter()
            .copied()
            .chain(text.chars())
            .chain(window.chars[rel_end..].iter().copied())
            .collect();
        if new_chars == window.chars {
            return Ok(());
        }

        let leading = new_chars.iter().take_while(|c| c.is_whitespace()).count();
        let runs = whitespace_runs(&new_chars[leading..]);
        let k = window.words.len();
        let new_text: String = new_chars.iter().collect();
        let token_count = doc.tokenizer().count(&new_text).max(runs.len());
        if token_count > k {
            return Err(Error::TooManyTokens {
                tokens: token_count,
                words: k,
            });
        }
        log::debug!(
            "Edit at {}+{} rewrites tokens {}..={} ({} words into {} runs)",
            offset,
            length,
            s,
            e,
            k,
            runs.len()
        );

        let plan = window.assign(&new_chars, leading, &runs, doc);
        plan.apply(doc, &window)?;

        let survivors: Vec<WordId> = (0..k)
            .filter(|&w| !plan.strings[w].is_empty())
            .map(|w| window.words[w])
            .collect();
        let mut new_tokens = group_tokens(doc, &survivors, &self.config);
        if let Some(last) = new_tokens.last_mut() {
            last.whitespace = match self.tokens.get(e + 1) {
                Some(next) => whitespace_between(doc, last, next, &self.config),
                None => String::new(),
            };
        }
        if s > 0 {
            if new_tokens.is_empty() {
                let whitespace = match self.tokens.get(e + 1) {
                    Some(next) => whitespace_between(doc, &self.tokens[s - 1], next, &self.config),
                    None => String::new(),
                };
                self.tokens[s - 1].whitespace = whitespace;
            } else if leading > 0 {
                self.tokens[s - 1].whitespace.extend(&new_chars[..leading]);
            }
        }

        let old = &self.tokens[s..=e];
        let prefix = old
            .iter()
            .zip(&new_tokens)
            .take_while(|(a, b)| a.same_content(b))
            .count();
        let max_suffix = old.len().min(new_tokens.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new_tokens.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a.same_content(b))
            .count();
        let swap = TokenSwap {
            start: s + prefix,
            removed: old.len() - prefix - suffix,
            inserted: new_tokens.len() - prefix - suffix,
            deleted_words: plan.deleted.clone(),
        };

        observer.before_swap(doc, self, &swap)?;
        let inserted: Vec<ImToken> = new_tokens.drain(prefix..new_tokens.len() - suffix).collect();
        self.tokens.splice(swap.start..swap.start + swap.removed, inserted);
        self.reindex();
        observer.after_swap(doc, self, &swap);
        Ok(())
    }
}

impl TokenText for TokenSequence {
    fn size(&self) -> usize {
        self.tokens.len()
    }

    fn value_at(&self, index: usize) -> &str {
        self.tokens.get(index).map_or("", |t| t.value.as_str())
    }

    fn whitespace_after(&self, index: usize) -> &str {
        self.tokens.get(index).map_or("", |t| t.whitespace.as_str())
    }
}

/// Non-whitespace runs of a character slice.
fn whitespace_runs(chars: &[char]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        runs.push(start..i);
    }
    runs
}

/// Snapshot of the tokens being edited.
struct EditWindow {
    words: Vec<WordId>,
    chars: Vec<char>,
    /// Word (index into `words`) owning each char; `None` for whitespace.
    owners: Vec<Option<usize>>,
    relations: Vec<NextRelation>,
    /// Hyphen dropped from a word when it was joined to its successor.
    stripped_hyphens: Vec<Option<char>>,
    joins_hyphenation: bool,
}

/// New strings and relations for the words of a window.
struct EditPlan {
    strings: Vec<String>,
    relations: Vec<Option<NextRelation>>,
    deleted: Vec<WordId>,
}

impl EditWindow {
    fn capture(doc: &Document, tokens: &[ImToken], config: &SequenceConfig) -> Self {
        let joins_hyphenation = config.normalization.joins_hyphenation();
        let mut window = Self {
            words: Vec::new(),
            chars: Vec::new(),
            owners: Vec::new(),
            relations: Vec::new(),
            stripped_hyphens: Vec::new(),
            joins_hyphenation,
        };
        for token in tokens {
            let mut chars = token.value.chars();
            for (i, (&w, &len)) in token.words.iter().zip(&token.word_lens).enumerate() {
                let word = &doc.words[w.index()];
                let owner = window.words.len();
                window.words.push(w);
                window.relations.push(word.next_relation);
                let joined = i + 1 < token.words.len();
                let stripped = if joined && joins_hyphenation && word.next_relation == NextRelation::Hyphenated {
                    word.string.chars().last().filter(|c| *c == '-' || *c == SOFT_HYPHEN)
                } else {
                    None
                };
                window.stripped_hyphens.push(stripped);
                for c in chars.by_ref().take(len) {
                    window.chars.push(c);
                    window.owners.push(Some(owner));
                }
            }
            for c in token.whitespace.chars() {
                window.chars.push(c);
                window.owners.push(None);
            }
        }
        window
    }

    /// Distribute the new text over the window's words.
    fn assign(&self, new_chars: &[char], leading: usize, runs: &[Range<usize>], doc: &Document) -> EditPlan {
        let body = &new_chars[leading..];
        let k = self.words.len();
        let m = runs.len();
        let mapping = map_new_to_old(&self.chars, new_chars);
        let mut owners: Vec<Option<usize>> = body
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if c.is_whitespace() {
                    None
                } else {
                    mapping[leading + i].and_then(|o| self.owners[o])
                }
            })
            .collect();
        for run in runs {
            let mut last = None;
            for i in run.clone() {
                if owners[i].is_some() {
                    last = owners[i];
                } else {
                    owners[i] = last;
                }
            }
            let mut next = None;
            for i in run.clone().rev() {
                if owners[i].is_some() {
                    next = owners[i];
                } else {
                    owners[i] = next;
                }
            }
        }

        let mut strings = vec![String::new(); k];
        let mut run_of_word: Vec<Option<usize>> = vec![None; k];
        let mut prev_end: Option<usize> = None;
        for (j, run) in runs.iter().enumerate() {
            let lower = prev_end.map_or(0, |p| p + 1);
            let upper = k - (m - j);
            let owned = || run.clone().filter_map(|i| owners[i]);
            let start = owned().min().unwrap_or(lower).clamp(lower, upper);
            let end = owned().max().unwrap_or(start).clamp(start, upper);
            let mut current = start;
            for i in run.clone() {
                let w = owners[i].unwrap_or(current).clamp(start, end).max(current);
                current = w;
                strings[w].push(body[i]);
                run_of_word[w] = Some(j);
            }
            prev_end = Some(end);
        }

        let survivors: Vec<usize> = (0..k).filter(|&w| !strings[w].is_empty()).collect();
        let deleted: Vec<WordId> = (0..k)
            .filter(|&w| strings[w].is_empty())
            .map(|w| self.words[w])
            .collect();

        let tokenizer = doc.tokenizer();
        let mut relations = vec![None; k];
        for pair in survivors.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let old = self.relations[a];
            let relation = if run_of_word[a] == run_of_word[b] {
                if let (NextRelation::Hyphenated, Some(hyphen)) = (old, self.stripped_hyphens[a]) {
                    strings[a].push(hyphen);
                    NextRelation::Hyphenated
                } else if matches!(old, NextRelation::Separate | NextRelation::ParagraphEnd)
                    && tokenizer.count(&format!("{}{}", strings[a], strings[b]))
                        == tokenizer.count(&strings[a]) + tokenizer.count(&strings[b])
                {
                    NextRelation::Separate
                } else {
                    NextRelation::Continue
                }
            } else {
                let gap = gap_between(body, runs, run_of_word[a], run_of_word[b]);
                if old == NextRelation::ParagraphEnd && gap.contains(&'\n') {
                    NextRelation::ParagraphEnd
                } else if old == NextRelation::Hyphenated
                    && !self.joins_hyphenation
                    && HyphenationHandler::is_continuation_hyphen(&strings[a])
                {
                    NextRelation::Hyphenated
                } else {
                    NextRelation::Separate
                }
            };
            relations[a] = Some(relation);
        }
        if let Some(&last) = survivors.last() {
            if last + 1 < k {
                relations[last] = Some(self.relations[k - 1]);
            }
        }

        EditPlan {
            strings,
            relations,
            deleted,
        }
    }
}

fn gap_between<'a>(body: &'a [char], runs: &[Range<usize>], a: Option<usize>, b: Option<usize>) -> &'a [char] {
    match (a, b) {
        (Some(a), Some(b)) if a < b => &body[runs[a].end..runs[b].start],
        _ => &[],
    }
}

impl EditPlan {
    fn apply(&self, doc: &mut Document, window: &EditWindow) -> Result<()> {
        for &w in &self.deleted {
            let (prev, next) = {
                let word = doc.check_word(w)?;
                (word.prev, word.next)
            };
            match prev {
                Some(p) => doc.set_next_word(p, next)?,
                None => {
                    if let Some(n) = next {
                        doc.set_previous_word(n, None)?;
                    }
                },
            }
            doc.set_next_word(w, None)?;
            doc.set_text_stream_type(w, TEXT_STREAM_TYPE_DELETED)?;
            doc.words[w.index()].state = WordState::Deleted;
        }
        for (i, string) in self.strings.iter().enumerate() {
            if !string.is_empty() {
                doc.set_word_string(window.words[i], string.as_str())?;
            }
        }
        let survivors: Vec<usize> = (0..window.words.len())
            .filter(|&i| !self.strings[i].is_empty())
            .collect();
        for (pos, &i) in survivors.iter().enumerate() {
            let Some(relation) = self.relations[i] else {
                continue;
            };
            let word = window.words[i];
            let linked = match survivors.get(pos + 1) {
                Some(&j) => doc.words[word.index()].next == Some(window.words[j]),
                None => true,
            };
            if linked {
                doc.set_next_relation(word, relation)?;
            }
        }
        Ok(())
    }
}
