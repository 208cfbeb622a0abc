//! Annotations projected onto token indices.
//!
//! The overlay mirrors document annotations that fall inside the sequence
//! and adds synthesized ones (pages, regions, paragraphs, tables, words).
//! Each entry remembers its first and last word; token indices are
//! recomputed after every swap, and deleted endpoint words are replaced by
//! the nearest surviving word inside the span before the swap happens.

use crate::config::SequenceConfig;
use crate::error::Result;
use crate::model::{AnnotationId, Attributes, Document, RegionId, WordId};
use crate::sequence::structure;
use crate::sequence::token_sequence::{TokenSequence, TokenSwap, TokenSwapObserver, TokenText};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Where an overlay annotation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationSource {
    /// A document annotation
    Document(AnnotationId),
    /// A layout region
    Region(RegionId),
    /// A page
    Page(u32),
    /// A paragraph emulated from whitespace
    Paragraph,
    /// A table region
    Table(RegionId),
    /// A table row region
    TableRow(RegionId),
    /// A table cell region
    TableCell(RegionId),
    /// A single word
    Word(WordId),
}

impl AnnotationSource {
    /// Whether the annotation is backed by a document annotation.
    pub fn is_document(&self) -> bool {
        matches!(self, AnnotationSource::Document(_))
    }
}

/// An annotation as the overlay tracks it.
#[derive(Debug, Clone)]
pub struct AnnotationBase {
    pub(crate) source: AnnotationSource,
    pub(crate) annotation_type: String,
    pub(crate) first_word: WordId,
    pub(crate) last_word: WordId,
    /// Member words of region-like entries, in sequence order
    pub(crate) members: Vec<WordId>,
    pub(crate) start_index: usize,
    /// Exclusive
    pub(crate) end_index: usize,
    pub(crate) top: i32,
    pub(crate) left: i32,
    pub(crate) serial: u64,
    pub(crate) attributes: Attributes,
}

impl AnnotationBase {
    pub(crate) fn new(
        doc: &Document,
        source: AnnotationSource,
        annotation_type: impl Into<String>,
        first_word: WordId,
        last_word: WordId,
    ) -> Self {
        let bounds = doc.words[first_word.index()].bounds;
        Self {
            source,
            annotation_type: annotation_type.into(),
            first_word,
            last_word,
            members: Vec::new(),
            start_index: 0,
            end_index: 0,
            top: bounds.top,
            left: bounds.left,
            serial: 0,
            attributes: Attributes::new(),
        }
    }

    pub(crate) fn with_members(mut self, members: Vec<WordId>) -> Self {
        self.members = members;
        self
    }

    pub(crate) fn with_attribute(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.set(name, value);
        self
    }

    /// Source of the annotation.
    pub fn source(&self) -> AnnotationSource {
        self.source
    }

    /// Annotation type.
    pub fn annotation_type(&self) -> &str {
        &self.annotation_type
    }

    /// Index of the first token.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Number of tokens covered.
    pub fn size(&self) -> usize {
        self.end_index - self.start_index
    }

    fn sort_key(&self) -> (usize, Reverse<usize>, i32, i32, u64) {
        (self.start_index, Reverse(self.end_index), self.top, self.left, self.serial)
    }

    /// Recompute token indices; false when an endpoint left the sequence.
    fn locate(&mut self, sequence: &TokenSequence) -> bool {
        match (
            sequence.token_of_word(self.first_word),
            sequence.token_of_word(self.last_word),
        ) {
            (Some(start), Some(last)) if start <= last => {
                self.start_index = start;
                self.end_index = last + 1;
                true
            },
            _ => false,
        }
    }
}

/// Read-only view of an overlay annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationView {
    /// Annotation type
    pub annotation_type: String,
    /// Index of the first token
    pub start_index: usize,
    /// Number of tokens
    pub size: usize,
    /// Character offset of the first token
    pub start_offset: usize,
    /// Character offset just past the last token's value
    pub end_offset: usize,
    /// Covered text
    pub value: String,
    /// Where the annotation comes from
    pub source: AnnotationSource,
    /// Attributes (the document annotation's for document entries)
    pub attributes: Attributes,
}

/// The annotations of a token sequence, ordered by start index, then by
/// decreasing end index, then by layout position.
#[derive(Debug, Clone)]
pub struct AnnotationOverlay {
    bases: Vec<AnnotationBase>,
    next_serial: u64,
    config: SequenceConfig,
}

impl AnnotationOverlay {
    /// Build the overlay of a freshly built sequence.
    pub fn build(doc: &Document, sequence: &TokenSequence, config: &SequenceConfig) -> Self {
        let mut overlay = Self {
            bases: Vec::new(),
            next_serial: 0,
            config: config.clone(),
        };
        for base in doc.annotations().into_iter().filter_map(|id| document_base(doc, id)) {
            overlay.push(base, sequence);
        }
        for base in structure::synthesize(doc, sequence, config) {
            overlay.push(base, sequence);
        }
        overlay.resort();
        log::debug!("Built overlay of {} annotations", overlay.bases.len());
        overlay
    }

    fn push(&mut self, mut base: AnnotationBase, sequence: &TokenSequence) -> bool {
        if !base.locate(sequence) {
            return false;
        }
        base.serial = self.next_serial;
        self.next_serial += 1;
        self.bases.push(base);
        true
    }

    fn resort(&mut self) {
        self.bases.sort_by_key(|b| b.sort_key());
    }

    /// Mirror a document annotation; false unless both endpoints are in the
    /// sequence.
    pub fn add_document_annotation(&mut self, doc: &Document, sequence: &TokenSequence, id: AnnotationId) -> bool {
        let Some(base) = document_base(doc, id) else {
            return false;
        };
        let added = self.push(base, sequence);
        if added {
            self.resort();
        }
        added
    }

    /// Drop the mirror of a document annotation.
    pub fn remove_document_annotation(&mut self, id: AnnotationId) -> bool {
        let before = self.bases.len();
        self.bases.retain(|b| b.source != AnnotationSource::Document(id));
        self.bases.len() != before
    }

    /// Overlay entries in order.
    pub fn bases(&self) -> &[AnnotationBase] {
        &self.bases
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Whether the overlay is empty.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Render an entry against the sequence.
    pub fn view(&self, doc: &Document, sequence: &TokenSequence, base: &AnnotationBase) -> AnnotationView {
        let start_offset = sequence
            .token(base.start_index)
            .map_or(0, |t| t.start_offset());
        let end_offset = sequence
            .token(base.end_index.saturating_sub(1))
            .map_or(start_offset, |t| t.end_offset());
        let attributes = match base.source {
            AnnotationSource::Document(id) => doc
                .annotation(id)
                .map(|a| a.attributes.clone())
                .unwrap_or_default(),
            _ => base.attributes.clone(),
        };
        AnnotationView {
            annotation_type: base.annotation_type.clone(),
            start_index: base.start_index,
            size: base.size(),
            start_offset,
            end_offset,
            value: sequence.text_between(base.start_index, base.end_index),
            source: base.source,
            attributes,
        }
    }

    /// Entries of the given type.
    pub fn of_type<'a>(&'a self, annotation_type: &'a str) -> impl Iterator<Item = &'a AnnotationBase> + 'a {
        self.bases
            .iter()
            .filter(move |b| b.annotation_type == annotation_type)
    }

    /// Entries covering the token at `index`.
    pub fn covering(&self, index: usize) -> impl Iterator<Item = &AnnotationBase> + '_ {
        self.bases
            .iter()
            .take_while(move |b| b.start_index <= index)
            .filter(move |b| index < b.end_index)
    }
}

fn document_base(doc: &Document, id: AnnotationId) -> Option<AnnotationBase> {
    let annotation = doc.annotation(id)?;
    Some(AnnotationBase::new(
        doc,
        AnnotationSource::Document(id),
        annotation.annotation_type.as_str(),
        annotation.first_word,
        annotation.last_word,
    ))
}

impl TokenSwapObserver for AnnotationOverlay {
    fn before_swap(&mut self, doc: &mut Document, sequence: &TokenSequence, swap: &TokenSwap) -> Result<()> {
        if swap.deleted_words.is_empty() {
            return Ok(());
        }
        let deleted: HashSet<WordId> = swap.deleted_words.iter().copied().collect();
        let mut kept = Vec::with_capacity(self.bases.len());
        for mut base in std::mem::take(&mut self.bases) {
            match base.source {
                AnnotationSource::Word(w) if deleted.contains(&w) => continue,
                AnnotationSource::Word(_) | AnnotationSource::Paragraph => {
                    kept.push(base);
                    continue;
                },
                _ => {},
            }
            let touched = deleted.contains(&base.first_word)
                || deleted.contains(&base.last_word)
                || base.members.iter().any(|w| deleted.contains(w));
            if !touched {
                kept.push(base);
                continue;
            }
            base.members.retain(|w| !deleted.contains(w));
            let span: Vec<WordId> = if base.members.is_empty() {
                sequence.tokens()[base.start_index..base.end_index.min(sequence.size())]
                    .iter()
                    .flat_map(|t| t.words().iter().copied())
                    .filter(|w| !deleted.contains(w))
                    .collect()
            } else {
                base.members.clone()
            };
            let endpoints = match (span.first(), span.last()) {
                (Some(&first), Some(&last)) => Some((
                    if deleted.contains(&base.first_word) { first } else { base.first_word },
                    if deleted.contains(&base.last_word) { last } else { base.last_word },
                )),
                _ => None,
            };
            let moved = match (base.source, endpoints) {
                (AnnotationSource::Document(id), Some((first, last))) => doc.set_annotation_words(id, first, last)?,
                (_, Some(_)) => true,
                (_, None) => false,
            };
            match endpoints {
                Some((first, last)) if moved => {
                    base.first_word = first;
                    base.last_word = last;
                    kept.push(base);
                },
                _ => {
                    if let AnnotationSource::Document(id) = base.source {
                        log::debug!("Removing annotation {} emptied by edit", id);
                        doc.remove_annotation(id);
                    }
                },
            }
        }
        self.bases = kept;
        Ok(())
    }

    fn after_swap(&mut self, doc: &Document, sequence: &TokenSequence, _swap: &TokenSwap) {
        if self.config.normalization.emulates_paragraphs() {
            self.bases.retain(|b| b.source != AnnotationSource::Paragraph);
            for base in structure::paragraph_bases(doc, sequence) {
                self.push(base, sequence);
            }
        }
        self.bases.retain_mut(|b| b.locate(sequence));
        if self.config.show_word_annotations {
            let present: HashSet<WordId> = self
                .bases
                .iter()
                .filter_map(|b| match b.source {
                    AnnotationSource::Word(w) => Some(w),
                    _ => None,
                })
                .collect();
            let missing: Vec<WordId> = sequence.words().filter(|w| !present.contains(w)).collect();
            for w in missing {
                self.push(structure::word_base(doc, w), sequence);
            }
        }
        self.resort();
    }
}
