//! Editable text view over a document.

use crate::config::SequenceConfig;
use crate::error::{Error, Result};
use crate::model::{AnnotationId, Document};
use crate::sequence::builder::{prepare_paragraphs, SequenceScope};
use crate::sequence::overlay::{AnnotationOverlay, AnnotationSource, AnnotationView};
use crate::sequence::token::ImToken;
use crate::sequence::token_sequence::{TokenSequence, TokenText};

/// A document seen as a token sequence with an annotation overlay.
///
/// Character edits go through [`DocumentRoot::set_chars`], which rewrites
/// the underlying words and keeps the overlay in step. Changes made to the
/// document directly are picked up by [`DocumentRoot::refresh`].
///
/// # Example
///
/// ```
/// use image_markup::config::SequenceConfig;
/// use image_markup::geometry::BoundingBox;
/// use image_markup::model::Document;
/// use image_markup::sequence::{DocumentRoot, TokenText};
///
/// let mut doc = Document::new("note");
/// doc.add_page(0, BoundingBox::new(0, 800, 0, 1100)).unwrap();
/// let hello = doc.add_word(0, BoundingBox::new(100, 160, 100, 130), "Hello").unwrap();
/// let world = doc.add_word(0, BoundingBox::new(172, 232, 100, 130), "wrld").unwrap();
/// doc.set_next_word(hello, Some(world)).unwrap();
///
/// let mut root = DocumentRoot::new(&mut doc, SequenceConfig::new()).unwrap();
/// assert_eq!(root.text(), "Hello wrld");
/// root.set_chars("world", 6, 4).unwrap();
/// assert_eq!(root.text(), "Hello world");
/// assert_eq!(root.document().word(world).unwrap().string(), "world");
/// ```
pub struct DocumentRoot<'d> {
    doc: &'d mut Document,
    scope: SequenceScope,
    config: SequenceConfig,
    sequence: TokenSequence,
    overlay: AnnotationOverlay,
}

impl<'d> DocumentRoot<'d> {
    /// View the whole document.
    pub fn new(doc: &'d mut Document, config: SequenceConfig) -> Result<Self> {
        Self::for_scope(doc, SequenceScope::Document, config)
    }

    /// View part of a document.
    pub fn for_scope(doc: &'d mut Document, scope: SequenceScope, config: SequenceConfig) -> Result<Self> {
        if config.normalization.emulates_paragraphs() {
            prepare_paragraphs(doc, &config)?;
        }
        let sequence = TokenSequence::build(doc, &scope, &config);
        let overlay = AnnotationOverlay::build(doc, &sequence, &config);
        Ok(Self {
            doc,
            scope,
            config,
            sequence,
            overlay,
        })
    }

    /// Rebuild the sequence and overlay from the document.
    pub fn refresh(&mut self) -> Result<()> {
        if self.config.normalization.emulates_paragraphs() {
            prepare_paragraphs(&mut *self.doc, &self.config)?;
        }
        self.sequence = TokenSequence::build(&*self.doc, &self.scope, &self.config);
        self.overlay = AnnotationOverlay::build(&*self.doc, &self.sequence, &self.config);
        Ok(())
    }

    /// The underlying document.
    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// Direct access to the document; call [`DocumentRoot::refresh`] after
    /// structural changes.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut *self.doc
    }

    /// Configuration of the view.
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// The token sequence.
    pub fn sequence(&self) -> &TokenSequence {
        &self.sequence
    }

    /// Tokens of the sequence.
    pub fn tokens(&self) -> &[ImToken] {
        self.sequence.tokens()
    }

    /// The annotation overlay.
    pub fn overlay(&self) -> &AnnotationOverlay {
        &self.overlay
    }

    /// All overlay annotations in order.
    pub fn annotations(&self) -> Vec<AnnotationView> {
        self.overlay
            .bases()
            .iter()
            .map(|b| self.overlay.view(&*self.doc, &self.sequence, b))
            .collect()
    }

    /// Overlay annotations of one type.
    pub fn annotations_of_type(&self, annotation_type: &str) -> Vec<AnnotationView> {
        self.overlay
            .of_type(annotation_type)
            .map(|b| self.overlay.view(&*self.doc, &self.sequence, b))
            .collect()
    }

    /// Overlay annotations covering the token at `index`.
    pub fn annotations_at(&self, index: usize) -> Vec<AnnotationView> {
        self.overlay
            .covering(index)
            .map(|b| self.overlay.view(&*self.doc, &self.sequence, b))
            .collect()
    }

    /// Annotate `size` tokens starting at token `start`.
    ///
    /// The annotation is created in the document. Returns `None` when the
    /// tokens span more than one text stream.
    pub fn add_annotation(&mut self, annotation_type: &str, start: usize, size: usize) -> Result<Option<AnnotationView>> {
        if size == 0 || start.checked_add(size).map_or(true, |end| end > self.sequence.size()) {
            return Err(Error::InvalidArgument(format!(
                "token range {}+{} outside sequence of {} tokens",
                start,
                size,
                self.sequence.size()
            )));
        }
        let first = self.sequence.tokens()[start].first_word();
        let last = self.sequence.tokens()[start + size - 1].last_word();
        let (Some(first), Some(last)) = (first, last) else {
            return Ok(None);
        };
        let Some(id) = self.doc.add_annotation(first, last, annotation_type)? else {
            return Ok(None);
        };
        self.overlay
            .add_document_annotation(&*self.doc, &self.sequence, id);
        Ok(self
            .overlay
            .bases()
            .iter()
            .find(|b| b.source() == AnnotationSource::Document(id))
            .map(|b| self.overlay.view(&*self.doc, &self.sequence, b)))
    }

    /// Remove a document annotation and its overlay entry.
    pub fn remove_annotation(&mut self, id: AnnotationId) -> bool {
        self.overlay.remove_document_annotation(id);
        self.doc.remove_annotation(id)
    }

    /// Replace `length` characters at `offset` with `text`.
    ///
    /// See [`TokenSequence::set_chars`].
    pub fn set_chars(&mut self, text: &str, offset: usize, length: usize) -> Result<()> {
        self.sequence
            .set_chars(&mut *self.doc, text, offset, length, &mut self.overlay)
    }
}

impl TokenText for DocumentRoot<'_> {
    fn size(&self) -> usize {
        self.sequence.size()
    }

    fn value_at(&self, index: usize) -> &str {
        self.sequence.value_at(index)
    }

    fn whitespace_after(&self, index: usize) -> &str {
        self.sequence.whitespace_after(index)
    }
}
