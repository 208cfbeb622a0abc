//! Words: the smallest layout unit.
//!
//! A word carries its recognized string, an immutable bounding box on its
//! page and its place in a logical text stream. Stream links are handles into
//! the owning [`Document`](crate::model::Document); all link mutation goes
//! through the document so that `prev.next == this` holds at all times.

use crate::geometry::BoundingBox;
use crate::model::attributes::{Attributed, Attributes};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stream type of ordinary body text.
pub const TEXT_STREAM_TYPE_MAIN: &str = "mainText";
/// Stream type of words tombstoned by an edit.
pub const TEXT_STREAM_TYPE_DELETED: &str = "deleted";
/// Stream type of running page titles (headers, footers).
pub const TEXT_STREAM_TYPE_PAGE_TITLE: &str = "pageTitle";
/// Stream type of layout artifacts (page numbers, noise).
pub const TEXT_STREAM_TYPE_ARTIFACT: &str = "artifact";
/// Stream type of footnotes.
pub const TEXT_STREAM_TYPE_FOOTNOTE: &str = "footnote";
/// Stream type of figure and table captions.
pub const TEXT_STREAM_TYPE_CAPTION: &str = "caption";

/// Handle of a word within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordId(pub(crate) u32);

impl WordId {
    /// Arena index of this word.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "word#{}", self.0)
    }
}

/// How a word's string concatenates with its successor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NextRelation {
    /// Separate words, whitespace in between
    #[default]
    Separate,
    /// Same token continues in the next word
    Continue,
    /// Word ends with a hyphen that joins it to the next word
    Hyphenated,
    /// Last word of a paragraph
    ParagraphEnd,
}

impl NextRelation {
    /// Single-character code used in attribute values.
    pub fn as_char(self) -> char {
        match self {
            NextRelation::Separate => 'S',
            NextRelation::Continue => 'C',
            NextRelation::Hyphenated => 'H',
            NextRelation::ParagraphEnd => 'P',
        }
    }

    /// Parse a single-character code.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(NextRelation::Separate),
            'C' => Some(NextRelation::Continue),
            'H' => Some(NextRelation::Hyphenated),
            'P' => Some(NextRelation::ParagraphEnd),
            _ => None,
        }
    }

    /// Whether the word and its successor belong to the same token.
    pub fn joins_token(self, join_hyphenation: bool) -> bool {
        match self {
            NextRelation::Continue => true,
            NextRelation::Hyphenated => join_hyphenation,
            _ => false,
        }
    }
}

impl fmt::Display for NextRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for NextRelation {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => NextRelation::from_char(c),
            _ => match s {
                "separate" => Some(NextRelation::Separate),
                "continue" => Some(NextRelation::Continue),
                "hyphenated" => Some(NextRelation::Hyphenated),
                "paragraphEnd" => Some(NextRelation::ParagraphEnd),
                _ => None,
            },
        }
        .ok_or_else(|| crate::Error::InvalidArgument(format!("unknown next relation '{}'", s)))
    }
}

/// Lifecycle of a word record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WordState {
    /// Live word
    #[default]
    Active,
    /// Tombstoned by an edit; kept so that outside references stay valid
    Deleted,
}

/// A recognized word anchored to a page.
#[derive(Debug, Clone)]
pub struct Word {
    pub(crate) id: WordId,
    pub(crate) page_id: u32,
    pub(crate) attached: bool,
    pub(crate) bounds: BoundingBox,
    pub(crate) string: String,
    pub(crate) prev: Option<WordId>,
    pub(crate) next: Option<WordId>,
    pub(crate) next_relation: NextRelation,
    pub(crate) stream_head: WordId,
    pub(crate) stream_pos: usize,
    pub(crate) stream_type: String,
    pub(crate) state: WordState,
    pub(crate) attributes: Attributes,
}

impl Word {
    pub(crate) fn new(id: WordId, page_id: u32, bounds: BoundingBox, string: String) -> Self {
        Self {
            id,
            page_id,
            attached: false,
            bounds,
            string,
            prev: None,
            next: None,
            next_relation: NextRelation::Separate,
            stream_head: id,
            stream_pos: 0,
            stream_type: TEXT_STREAM_TYPE_MAIN.to_string(),
            state: WordState::Active,
            attributes: Attributes::new(),
        }
    }

    /// Handle of this word.
    pub fn id(&self) -> WordId {
        self.id
    }

    /// Id of the page the word belongs to.
    pub fn page_id(&self) -> u32 {
        self.page_id
    }

    /// Whether the word is currently registered with its page.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Bounding box on the page.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Recognized string.
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Predecessor in the text stream.
    pub fn previous_word(&self) -> Option<WordId> {
        self.prev
    }

    /// Successor in the text stream.
    pub fn next_word(&self) -> Option<WordId> {
        self.next
    }

    /// Relation to the successor.
    pub fn next_relation(&self) -> NextRelation {
        self.next_relation
    }

    /// First word of the text stream this word belongs to.
    pub fn text_stream_head(&self) -> WordId {
        self.stream_head
    }

    /// Position within the stream; restarts at 0 on every page.
    pub fn text_stream_pos(&self) -> usize {
        self.stream_pos
    }

    /// Stream type shared by all words of the stream.
    pub fn text_stream_type(&self) -> &str {
        &self.stream_type
    }

    /// Lifecycle state.
    pub fn state(&self) -> WordState {
        self.state
    }

    /// Whether the word was tombstoned by an edit.
    pub fn is_deleted(&self) -> bool {
        self.state == WordState::Deleted
    }

    /// Page-local id, `"<pageId>.<bounds>"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use image_markup::geometry::BoundingBox;
    /// use image_markup::model::Document;
    ///
    /// let mut doc = Document::new("doc");
    /// doc.add_page(0, BoundingBox::new(0, 1000, 0, 1000)).unwrap();
    /// let w = doc.add_word(0, BoundingBox::new(100, 200, 100, 130), "Hello").unwrap();
    /// assert_eq!(doc.word(w).unwrap().local_id(), "0.[100,200,100,130]");
    /// ```
    pub fn local_id(&self) -> String {
        format!("{}.{}", self.page_id, self.bounds)
    }
}

impl Attributed for Word {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}
