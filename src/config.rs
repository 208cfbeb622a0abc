//! Configuration for token sequence construction and per-document settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document property selecting the tokenizer by registered name.
pub const PROPERTY_TOKENIZER: &str = "tokenizer";

/// Document property selecting the reading orientation.
pub const PROPERTY_ORIENTATION: &str = "orientation";

/// How many layout distinctions survive when the word graph is flattened
/// into a token sequence.
///
/// Levels are ordered: each level includes the normalizations of the ones
/// before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum NormalizationLevel {
    /// Strict layout order; only deleted streams are filtered out.
    Raw,
    /// Layout order with hyphenated words joined.
    Words,
    /// Paragraph breaks emulated from next relations; page titles and
    /// artifacts filtered out.
    #[default]
    Paragraphs,
    /// Whole logical streams kept contiguous across pages.
    Streams,
}

impl NormalizationLevel {
    /// Whether hyphenated word pairs are joined into one token.
    pub fn joins_hyphenation(self) -> bool {
        self >= NormalizationLevel::Words
    }

    /// Whether paragraph structure is emulated.
    pub fn emulates_paragraphs(self) -> bool {
        self >= NormalizationLevel::Paragraphs
    }
}

/// Reading orientation of the document's script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Lines run left to right, top down.
    #[default]
    LeftRightTopDown,
    /// Lines run right to left, top down.
    RightLeftTopDown,
}

impl Orientation {
    /// Property value for this orientation.
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::LeftRightTopDown => "left-right-top-down",
            Orientation::RightLeftTopDown => "right-left-top-down",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "left-right-top-down" | "ltr" => Ok(Orientation::LeftRightTopDown),
            "right-left-top-down" | "rtl" => Ok(Orientation::RightLeftTopDown),
            other => Err(crate::Error::InvalidArgument(format!("unknown orientation '{}'", other))),
        }
    }
}

/// Token sequence configuration.
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    /// Normalization level.
    pub normalization: NormalizationLevel,

    /// Show one overlay annotation per word.
    pub show_word_annotations: bool,

    /// Synthesize region and page annotations (raw and word levels).
    pub synthesize_regions: bool,

    /// Synthesize table, row and cell annotations.
    pub synthesize_tables: bool,

    /// Rewrite line-end hyphenation relations before building paragraphs.
    pub repair_hyphenation: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            normalization: NormalizationLevel::default(),
            show_word_annotations: false,
            synthesize_regions: true,
            synthesize_tables: true,
            repair_hyphenation: true,
        }
    }

    /// Set the normalization level.
    pub fn with_normalization(mut self, level: NormalizationLevel) -> Self {
        self.normalization = level;
        self
    }

    /// Enable word-level overlay annotations.
    pub fn with_word_annotations(mut self, enable: bool) -> Self {
        self.show_word_annotations = enable;
        self
    }

    /// Enable region and page annotation synthesis.
    pub fn with_regions(mut self, enable: bool) -> Self {
        self.synthesize_regions = enable;
        self
    }

    /// Enable table structure synthesis.
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.synthesize_tables = enable;
        self
    }

    /// Enable the paragraph-level hyphenation repair.
    pub fn with_hyphenation_repair(mut self, enable: bool) -> Self {
        self.repair_hyphenation = enable;
        self
    }

    /// Stream types filtered out at the configured level.
    pub fn excluded_stream_types(&self) -> &'static [&'static str] {
        use crate::model::word::{
            TEXT_STREAM_TYPE_ARTIFACT, TEXT_STREAM_TYPE_DELETED, TEXT_STREAM_TYPE_PAGE_TITLE,
        };
        if self.normalization.emulates_paragraphs() {
            &[
                TEXT_STREAM_TYPE_DELETED,
                TEXT_STREAM_TYPE_PAGE_TITLE,
                TEXT_STREAM_TYPE_ARTIFACT,
            ]
        } else {
            &[TEXT_STREAM_TYPE_DELETED]
        }
    }
}
