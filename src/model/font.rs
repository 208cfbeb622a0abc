//! Fonts recognized in the page images.

use crate::model::attributes::{Attributed, Attributes};
use bitflags::bitflags;
use image::GrayImage;
use std::collections::BTreeMap;

bitflags! {
    /// Font style flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        /// Bold weight
        const BOLD = 0b0001;
        /// Italic or oblique
        const ITALIC = 0b0010;
        /// Serif face
        const SERIF = 0b0100;
        /// Fixed pitch
        const MONOSPACED = 0b1000;
    }
}

/// A single glyph of a font.
#[derive(Debug, Clone)]
pub struct Glyph {
    /// Font-local character id
    pub id: i32,
    /// Unicode string the glyph represents
    pub unicode: String,
    /// Optional glyph bitmap
    pub image: Option<GrayImage>,
}

/// A font with its glyphs.
#[derive(Debug, Clone)]
pub struct Font {
    pub(crate) name: String,
    pub(crate) style: FontStyle,
    pub(crate) glyphs: BTreeMap<i32, Glyph>,
    pub(crate) attributes: Attributes,
}

impl Font {
    /// Create a font without glyphs.
    pub fn new(name: impl Into<String>, style: FontStyle) -> Self {
        Self {
            name: name.into(),
            style,
            glyphs: BTreeMap::new(),
            attributes: Attributes::new(),
        }
    }

    /// Font name, unique within a document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Style flags.
    pub fn style(&self) -> FontStyle {
        self.style
    }

    /// Add or replace a glyph.
    pub fn add_glyph(&mut self, id: i32, unicode: impl Into<String>, image: Option<GrayImage>) {
        self.glyphs.insert(
            id,
            Glyph {
                id,
                unicode: unicode.into(),
                image,
            },
        );
    }

    /// Glyph by id.
    pub fn glyph(&self, id: i32) -> Option<&Glyph> {
        self.glyphs.get(&id)
    }

    /// Glyphs in id order.
    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values()
    }

    /// Map a string of glyph ids to its Unicode text; unknown ids are skipped.
    pub fn decode(&self, ids: &[i32]) -> String {
        ids.iter()
            .filter_map(|id| self.glyphs.get(id))
            .map(|g| g.unicode.as_str())
            .collect()
    }
}

impl Attributed for Font {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}
