//! The Image Markup document model.
//!
//! A [`Document`] holds pages; pages hold words and layout regions; words
//! are threaded into logical text streams; annotations mark typed spans of
//! words within one stream. Fonts and binary supplements hang off the
//! document.
//!
//! # Example
//!
//! ```
//! use image_markup::geometry::BoundingBox;
//! use image_markup::model::Document;
//!
//! let mut doc = Document::new("letter");
//! doc.add_page(0, BoundingBox::new(0, 800, 0, 1100)).unwrap();
//! let hello = doc.add_word(0, BoundingBox::new(100, 180, 100, 130), "Hello").unwrap();
//! let world = doc.add_word(0, BoundingBox::new(190, 270, 100, 130), "world").unwrap();
//! doc.set_next_word(hello, Some(world)).unwrap();
//!
//! let greeting = doc.add_annotation(hello, world, "greeting").unwrap().unwrap();
//! assert_eq!(doc.annotation_value(greeting), "Hello world");
//! assert_eq!(doc.word_at(0, 200, 110), Some(world));
//! ```

pub mod annotation;
mod annotation_index;
pub mod attributes;
pub mod document;
pub mod events;
pub mod font;
mod linkage;
pub mod order;
pub mod page;
pub mod region;
pub mod supplement;
pub mod word;
pub(crate) mod word_grid;

pub use annotation::{annotation_uid, Annotation, AnnotationId};
pub use attributes::{AttributeValue, Attributed, Attributes, VirtualAttribute};
pub use document::Document;
pub use events::{ChangeEvent, ChangeLog, DocumentListener, Target};
pub use font::{Font, FontStyle, Glyph};
pub use order::{layout_order, tolerant_sort};
pub use page::Page;
pub use region::{region_types, Region, RegionId};
pub use supplement::{BytesProvider, DataProvider, Supplement, SupplementKind};
pub use word::{
    NextRelation, Word, WordId, WordState, TEXT_STREAM_TYPE_ARTIFACT, TEXT_STREAM_TYPE_CAPTION,
    TEXT_STREAM_TYPE_DELETED, TEXT_STREAM_TYPE_FOOTNOTE, TEXT_STREAM_TYPE_MAIN, TEXT_STREAM_TYPE_PAGE_TITLE,
};
