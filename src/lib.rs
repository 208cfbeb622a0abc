// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::explicit_auto_deref)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # Image Markup
//!
//! In-memory document model for text recognized on page images, with an
//! editable plain-text view.
//!
//! ## Core Features
//!
//! ### Document Model
//! - **Pages and Words**: words with bounding boxes, indexed per page for point and box queries
//! - **Text Streams**: words threaded into logical streams across pages, with typed stream heads
//! - **Regions**: typed rectangular layout groupings (blocks, paragraphs, tables, cells)
//! - **Annotations**: typed word spans within one stream, indexed by type, endpoint, page and uid
//! - **Attributes**: per-entity key-value bags with virtual attributes routed to real fields
//! - **Events**: change notifications delivered to registered listeners in batches
//! - **Fonts and Supplements**: glyph tables and attached binary resources
//! - **Page Images**: lazily loaded through a pluggable image store
//!
//! ### Token View
//! - **Normalization Levels**: raw layout, joined hyphenation, paragraphs, whole streams
//! - **Whitespace Synthesis**: from layout geometry, next relations and the tokenizer
//! - **Annotation Overlay**: document annotations and synthesized structure on token indices
//! - **Character Editing**: text edits reconciled back into word strings and deletions
//!
//! ## Quick Start
//!
//! ```
//! use image_markup::config::SequenceConfig;
//! use image_markup::geometry::BoundingBox;
//! use image_markup::sequence::{DocumentRoot, TokenText};
//! use image_markup::Document;
//!
//! # fn main() -> image_markup::Result<()> {
//! let mut doc = Document::new("scan-17");
//! doc.add_page(0, BoundingBox::new(0, 2480, 0, 3508))?;
//! let wonder = doc.add_word(0, BoundingBox::new(200, 420, 300, 350), "wonder-")?;
//! let ful = doc.add_word(0, BoundingBox::new(200, 300, 360, 410), "ful")?;
//! doc.set_next_word(wonder, Some(ful))?;
//!
//! let root = DocumentRoot::new(&mut doc, SequenceConfig::new())?;
//! assert_eq!(root.text(), "wonderful");
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Layout geometry
pub mod geometry;

// Page images
pub mod images;

// Document model
pub mod model;

// Token view
pub mod sequence;

// Tokenization and hyphenation
pub mod text;

// Re-exports
pub use config::{NormalizationLevel, Orientation, SequenceConfig};
pub use error::{Error, Result};
pub use geometry::BoundingBox;
pub use model::{Annotation, AnnotationId, Document, NextRelation, Region, RegionId, Word, WordId};
pub use sequence::{DocumentRoot, SequenceScope, TokenSequence, TokenText};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
