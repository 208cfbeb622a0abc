//! Token-sequence view of a document.
//!
//! The word graph is flattened into a linear sequence of tokens with
//! synthesized whitespace, at a configurable [normalization
//! level](crate::config::NormalizationLevel). Document annotations and
//! synthesized structure (pages, regions, paragraphs, tables) are projected
//! onto token indices, and character edits on the sequence text are
//! reconciled back into word strings, word deletions and annotation
//! endpoints.

mod builder;
pub mod overlay;
pub mod root;
pub mod structure;
pub mod token;
pub mod token_sequence;

pub use builder::SequenceScope;
pub use overlay::{AnnotationBase, AnnotationOverlay, AnnotationSource, AnnotationView};
pub use root::DocumentRoot;
pub use token::ImToken;
pub use token_sequence::{TokenSequence, TokenSwap, TokenSwapObserver, TokenText};
