//! Error types for the document model.
//!
//! Structural invariant violations (self links, ordering violations, page
//! mismatches, edits that would need more words than exist) are reported
//! through [`Error`]. Expected outcomes such as an annotation that would span
//! two text streams are not errors and surface as `None` or `false` instead.

use crate::model::{AnnotationId, RegionId, WordId};

/// Result type alias for document model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while manipulating a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A word was offered as its own predecessor or successor
    #[error("Word {0} cannot be linked to itself")]
    SelfLink(String),

    /// Linking would place a word before its own predecessor
    #[error("Ordering violation: {word} cannot follow {predecessor}, which lies downstream of it")]
    OrderingViolation {
        /// Local id of the word being linked
        word: String,
        /// Local id of the proposed predecessor
        predecessor: String,
    },

    /// A word was added to a page other than the one it was created for
    #[error("Page id mismatch: expected page {expected}, found {found}")]
    PageMismatch {
        /// Page the word belongs to
        expected: u32,
        /// Page the word was offered to
        found: u32,
    },

    /// An edit produced more tokens than there are words to carry them
    #[error("Edit produces {tokens} tokens but only {words} words are available")]
    TooManyTokens {
        /// Number of tokens in the edited text
        tokens: usize,
        /// Number of words in the edit window
        words: usize,
    },

    /// No page with this id
    #[error("Unknown page: {0}")]
    UnknownPage(u32),

    /// Word handle does not belong to this document
    #[error("Unknown word: {0}")]
    UnknownWord(WordId),

    /// Region handle does not belong to this document
    #[error("Unknown region: {0}")]
    UnknownRegion(RegionId),

    /// Annotation handle is unknown or the annotation was removed
    #[error("Unknown annotation: {0}")]
    UnknownAnnotation(AnnotationId),

    /// A page with this id already exists
    #[error("Duplicate page id: {0}")]
    DuplicatePage(u32),

    /// Attempt to write a virtual attribute that is read-only
    #[error("Attribute '{0}' is read-only")]
    ReadOnlyAttribute(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image error
    #[error("Image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_link_error() {
        let err = Error::SelfLink("1.[10,20,10,20]".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("itself"));
        assert!(msg.contains("1.[10,20,10,20]"));
    }

    #[test]
    fn test_page_mismatch_error() {
        let err = Error::PageMismatch {
            expected: 3,
            found: 4,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("expected page 3"));
        assert!(msg.contains("found 4"));
    }

    #[test]
    fn test_too_many_tokens_error() {
        let err = Error::TooManyTokens {
            tokens: 5,
            words: 2,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("5 tokens"));
        assert!(msg.contains("2 words"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing page");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(format!("{}", err).contains("missing page"));
    }
}
