//! Annotations: typed spans over a contiguous range of words.
//!
//! An annotation is identified by its type and its two endpoint words; the
//! composite uid is recomputed whenever one of the three changes, which is
//! how two annotations can end up as duplicates of each other.

use crate::model::attributes::{Attributed, Attributes};
use crate::model::word::WordId;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an annotation within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub(crate) u32);

impl AnnotationId {
    /// Arena index of this annotation.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "annotation#{}", self.0)
    }
}

/// A typed span over words of one text stream.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub(crate) id: AnnotationId,
    pub(crate) annotation_type: String,
    pub(crate) first_word: WordId,
    pub(crate) last_word: WordId,
    pub(crate) created: u64,
    pub(crate) uid: String,
    pub(crate) attributes: Attributes,
}

impl Annotation {
    /// Handle of this annotation.
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Annotation type.
    pub fn annotation_type(&self) -> &str {
        &self.annotation_type
    }

    /// First word of the span.
    pub fn first_word(&self) -> WordId {
        self.first_word
    }

    /// Last word of the span.
    pub fn last_word(&self) -> WordId {
        self.last_word
    }

    /// Creation sequence number; later annotations have larger numbers.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Composite uid derived from type and endpoints.
    pub fn uid(&self) -> &str {
        &self.uid
    }
}

impl Attributed for Annotation {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Compute the composite uid of an annotation.
///
/// The uid is the uppercase hex MD5 digest of `type:firstLocalId-lastLocalId`,
/// so two annotations with the same type and endpoints share a uid.
///
/// # Examples
///
/// ```
/// use image_markup::model::annotation_uid;
///
/// let a = annotation_uid("person", "0.[1,2,3,4]", "0.[5,6,3,4]");
/// let b = annotation_uid("person", "0.[1,2,3,4]", "0.[5,6,3,4]");
/// let c = annotation_uid("location", "0.[1,2,3,4]", "0.[5,6,3,4]");
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.len(), 32);
/// ```
pub fn annotation_uid(annotation_type: &str, first_local_id: &str, last_local_id: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(annotation_type.as_bytes());
    hasher.update(b":");
    hasher.update(first_local_id.as_bytes());
    hasher.update(b"-");
    hasher.update(last_local_id.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_is_uppercase_hex() {
        let uid = annotation_uid("t", "a", "b");
        assert_eq!(uid.len(), 32);
        assert!(uid.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_uid_depends_on_endpoint_order() {
        assert_ne!(annotation_uid("t", "a", "b"), annotation_uid("t", "b", "a"));
    }
}
