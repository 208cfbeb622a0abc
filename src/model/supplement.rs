//! Supplements: binary side data attached to a document.
//!
//! A supplement is a typed blob (the source file, a page scan, the bitmap of
//! a figure) whose bytes come from a [`DataProvider`]. The provider is opened
//! on demand, so large payloads need not stay in memory.

use crate::geometry::BoundingBox;
use crate::model::attributes::{Attributed, Attributes};
use bytes::Bytes;
use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

/// Source of supplement bytes.
pub trait DataProvider: Send + Sync + fmt::Debug {
    /// Open a fresh reader over the data.
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;
}

/// Provider over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct BytesProvider(pub Bytes);

impl DataProvider for BytesProvider {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.0.clone())))
    }
}

/// What a supplement holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplementKind {
    /// The document's source file
    Source,
    /// The scan of a page
    Scan {
        /// Page id
        page_id: u32,
    },
    /// A figure cut from a page
    Figure {
        /// Page id
        page_id: u32,
        /// Figure box
        bounds: BoundingBox,
    },
    /// Vector graphics cut from a page
    Graphics {
        /// Page id
        page_id: u32,
        /// Graphics box
        bounds: BoundingBox,
    },
    /// Anything else, under a free-form id
    Other(String),
}

impl SupplementKind {
    /// Document-unique supplement id.
    pub fn id(&self) -> String {
        match self {
            SupplementKind::Source => "source".to_string(),
            SupplementKind::Scan { page_id } => format!("scan@{}", page_id),
            SupplementKind::Figure { page_id, bounds } => format!("figure@{}.{}", page_id, bounds),
            SupplementKind::Graphics { page_id, bounds } => format!("graphics@{}.{}", page_id, bounds),
            SupplementKind::Other(id) => id.clone(),
        }
    }
}

/// A typed binary supplement.
#[derive(Debug, Clone)]
pub struct Supplement {
    pub(crate) kind: SupplementKind,
    pub(crate) mime_type: String,
    pub(crate) provider: Arc<dyn DataProvider>,
    pub(crate) attributes: Attributes,
}

impl Supplement {
    /// Create a supplement over an arbitrary provider.
    pub fn new(kind: SupplementKind, mime_type: impl Into<String>, provider: Arc<dyn DataProvider>) -> Self {
        Self {
            kind,
            mime_type: mime_type.into(),
            provider,
            attributes: Attributes::new(),
        }
    }

    /// Create a supplement over an in-memory buffer.
    pub fn from_bytes(kind: SupplementKind, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(kind, mime_type, Arc::new(BytesProvider(data.into())))
    }

    /// Supplement id.
    pub fn id(&self) -> String {
        self.kind.id()
    }

    /// Kind of supplement.
    pub fn kind(&self) -> &SupplementKind {
        &self.kind
    }

    /// MIME type of the data.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Open a reader over the data.
    pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        self.provider.open()
    }

    /// Read the whole payload.
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.provider.open()?.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl Attributed for Supplement {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplement_ids() {
        assert_eq!(SupplementKind::Source.id(), "source");
        assert_eq!(SupplementKind::Scan { page_id: 4 }.id(), "scan@4");
        let bounds = BoundingBox::new(1, 2, 3, 4);
        assert_eq!(SupplementKind::Figure { page_id: 0, bounds }.id(), "figure@0.[1,2,3,4]");
        assert_eq!(SupplementKind::Graphics { page_id: 1, bounds }.id(), "graphics@1.[1,2,3,4]");
        assert_eq!(SupplementKind::Other("ocr-log".into()).id(), "ocr-log");
    }

    #[test]
    fn test_bytes_supplement_reads_repeatedly() {
        let supp = Supplement::from_bytes(SupplementKind::Source, "application/pdf", &b"%PDF-1.7"[..]);
        assert_eq!(supp.read_all().unwrap(), b"%PDF-1.7");
        assert_eq!(supp.read_all().unwrap(), b"%PDF-1.7");
        assert_eq!(supp.mime_type(), "application/pdf");
    }
}
