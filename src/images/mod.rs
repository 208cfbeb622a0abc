//! Page image storage.
//!
//! Pages load their scan lazily through a [`PageImageStore`]. A document may
//! carry its own store; when it has none, or when its store cannot produce an
//! image, the process-wide default store is consulted. The default is an
//! in-memory [`MemoryImageStore`] and can be replaced with
//! [`set_default_image_store`].

use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, RwLock};

/// Default resolution assumed for page images.
pub const DEFAULT_IMAGE_DPI: u32 = 300;

/// A decoded page image with its resolution.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Decoded pixels
    pub image: DynamicImage,
    /// Resolution in dots per inch
    pub dpi: u32,
}

impl PageImage {
    /// Wrap decoded pixels.
    pub fn new(image: DynamicImage, dpi: u32) -> Self {
        Self { image, dpi }
    }

    /// Decode an encoded image (PNG, JPEG or TIFF).
    pub fn from_encoded(data: &[u8], dpi: u32) -> crate::Result<Self> {
        let image = image::load_from_memory(data)?;
        Ok(Self { image, dpi })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> crate::Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, ImageOutputFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

/// Storage backend for page images.
pub trait PageImageStore: Send + Sync {
    /// Load the image of one page.
    fn get_page_image(&self, doc_id: &str, page_id: u32) -> io::Result<PageImage>;

    /// Load the image of one page as an encoded PNG stream.
    fn get_page_image_as_stream(&self, doc_id: &str, page_id: u32) -> io::Result<Box<dyn Read + Send>> {
        let image = self.get_page_image(doc_id, page_id)?;
        let png = image
            .to_png()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(Box::new(Cursor::new(png)))
    }

    /// Store the image of one page, returning its storage key.
    fn store_page_image(&self, doc_id: &str, page_id: u32, image: &PageImage) -> io::Result<String>;
}

/// Storage key of a page image.
pub fn storage_key(doc_id: &str, page_id: u32) -> String {
    format!("{}.{}.png", doc_id, page_id)
}

/// In-memory store keeping PNG-encoded page images.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: RwLock<HashMap<(String, u32), (Bytes, u32)>>,
}

impl MemoryImageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.read().map(|images| images.len()).unwrap_or(0)
    }

    /// Whether the store holds no images.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageImageStore for MemoryImageStore {
    fn get_page_image(&self, doc_id: &str, page_id: u32) -> io::Result<PageImage> {
        let images = self
            .images
            .read()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "image store lock poisoned"))?;
        let (data, dpi) = images.get(&(doc_id.to_string(), page_id)).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no image for {}", storage_key(doc_id, page_id)))
        })?;
        PageImage::from_encoded(data, *dpi).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }

    fn store_page_image(&self, doc_id: &str, page_id: u32, image: &PageImage) -> io::Result<String> {
        let png = image
            .to_png()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let mut images = self
            .images
            .write()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "image store lock poisoned"))?;
        images.insert((doc_id.to_string(), page_id), (Bytes::from(png), image.dpi));
        log::debug!("Stored page image {}", storage_key(doc_id, page_id));
        Ok(storage_key(doc_id, page_id))
    }
}

lazy_static! {
    static ref DEFAULT_STORE: RwLock<Arc<dyn PageImageStore>> =
        RwLock::new(Arc::new(MemoryImageStore::new()));
}

/// The process-wide fallback image store.
pub fn default_image_store() -> Arc<dyn PageImageStore> {
    match DEFAULT_STORE.read() {
        Ok(store) => Arc::clone(&store),
        Err(poisoned) => Arc::clone(&poisoned.into_inner()),
    }
}

/// Replace the process-wide fallback image store.
pub fn set_default_image_store(store: Arc<dyn PageImageStore>) {
    match DEFAULT_STORE.write() {
        Ok(mut current) => *current = store,
        Err(poisoned) => *poisoned.into_inner() = store,
    }
}
