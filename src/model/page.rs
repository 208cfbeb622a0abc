//! Pages: the spatial container of words and regions.

use crate::geometry::BoundingBox;
use crate::images::{PageImage, DEFAULT_IMAGE_DPI};
use crate::model::attributes::{Attributed, Attributes};
use crate::model::region::RegionId;
use crate::model::word::WordId;
use crate::model::word_grid::WordGrid;
use indexmap::IndexSet;
use std::sync::{Arc, OnceLock};

/// A page of the document.
#[derive(Debug)]
pub struct Page {
    pub(crate) id: u32,
    pub(crate) bounds: BoundingBox,
    pub(crate) image_dpi: u32,
    pub(crate) words: IndexSet<WordId>,
    pub(crate) grid: WordGrid,
    pub(crate) regions: Vec<RegionId>,
    pub(crate) attributes: Attributes,
    pub(crate) image: OnceLock<Arc<PageImage>>,
}

impl Page {
    pub(crate) fn new(id: u32, bounds: BoundingBox) -> Self {
        Self {
            id,
            bounds,
            image_dpi: DEFAULT_IMAGE_DPI,
            words: IndexSet::new(),
            grid: WordGrid::new(bounds),
            regions: Vec::new(),
            attributes: Attributes::new(),
            image: OnceLock::new(),
        }
    }

    /// Page id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Page bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Resolution of the page image.
    pub fn image_dpi(&self) -> u32 {
        self.image_dpi
    }

    /// Words registered with the page, in insertion order.
    pub fn words(&self) -> impl Iterator<Item = WordId> + '_ {
        self.words.iter().copied()
    }

    /// Number of registered words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Regions on the page, in insertion order.
    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    /// Whether the page image has been loaded.
    pub fn is_image_loaded(&self) -> bool {
        self.image.get().is_some()
    }

    pub(crate) fn register_word(&mut self, word: WordId, bounds: BoundingBox) {
        if self.words.insert(word) {
            self.grid.insert(word, bounds);
        }
    }

    pub(crate) fn deregister_word(&mut self, word: WordId, bounds: BoundingBox) -> bool {
        if self.words.shift_remove(&word) {
            self.grid.remove(word, bounds);
            true
        } else {
            false
        }
    }
}

impl Attributed for Page {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}
