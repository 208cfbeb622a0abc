//! The document aggregate.
//!
//! [`Document`] owns every page, word, region, annotation, font and
//! supplement of one IM document. Entities live in arenas and are addressed
//! by copyable handles; all cross references (stream links, annotation
//! endpoints, page membership) are maintained by the document's mutators so
//! that they stay consistent with the indices.

use crate::config::{Orientation, PROPERTY_ORIENTATION, PROPERTY_TOKENIZER};
use crate::error::{Error, Result};
use crate::geometry::BoundingBox;
use crate::images::{default_image_store, PageImage, PageImageStore};
use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::annotation_index::AnnotationIndex;
use crate::model::attributes::Attributes;
use crate::model::events::{ChangeEvent, DocumentListener, EventQueue, Target, DEFAULT_EVENT_CAPACITY};
use crate::model::font::Font;
use crate::model::order::{layout_order, tolerant_sort};
use crate::model::page::Page;
use crate::model::region::{Region, RegionId};
use crate::model::supplement::Supplement;
use crate::model::word::{Word, WordId};
use crate::text::tokenizer::{default_tokenizer, tokenizer_by_name, Tokenizer};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// An Image Markup document.
pub struct Document {
    pub(crate) doc_id: String,
    pub(crate) pages: BTreeMap<u32, Page>,
    pub(crate) words: Vec<Word>,
    pub(crate) word_ids_by_local: HashMap<String, WordId>,
    pub(crate) regions: Vec<Region>,
    pub(crate) annotations: Vec<Option<Annotation>>,
    pub(crate) annotation_index: AnnotationIndex,
    pub(crate) next_created: u64,
    pub(crate) fonts: IndexMap<String, Font>,
    pub(crate) supplements: IndexMap<String, Supplement>,
    pub(crate) properties: IndexMap<String, String>,
    pub(crate) attributes: Attributes,
    pub(crate) tokenizer: Arc<dyn Tokenizer>,
    pub(crate) orientation: Orientation,
    pub(crate) image_store: Option<Arc<dyn PageImageStore>>,
    pub(crate) events: EventQueue,
    pub(crate) listeners: Vec<Box<dyn DocumentListener>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("doc_id", &self.doc_id)
            .field("pages", &self.pages.len())
            .field("words", &self.words.len())
            .field("regions", &self.regions.len())
            .field("annotations", &self.annotation_count())
            .field("tokenizer", &self.tokenizer.name())
            .field("orientation", &self.orientation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            pages: BTreeMap::new(),
            words: Vec::new(),
            word_ids_by_local: HashMap::new(),
            regions: Vec::new(),
            annotations: Vec::new(),
            annotation_index: AnnotationIndex::default(),
            next_created: 0,
            fonts: IndexMap::new(),
            supplements: IndexMap::new(),
            properties: IndexMap::new(),
            attributes: Attributes::new(),
            tokenizer: default_tokenizer(),
            orientation: Orientation::default(),
            image_store: None,
            events: EventQueue::new(DEFAULT_EVENT_CAPACITY),
            listeners: Vec::new(),
        }
    }

    /// Create an empty document with a random id.
    pub fn with_generated_id() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string().to_uppercase())
    }

    /// Document id.
    pub fn id(&self) -> &str {
        &self.doc_id
    }

    // ---- pages ----

    /// Add a page.
    pub fn add_page(&mut self, page_id: u32, bounds: BoundingBox) -> Result<()> {
        if self.pages.contains_key(&page_id) {
            return Err(Error::DuplicatePage(page_id));
        }
        self.pages.insert(page_id, Page::new(page_id, bounds));
        Ok(())
    }

    /// Page by id.
    pub fn page(&self, page_id: u32) -> Option<&Page> {
        self.pages.get(&page_id)
    }

    /// Pages in id order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    /// Page ids in ascending order.
    pub fn page_ids(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Set the resolution of a page's image.
    pub fn set_page_image_dpi(&mut self, page_id: u32, dpi: u32) -> Result<()> {
        let page = self.pages.get_mut(&page_id).ok_or(Error::UnknownPage(page_id))?;
        page.image_dpi = dpi;
        Ok(())
    }

    // ---- words ----

    /// Create a word for a page without registering it there.
    ///
    /// The word is its own text stream until it is linked; use
    /// [`attach_word`](Self::attach_word) to make it visible on the page.
    pub fn create_word(&mut self, page_id: u32, bounds: BoundingBox, string: impl Into<String>) -> Result<WordId> {
        if !self.pages.contains_key(&page_id) {
            return Err(Error::UnknownPage(page_id));
        }
        let id = WordId(self.words.len() as u32);
        self.words.push(Word::new(id, page_id, bounds, string.into()));
        Ok(id)
    }

    /// Register a word with its page and spatial index.
    pub fn attach_word(&mut self, page_id: u32, word: WordId) -> Result<()> {
        let w = self.words.get(word.index()).ok_or(Error::UnknownWord(word))?;
        if w.page_id != page_id {
            return Err(Error::PageMismatch {
                expected: w.page_id,
                found: page_id,
            });
        }
        let (bounds, local_id) = (w.bounds, w.local_id());
        let page = self.pages.get_mut(&page_id).ok_or(Error::UnknownPage(page_id))?;
        page.register_word(word, bounds);
        self.words[word.index()].attached = true;
        self.word_ids_by_local.insert(local_id, word);
        Ok(())
    }

    /// Create a word and register it with its page.
    pub fn add_word(&mut self, page_id: u32, bounds: BoundingBox, string: impl Into<String>) -> Result<WordId> {
        let id = self.create_word(page_id, bounds, string)?;
        self.attach_word(page_id, id)?;
        Ok(id)
    }

    /// Remove a word from its page and text stream.
    ///
    /// When the word is the first or last word of an annotation and
    /// `remove_annotations` is false, nothing changes and `Ok(false)` is
    /// returned. Otherwise those annotations are removed, the word's
    /// predecessor is linked to its successor and the word is detached.
    pub fn remove_word(&mut self, word: WordId, remove_annotations: bool) -> Result<bool> {
        self.check_word(word)?;
        let mut anchored = self.annotations_starting_at(word);
        for id in self.annotations_ending_at(word) {
            if !anchored.contains(&id) {
                anchored.push(id);
            }
        }
        if !anchored.is_empty() && !remove_annotations {
            log::debug!("Word {} anchors {} annotations, not removed", word, anchored.len());
            return Ok(false);
        }
        for id in anchored {
            self.remove_annotation(id);
        }

        let (prev, next) = {
            let w = &self.words[word.index()];
            (w.prev, w.next)
        };
        match (prev, next) {
            (Some(p), Some(n)) => self.set_next_word(p, Some(n))?,
            (Some(p), None) => self.set_next_word(p, None)?,
            (None, Some(n)) => self.set_previous_word(n, None)?,
            (None, None) => {},
        }

        let w = &self.words[word.index()];
        let (page_id, bounds, local_id) = (w.page_id, w.bounds, w.local_id());
        if let Some(page) = self.pages.get_mut(&page_id) {
            page.deregister_word(word, bounds);
        }
        if self.word_ids_by_local.get(&local_id) == Some(&word) {
            self.word_ids_by_local.remove(&local_id);
        }
        self.words[word.index()].attached = false;
        self.flush_events();
        Ok(true)
    }

    /// Word by handle.
    pub fn word(&self, word: WordId) -> Option<&Word> {
        self.words.get(word.index())
    }

    /// Attached word by page-local id.
    pub fn word_by_local_id(&self, local_id: &str) -> Option<WordId> {
        self.word_ids_by_local.get(local_id).copied()
    }

    /// Number of words ever created, attached or not.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Words registered with a page, in insertion order.
    pub fn words_on_page(&self, page_id: u32) -> Vec<WordId> {
        self.pages
            .get(&page_id)
            .map(|page| page.words().collect())
            .unwrap_or_default()
    }

    /// The word whose box contains a point.
    pub fn word_at(&self, page_id: u32, x: i32, y: i32) -> Option<WordId> {
        let page = self.pages.get(&page_id)?;
        page.grid
            .candidates_at(x, y)
            .iter()
            .copied()
            .find(|w| self.words[w.index()].bounds.contains_point(x, y))
    }

    /// Words inside a box, in layout order.
    ///
    /// With `fuzzy`, a word counts as inside when its center is.
    pub fn words_in(&self, page_id: u32, bounds: BoundingBox, fuzzy: bool) -> Vec<WordId> {
        let Some(page) = self.pages.get(&page_id) else {
            return Vec::new();
        };
        let mut words: Vec<WordId> = page
            .grid
            .candidates_in(bounds)
            .into_iter()
            .filter(|w| bounds.includes(&self.words[w.index()].bounds, fuzzy))
            .collect();
        self.sort_by_layout(&mut words);
        words
    }

    pub(crate) fn check_word(&self, word: WordId) -> Result<&Word> {
        self.words.get(word.index()).ok_or(Error::UnknownWord(word))
    }

    pub(crate) fn sort_by_layout(&self, words: &mut [WordId]) {
        let orientation = self.orientation;
        tolerant_sort(words, |a, b| {
            layout_order(&self.words[a.index()].bounds, &self.words[b.index()].bounds, orientation)
        });
    }

    // ---- regions ----

    /// Add a region to a page.
    pub fn add_region(&mut self, page_id: u32, bounds: BoundingBox, region_type: impl Into<String>) -> Result<RegionId> {
        let page = self.pages.get_mut(&page_id).ok_or(Error::UnknownPage(page_id))?;
        let id = RegionId(self.regions.len() as u32);
        page.regions.push(id);
        self.regions.push(Region::new(id, page_id, bounds, region_type.into()));
        self.emit(ChangeEvent::RegionAdded { region: id });
        self.flush_events();
        Ok(id)
    }

    /// Remove a region from its page.
    pub fn remove_region(&mut self, region: RegionId) -> Result<bool> {
        let r = self.regions.get(region.index()).ok_or(Error::UnknownRegion(region))?;
        if !r.attached {
            return Ok(false);
        }
        let page_id = r.page_id;
        if let Some(page) = self.pages.get_mut(&page_id) {
            page.regions.retain(|id| *id != region);
        }
        self.regions[region.index()].attached = false;
        self.emit(ChangeEvent::RegionRemoved { region, page_id });
        self.flush_events();
        Ok(true)
    }

    /// Region by handle.
    pub fn region(&self, region: RegionId) -> Option<&Region> {
        self.regions.get(region.index())
    }

    /// Regions of a page, in insertion order.
    pub fn regions_on_page(&self, page_id: u32) -> Vec<RegionId> {
        self.pages
            .get(&page_id)
            .map(|page| page.regions.clone())
            .unwrap_or_default()
    }

    /// Regions of one type on a page, in insertion order.
    pub fn regions_of_type(&self, page_id: u32, region_type: &str) -> Vec<RegionId> {
        self.regions_on_page(page_id)
            .into_iter()
            .filter(|r| self.regions[r.index()].region_type == region_type)
            .collect()
    }

    /// Words inside a region, in layout order.
    pub fn region_words(&self, region: RegionId, fuzzy: bool) -> Vec<WordId> {
        match self.region(region) {
            Some(r) => self.words_in(r.page_id, r.bounds, fuzzy),
            None => Vec::new(),
        }
    }

    /// Other regions of the same page lying inside a region, in layout order.
    pub fn region_sub_regions(&self, region: RegionId, fuzzy: bool) -> Vec<RegionId> {
        let Some(outer) = self.region(region) else {
            return Vec::new();
        };
        let mut inner: Vec<RegionId> = self
            .regions_on_page(outer.page_id)
            .into_iter()
            .filter(|r| *r != region && outer.bounds.includes(&self.regions[r.index()].bounds, fuzzy))
            .collect();
        let orientation = self.orientation;
        tolerant_sort(&mut inner, |a, b| {
            layout_order(&self.regions[a.index()].bounds, &self.regions[b.index()].bounds, orientation)
        });
        inner
    }

    /// Change the type of a region.
    pub fn set_region_type(&mut self, region: RegionId, region_type: &str) -> Result<()> {
        let r = self.regions.get_mut(region.index()).ok_or(Error::UnknownRegion(region))?;
        if r.region_type == region_type {
            return Ok(());
        }
        let old_type = std::mem::replace(&mut r.region_type, region_type.to_string());
        self.emit(ChangeEvent::TypeChanged {
            target: Target::Region(region),
            old_type,
        });
        self.flush_events();
        Ok(())
    }

    // ---- fonts and supplements ----

    /// Add a font, replacing any font of the same name.
    pub fn add_font(&mut self, font: Font) -> Option<Font> {
        self.fonts.insert(font.name.clone(), font)
    }

    /// Font by name.
    pub fn font(&self, name: &str) -> Option<&Font> {
        self.fonts.get(name)
    }

    /// Mutable font by name.
    pub fn font_mut(&mut self, name: &str) -> Option<&mut Font> {
        self.fonts.get_mut(name)
    }

    /// Fonts in insertion order.
    pub fn fonts(&self) -> impl Iterator<Item = &Font> {
        self.fonts.values()
    }

    /// Remove a font.
    pub fn remove_font(&mut self, name: &str) -> Option<Font> {
        self.fonts.shift_remove(name)
    }

    /// Add a supplement, replacing any with the same id; returns the id.
    pub fn add_supplement(&mut self, supplement: Supplement) -> String {
        let id = supplement.id();
        self.supplements.insert(id.clone(), supplement);
        id
    }

    /// Supplement by id.
    pub fn supplement(&self, id: &str) -> Option<&Supplement> {
        self.supplements.get(id)
    }

    /// Supplements in insertion order.
    pub fn supplements(&self) -> impl Iterator<Item = &Supplement> {
        self.supplements.values()
    }

    /// Remove a supplement.
    pub fn remove_supplement(&mut self, id: &str) -> Option<Supplement> {
        self.supplements.shift_remove(id)
    }

    // ---- properties ----

    /// Set a document property, returning the previous value.
    ///
    /// The `tokenizer` property switches the tokenizer to the registered one
    /// of that name and the `orientation` property switches the reading
    /// orientation; unknown values are logged and leave the setting as is.
    pub fn set_document_property(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        match name {
            PROPERTY_TOKENIZER => match tokenizer_by_name(&value) {
                Some(tokenizer) => self.tokenizer = tokenizer,
                None => log::warn!("Unknown tokenizer '{}', keeping '{}'", value, self.tokenizer.name()),
            },
            PROPERTY_ORIENTATION => match value.parse::<Orientation>() {
                Ok(orientation) => self.orientation = orientation,
                Err(e) => log::warn!("Ignoring orientation property: {}", e),
            },
            _ => {},
        }
        self.properties.insert(name.to_string(), value)
    }

    /// Document property by name.
    pub fn document_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Names of the document properties.
    pub fn document_property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    /// Remove a document property.
    pub fn remove_document_property(&mut self, name: &str) -> Option<String> {
        self.properties.shift_remove(name)
    }

    /// Tokenizer in use.
    pub fn tokenizer(&self) -> Arc<dyn Tokenizer> {
        Arc::clone(&self.tokenizer)
    }

    /// Replace the tokenizer.
    pub fn set_tokenizer(&mut self, tokenizer: Arc<dyn Tokenizer>) {
        self.properties
            .insert(PROPERTY_TOKENIZER.to_string(), tokenizer.name().to_string());
        self.tokenizer = tokenizer;
    }

    /// Reading orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    // ---- events ----

    /// Register a change listener.
    pub fn add_listener(&mut self, listener: Box<dyn DocumentListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn emit(&mut self, event: ChangeEvent) {
        if self.events.push(event) {
            self.flush_events();
        }
    }

    /// Deliver pending change events to all listeners.
    pub fn flush_events(&mut self) {
        if self.events.is_empty() {
            return;
        }
        let events = self.events.drain();
        for listener in self.listeners.iter_mut() {
            for event in &events {
                event.dispatch(listener.as_mut());
            }
        }
    }

    // ---- page images ----

    /// Use a specific image store for this document.
    pub fn set_image_store(&mut self, store: Arc<dyn PageImageStore>) {
        self.image_store = Some(store);
    }

    /// Image of a page, loaded on first access.
    ///
    /// The document's own store is asked first and the process-wide default
    /// store second. Failures are logged and yield `None`.
    pub fn page_image(&self, page_id: u32) -> Option<Arc<PageImage>> {
        let page = self.pages.get(&page_id)?;
        if let Some(image) = page.image.get() {
            return Some(Arc::clone(image));
        }
        let loaded = self.load_page_image(page_id)?;
        Some(Arc::clone(page.image.get_or_init(|| Arc::new(loaded))))
    }

    fn load_page_image(&self, page_id: u32) -> Option<PageImage> {
        if let Some(store) = &self.image_store {
            match store.get_page_image(&self.doc_id, page_id) {
                Ok(image) => return Some(image),
                Err(e) => log::warn!(
                    "Document image store failed for page {} of {}: {}, trying default store",
                    page_id,
                    self.doc_id,
                    e
                ),
            }
        }
        match default_image_store().get_page_image(&self.doc_id, page_id) {
            Ok(image) => Some(image),
            Err(e) => {
                log::error!("Could not load image of page {} of {}: {}", page_id, self.doc_id, e);
                None
            },
        }
    }

    /// Store a page image and make it the page's loaded image.
    ///
    /// When the document's own store fails the image goes to the default
    /// store; only a failure there is returned.
    pub fn store_page_image(&mut self, page_id: u32, image: PageImage) -> Result<String> {
        if !self.pages.contains_key(&page_id) {
            return Err(Error::UnknownPage(page_id));
        }
        let stored = match &self.image_store {
            Some(store) => store.store_page_image(&self.doc_id, page_id, &image).or_else(|e| {
                log::warn!(
                    "Document image store could not store page {} of {}: {}, using default store",
                    page_id,
                    self.doc_id,
                    e
                );
                default_image_store().store_page_image(&self.doc_id, page_id, &image)
            }),
            None => default_image_store().store_page_image(&self.doc_id, page_id, &image),
        };
        let key = stored?;
        if let Some(page) = self.pages.get_mut(&page_id) {
            page.image_dpi = image.dpi;
            page.image = OnceLock::from(Arc::new(image));
        }
        Ok(key)
    }
}
