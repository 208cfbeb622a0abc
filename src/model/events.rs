//! Change notification.
//!
//! Mutations record [`ChangeEvent`]s into a bounded [`EventQueue`]. The
//! document flushes the queue synchronously at the end of every public
//! mutating call, handing each event once to every registered
//! [`DocumentListener`] in the order the events were recorded. When the queue
//! fills up mid-operation it is flushed early, so the bound only limits
//! buffering, never delivery.

use crate::model::annotation::AnnotationId;
use crate::model::attributes::AttributeValue;
use crate::model::region::RegionId;
use crate::model::word::WordId;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default number of events buffered before an early flush.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// The entity a change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The document itself
    Document,
    /// A page, by id
    Page(u32),
    /// A word
    Word(WordId),
    /// A region
    Region(RegionId),
    /// An annotation
    Annotation(AnnotationId),
    /// A font, by name
    Font(String),
    /// A supplement, by id
    Supplement(String),
}

/// A single recorded change.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The type of a region or annotation changed
    TypeChanged {
        /// Changed entity
        target: Target,
        /// Type before the change
        old_type: String,
    },
    /// A stored or virtual attribute changed
    AttributeChanged {
        /// Changed entity
        target: Target,
        /// Attribute name
        name: String,
        /// Value before the change
        old_value: Option<AttributeValue>,
    },
    /// A region was added to a page
    RegionAdded {
        /// New region
        region: RegionId,
    },
    /// A region was removed from its page
    RegionRemoved {
        /// Removed region
        region: RegionId,
        /// Page it was removed from
        page_id: u32,
    },
    /// An annotation was added
    AnnotationAdded {
        /// New annotation
        annotation: AnnotationId,
    },
    /// An annotation was removed
    AnnotationRemoved {
        /// Removed annotation
        annotation: AnnotationId,
        /// Its type at removal time
        annotation_type: String,
    },
}

impl ChangeEvent {
    /// Deliver this event to the matching listener callback.
    pub fn dispatch(&self, listener: &mut dyn DocumentListener) {
        match self {
            ChangeEvent::TypeChanged { target, old_type } => listener.type_changed(target, old_type),
            ChangeEvent::AttributeChanged {
                target,
                name,
                old_value,
            } => listener.attribute_changed(target, name, old_value.as_ref()),
            ChangeEvent::RegionAdded { region } => listener.region_added(*region),
            ChangeEvent::RegionRemoved { region, page_id } => {
                listener.region_removed(*region, *page_id)
            },
            ChangeEvent::AnnotationAdded { annotation } => listener.annotation_added(*annotation),
            ChangeEvent::AnnotationRemoved {
                annotation,
                annotation_type,
            } => listener.annotation_removed(*annotation, annotation_type),
        }
    }
}

/// Receiver of document change notifications.
///
/// All callbacks default to no-ops so listeners implement only what they need.
pub trait DocumentListener: Send {
    /// The type of a region or annotation changed.
    fn type_changed(&mut self, _target: &Target, _old_type: &str) {}

    /// An attribute changed.
    fn attribute_changed(
        &mut self,
        _target: &Target,
        _name: &str,
        _old_value: Option<&AttributeValue>,
    ) {
    }

    /// A region was added.
    fn region_added(&mut self, _region: RegionId) {}

    /// A region was removed.
    fn region_removed(&mut self, _region: RegionId, _page_id: u32) {}

    /// An annotation was added.
    fn annotation_added(&mut self, _annotation: AnnotationId) {}

    /// An annotation was removed.
    fn annotation_removed(&mut self, _annotation: AnnotationId, _annotation_type: &str) {}
}

/// Bounded buffer of pending change records.
#[derive(Debug)]
pub(crate) struct EventQueue {
    pending: VecDeque<ChangeEvent>,
    capacity: usize,
}

impl EventQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Queue an event; returns true when the queue has reached its bound.
    pub(crate) fn push(&mut self, event: ChangeEvent) -> bool {
        self.pending.push_back(event);
        self.pending.len() >= self.capacity
    }

    pub(crate) fn drain(&mut self) -> Vec<ChangeEvent> {
        self.pending.drain(..).collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Listener that records every event into a shared log.
///
/// Clones share the same log, so one clone can be registered with a document
/// while another is kept to inspect what happened.
///
/// # Examples
///
/// ```
/// use image_markup::geometry::BoundingBox;
/// use image_markup::model::{ChangeEvent, ChangeLog, Document};
///
/// let mut doc = Document::new("doc");
/// let log = ChangeLog::new();
/// doc.add_listener(Box::new(log.clone()));
/// doc.add_page(0, BoundingBox::new(0, 100, 0, 100)).unwrap();
/// let region = doc.add_region(0, BoundingBox::new(0, 50, 0, 50), "block").unwrap();
/// assert_eq!(log.events(), vec![ChangeEvent::RegionAdded { region }]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl ChangeLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    fn record(&self, event: ChangeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl DocumentListener for ChangeLog {
    fn type_changed(&mut self, target: &Target, old_type: &str) {
        self.record(ChangeEvent::TypeChanged {
            target: target.clone(),
            old_type: old_type.to_string(),
        });
    }

    fn attribute_changed(&mut self, target: &Target, name: &str, old_value: Option<&AttributeValue>) {
        self.record(ChangeEvent::AttributeChanged {
            target: target.clone(),
            name: name.to_string(),
            old_value: old_value.cloned(),
        });
    }

    fn region_added(&mut self, region: RegionId) {
        self.record(ChangeEvent::RegionAdded { region });
    }

    fn region_removed(&mut self, region: RegionId, page_id: u32) {
        self.record(ChangeEvent::RegionRemoved { region, page_id });
    }

    fn annotation_added(&mut self, annotation: AnnotationId) {
        self.record(ChangeEvent::AnnotationAdded { annotation });
    }

    fn annotation_removed(&mut self, annotation: AnnotationId, annotation_type: &str) {
        self.record(ChangeEvent::AnnotationRemoved {
            annotation,
            annotation_type: annotation_type.to_string(),
        });
    }
}
