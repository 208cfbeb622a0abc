//! Attribute bags and virtual attributes.
//!
//! Every model entity carries an [`Attributes`] bag of arbitrary key-value
//! metadata. A small set of well-known names ([`VirtualAttribute`]) does not
//! live in the bag: reads and writes through the generic accessors on
//! [`Document`] are routed to the entity's real fields instead (a word's
//! successor, an annotation's first word, a box, a page id).

use crate::error::{Error, Result};
use crate::model::document::Document;
use crate::model::events::{ChangeEvent, Target};
use crate::model::word::{NextRelation, WordId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value stored in an attribute bag.
pub type AttributeValue = serde_json::Value;

/// Insertion-ordered attribute bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    map: IndexMap<String, AttributeValue>,
}

impl Attributes {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of an attribute.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.map.get(name)
    }

    /// Value of an attribute, or `default` when absent.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a AttributeValue) -> &'a AttributeValue {
        self.map.get(name).unwrap_or(default)
    }

    /// String value of an attribute, if it holds a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.map.get(name).and_then(AttributeValue::as_str)
    }

    /// Integer value of an attribute, if it holds a non-negative integer.
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.map.get(name).and_then(AttributeValue::as_u64)
    }

    /// Whether the attribute is present.
    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Set an attribute, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.map.insert(name.into(), value.into())
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.map.shift_remove(name)
    }

    /// Remove all attributes.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Attribute names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Copy every attribute of `other` that this bag does not have yet.
    ///
    /// Existing values win, so merging is a union where the receiver takes
    /// precedence on conflicts.
    pub fn merge_missing(&mut self, other: &Attributes) {
        for (name, value) in &other.map {
            if !self.map.contains_key(name) {
                self.map.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Read access to an entity's stored attributes.
pub trait Attributed {
    /// The entity's attribute bag.
    fn attributes(&self) -> &Attributes;

    /// Stored value of an attribute.
    fn get_attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes().get(name)
    }

    /// Whether a stored attribute is present.
    fn has_attribute(&self, name: &str) -> bool {
        self.attributes().has(name)
    }

    /// Names of the stored attributes.
    fn attribute_names(&self) -> Vec<String> {
        self.attributes().names().map(str::to_string).collect()
    }
}

/// Attribute names that map to entity fields rather than to the bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualAttribute {
    /// First word of an annotation
    FirstWord,
    /// Last word of an annotation
    LastWord,
    /// Bounding box of a word, region or page
    BoundingBox,
    /// Page id (first page for annotations)
    PageId,
    /// Last page id of an annotation
    LastPageId,
    /// Successor of a word
    NextWord,
    /// Predecessor of a word
    PreviousWord,
    /// Relation of a word to its successor
    NextRelation,
    /// Stream type of a word
    TextStreamType,
    /// Stream id of a word
    TextStreamId,
    /// String of a word
    String,
    /// Type of a region or annotation
    Type,
}

impl VirtualAttribute {
    /// All virtual attributes.
    pub const ALL: [VirtualAttribute; 12] = [
        VirtualAttribute::FirstWord,
        VirtualAttribute::LastWord,
        VirtualAttribute::BoundingBox,
        VirtualAttribute::PageId,
        VirtualAttribute::LastPageId,
        VirtualAttribute::NextWord,
        VirtualAttribute::PreviousWord,
        VirtualAttribute::NextRelation,
        VirtualAttribute::TextStreamType,
        VirtualAttribute::TextStreamId,
        VirtualAttribute::String,
        VirtualAttribute::Type,
    ];

    /// Attribute name.
    pub fn name(self) -> &'static str {
        match self {
            VirtualAttribute::FirstWord => "firstWord",
            VirtualAttribute::LastWord => "lastWord",
            VirtualAttribute::BoundingBox => "boundingBox",
            VirtualAttribute::PageId => "pageId",
            VirtualAttribute::LastPageId => "lastPageId",
            VirtualAttribute::NextWord => "nextWord",
            VirtualAttribute::PreviousWord => "prevWord",
            VirtualAttribute::NextRelation => "nextRelation",
            VirtualAttribute::TextStreamType => "textStreamType",
            VirtualAttribute::TextStreamId => "textStreamId",
            VirtualAttribute::String => "string",
            VirtualAttribute::Type => "type",
        }
    }

    /// Look up a virtual attribute by name.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|attr| attr.name() == name)
    }
}

impl Document {
    /// Read an attribute of any entity, virtual names included.
    ///
    /// Virtual names that do not apply to the target's kind fall through to
    /// the stored attributes.
    pub fn get_attribute(&self, target: &Target, name: &str) -> Option<AttributeValue> {
        if let Some(attr) = VirtualAttribute::lookup(name) {
            if let Some(value) = self.virtual_attribute(target, attr) {
                return value;
            }
        }
        self.attribute_bag(target).and_then(|bag| bag.get(name).cloned())
    }

    /// Whether an attribute is present, virtual names included.
    pub fn has_attribute(&self, target: &Target, name: &str) -> bool {
        self.get_attribute(target, name).is_some()
    }

    /// Names of the stored attributes of an entity.
    pub fn attribute_names(&self, target: &Target) -> Vec<String> {
        self.attribute_bag(target)
            .map(|bag| bag.names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Write an attribute of any entity, returning the previous value.
    ///
    /// Virtual names are routed to the matching setter: `nextWord` and
    /// `prevWord` take a word local id (or `null`), `firstWord` and `lastWord`
    /// take a word local id, `nextRelation` a relation code, `type` and
    /// `textStreamType` a string. Box, page and stream ids are read-only.
    pub fn set_attribute(
        &mut self,
        target: &Target,
        name: &str,
        value: AttributeValue,
    ) -> Result<Option<AttributeValue>> {
        if let Some(attr) = VirtualAttribute::lookup(name) {
            if self.virtual_attribute(target, attr).is_some() {
                let old = self.get_attribute(target, name);
                self.set_virtual_attribute(target, attr, value)?;
                return Ok(old);
            }
        }
        let bag = self.attribute_bag_mut(target)?;
        let old = bag.set(name, value);
        self.emit(ChangeEvent::AttributeChanged {
            target: target.clone(),
            name: name.to_string(),
            old_value: old.clone(),
        });
        self.flush_events();
        Ok(old)
    }

    /// Remove a stored attribute, returning its value.
    ///
    /// Virtual attributes cannot be removed.
    pub fn remove_attribute(&mut self, target: &Target, name: &str) -> Result<Option<AttributeValue>> {
        if let Some(attr) = VirtualAttribute::lookup(name) {
            if self.virtual_attribute(target, attr).is_some() {
                return Err(Error::ReadOnlyAttribute(name.to_string()));
            }
        }
        let bag = self.attribute_bag_mut(target)?;
        let old = bag.remove(name);
        if old.is_some() {
            self.emit(ChangeEvent::AttributeChanged {
                target: target.clone(),
                name: name.to_string(),
                old_value: old.clone(),
            });
            self.flush_events();
        }
        Ok(old)
    }

    /// Remove all stored attributes of an entity.
    pub fn clear_attributes(&mut self, target: &Target) -> Result<()> {
        let bag = self.attribute_bag_mut(target)?;
        let removed: Vec<(String, AttributeValue)> = bag
            .names()
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|name| bag.get(&name).cloned().map(|value| (name, value)))
            .collect();
        bag.clear();
        for (name, value) in removed {
            self.emit(ChangeEvent::AttributeChanged {
                target: target.clone(),
                name,
                old_value: Some(value),
            });
        }
        self.flush_events();
        Ok(())
    }

    fn attribute_bag(&self, target: &Target) -> Option<&Attributes> {
        match target {
            Target::Document => Some(&self.attributes),
            Target::Page(id) => self.pages.get(id).map(|page| &page.attributes),
            Target::Word(id) => self.words.get(id.index()).map(|word| &word.attributes),
            Target::Region(id) => self.regions.get(id.index()).map(|region| &region.attributes),
            Target::Annotation(id) => self.annotation(*id).map(|annot| &annot.attributes),
            Target::Font(name) => self.fonts.get(name).map(|font| &font.attributes),
            Target::Supplement(id) => self.supplements.get(id).map(|supp| &supp.attributes),
        }
    }

    fn attribute_bag_mut(&mut self, target: &Target) -> Result<&mut Attributes> {
        match target {
            Target::Document => Ok(&mut self.attributes),
            Target::Page(id) => self
                .pages
                .get_mut(id)
                .map(|page| &mut page.attributes)
                .ok_or(Error::UnknownPage(*id)),
            Target::Word(id) => self
                .words
                .get_mut(id.index())
                .map(|word| &mut word.attributes)
                .ok_or(Error::UnknownWord(*id)),
            Target::Region(id) => self
                .regions
                .get_mut(id.index())
                .map(|region| &mut region.attributes)
                .ok_or(Error::UnknownRegion(*id)),
            Target::Annotation(id) => self
                .annotations
                .get_mut(id.index())
                .and_then(Option::as_mut)
                .map(|annot| &mut annot.attributes)
                .ok_or(Error::UnknownAnnotation(*id)),
            Target::Font(name) => self
                .fonts
                .get_mut(name)
                .map(|font| &mut font.attributes)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown font '{}'", name))),
            Target::Supplement(id) => self
                .supplements
                .get_mut(id)
                .map(|supp| &mut supp.attributes)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown supplement '{}'", id))),
        }
    }

    /// Outer `None`: the virtual name does not apply to this target.
    /// Inner `None`: it applies but currently has no value (e.g. no successor).
    fn virtual_attribute(&self, target: &Target, attr: VirtualAttribute) -> Option<Option<AttributeValue>> {
        match target {
            Target::Word(id) => {
                let word = self.word(*id)?;
                let local_id = |w: Option<WordId>| {
                    w.and_then(|w| self.word(w))
                        .map(|w| AttributeValue::from(w.local_id()))
                };
                match attr {
                    VirtualAttribute::String => Some(Some(word.string().into())),
                    VirtualAttribute::BoundingBox => Some(Some(word.bounds().to_string().into())),
                    VirtualAttribute::PageId => Some(Some(word.page_id().into())),
                    VirtualAttribute::NextWord => Some(local_id(word.next_word())),
                    VirtualAttribute::PreviousWord => Some(local_id(word.previous_word())),
                    VirtualAttribute::NextRelation => {
                        Some(Some(word.next_relation().to_string().into()))
                    },
                    VirtualAttribute::TextStreamType => Some(Some(word.text_stream_type().into())),
                    VirtualAttribute::TextStreamId => Some(local_id(Some(word.text_stream_head()))),
                    _ => None,
                }
            },
            Target::Annotation(id) => {
                let annot = self.annotation(*id)?;
                let word_local_id = |w: WordId| self.word(w).map(|w| AttributeValue::from(w.local_id()));
                let page_of = |w: WordId| self.word(w).map(|w| AttributeValue::from(w.page_id()));
                match attr {
                    VirtualAttribute::FirstWord => Some(word_local_id(annot.first_word())),
                    VirtualAttribute::LastWord => Some(word_local_id(annot.last_word())),
                    VirtualAttribute::Type => Some(Some(annot.annotation_type().into())),
                    VirtualAttribute::PageId => Some(page_of(annot.first_word())),
                    VirtualAttribute::LastPageId => Some(page_of(annot.last_word())),
                    _ => None,
                }
            },
            Target::Region(id) => {
                let region = self.region(*id)?;
                match attr {
                    VirtualAttribute::BoundingBox => Some(Some(region.bounds().to_string().into())),
                    VirtualAttribute::PageId => Some(Some(region.page_id().into())),
                    VirtualAttribute::Type => Some(Some(region.region_type().into())),
                    _ => None,
                }
            },
            Target::Page(id) => {
                let page = self.page(*id)?;
                match attr {
                    VirtualAttribute::BoundingBox => Some(Some(page.bounds().to_string().into())),
                    VirtualAttribute::PageId => Some(Some(page.id().into())),
                    _ => None,
                }
            },
            _ => None,
        }
    }

    fn set_virtual_attribute(&mut self, target: &Target, attr: VirtualAttribute, value: AttributeValue) -> Result<()> {
        let as_string = |value: &AttributeValue| -> Result<String> {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::InvalidArgument(format!("'{}' expects a string value", attr.name())))
        };
        match (target, attr) {
            (Target::Word(id), VirtualAttribute::String) => self.set_word_string(*id, as_string(&value)?),
            (Target::Word(id), VirtualAttribute::NextWord) => {
                let next = self.word_from_value(&value)?;
                self.set_next_word(*id, next)
            },
            (Target::Word(id), VirtualAttribute::PreviousWord) => {
                let prev = self.word_from_value(&value)?;
                self.set_previous_word(*id, prev)
            },
            (Target::Word(id), VirtualAttribute::NextRelation) => {
                let relation: NextRelation = as_string(&value)?.parse()?;
                self.set_next_relation(*id, relation)
            },
            (Target::Word(id), VirtualAttribute::TextStreamType) => {
                self.set_text_stream_type(*id, &as_string(&value)?)
            },
            (Target::Annotation(id), VirtualAttribute::Type) => {
                self.set_annotation_type(*id, &as_string(&value)?)
            },
            (Target::Annotation(id), VirtualAttribute::FirstWord) => {
                let word = self
                    .word_from_value(&value)?
                    .ok_or_else(|| Error::InvalidArgument("firstWord cannot be null".to_string()))?;
                self.set_annotation_first_word(*id, word).map(|_| ())
            },
            (Target::Annotation(id), VirtualAttribute::LastWord) => {
                let word = self
                    .word_from_value(&value)?
                    .ok_or_else(|| Error::InvalidArgument("lastWord cannot be null".to_string()))?;
                self.set_annotation_last_word(*id, word).map(|_| ())
            },
            (Target::Region(id), VirtualAttribute::Type) => self.set_region_type(*id, &as_string(&value)?),
            (_, attr) => Err(Error::ReadOnlyAttribute(attr.name().to_string())),
        }
    }

    fn word_from_value(&self, value: &AttributeValue) -> Result<Option<WordId>> {
        match value {
            AttributeValue::Null => Ok(None),
            AttributeValue::String(local_id) => self
                .word_by_local_id(local_id)
                .map(Some)
                .ok_or_else(|| Error::InvalidArgument(format!("no word with local id '{}'", local_id))),
            other => Err(Error::InvalidArgument(format!("expected a word local id, found {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attributes_basic_operations() {
        let mut attrs = Attributes::new();
        assert!(attrs.is_empty());
        assert_eq!(attrs.set("lang", "en"), None);
        assert_eq!(attrs.set("lang", "de"), Some(json!("en")));
        assert_eq!(attrs.get_str("lang"), Some("de"));
        assert!(attrs.has("lang"));
        attrs.set("count", 3);
        assert_eq!(attrs.get_u64("count"), Some(3));
        assert_eq!(attrs.names().collect::<Vec<_>>(), vec!["lang", "count"]);
        assert_eq!(attrs.remove("lang"), Some(json!("de")));
        assert_eq!(attrs.len(), 1);
        let fallback = json!("none");
        assert_eq!(attrs.get_or("missing", &fallback), &fallback);
        attrs.clear();
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_merge_missing_keeps_receiver_values() {
        let mut a = Attributes::new();
        a.set("x", 1);
        let mut b = Attributes::new();
        b.set("x", 2);
        b.set("y", 3);
        a.merge_missing(&b);
        assert_eq!(a.get("x"), Some(&json!(1)));
        assert_eq!(a.get("y"), Some(&json!(3)));
    }

    #[test]
    fn test_virtual_attribute_lookup() {
        for attr in VirtualAttribute::ALL {
            assert_eq!(VirtualAttribute::lookup(attr.name()), Some(attr));
        }
        assert_eq!(VirtualAttribute::lookup("prevWord"), Some(VirtualAttribute::PreviousWord));
        assert_eq!(VirtualAttribute::lookup("color"), None);
    }
}
