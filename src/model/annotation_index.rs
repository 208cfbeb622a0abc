//! Document annotation indices.
//!
//! Annotations are indexed five ways: by composite uid, by type, by first
//! word, by last word and by every page they touch. Apart from the uid
//! buckets every index is an [`AnnotationList`] kept in nesting order (first
//! word ascending, last word descending, creation order).
//!
//! Relinking words changes stream positions under the lists' feet, so the
//! lists are only *nearly* sorted at times. Insertion therefore descends
//! binarily and then corrects locally, and removal falls back to a linear
//! scan when the descent misses.

use crate::error::{Error, Result};
use crate::model::annotation::{annotation_uid, Annotation, AnnotationId};
use crate::model::attributes::AttributeValue;
use crate::model::document::Document;
use crate::model::events::{ChangeEvent, Target};
use crate::model::order::{annotation_order, text_stream_order, tolerant_sort};
use crate::model::word::{NextRelation, Word, WordId};
use crate::text::hyphenation::HyphenationHandler;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

fn compare_ids(words: &[Word], annotations: &[Option<Annotation>], a: AnnotationId, b: AnnotationId) -> Ordering {
    let lookup = |id: AnnotationId| annotations.get(id.index()).and_then(Option::as_ref);
    match (lookup(a), lookup(b)) {
        (Some(x), Some(y)) => annotation_order(words, x, y),
        _ => a.cmp(&b),
    }
}

/// A nearly sorted list of annotation handles.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnnotationList {
    items: Vec<AnnotationId>,
}

impl AnnotationList {
    pub(crate) fn as_slice(&self) -> &[AnnotationId] {
        &self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First index whose element compares greater than `id`.
    fn upper_bound<F>(&self, id: AnnotationId, cmp: &F) -> usize
    where
        F: Fn(AnnotationId, AnnotationId) -> Ordering,
    {
        let (mut lo, mut hi) = (0, self.items.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            if cmp(self.items[mid], id) == Ordering::Greater {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }

    pub(crate) fn insert<F>(&mut self, id: AnnotationId, cmp: F)
    where
        F: Fn(AnnotationId, AnnotationId) -> Ordering,
    {
        let mut pos = self.upper_bound(id, &cmp);
        while pos > 0 && cmp(self.items[pos - 1], id) == Ordering::Greater {
            pos -= 1;
        }
        while pos < self.items.len() && cmp(self.items[pos], id) != Ordering::Greater {
            pos += 1;
        }
        self.items.insert(pos, id);
    }

    pub(crate) fn remove<F>(&mut self, id: AnnotationId, cmp: F) -> bool
    where
        F: Fn(AnnotationId, AnnotationId) -> Ordering,
    {
        let pos = self.upper_bound(id, &cmp);
        let mut i = pos;
        while i > 0 && cmp(self.items[i - 1], id) != Ordering::Less {
            i -= 1;
            if self.items[i] == id {
                self.items.remove(i);
                return true;
            }
        }
        match self.items.iter().position(|item| *item == id) {
            Some(i) => {
                self.items.remove(i);
                true
            },
            None => false,
        }
    }

    pub(crate) fn resort<F>(&mut self, cmp: F)
    where
        F: Fn(AnnotationId, AnnotationId) -> Ordering,
    {
        tolerant_sort(&mut self.items, |a, b| cmp(*a, *b));
    }
}

/// The five annotation indices of a document.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnnotationIndex {
    by_uid: HashMap<String, Vec<AnnotationId>>,
    all: AnnotationList,
    by_type: BTreeMap<String, AnnotationList>,
    by_first: HashMap<WordId, AnnotationList>,
    by_last: HashMap<WordId, AnnotationList>,
    by_page: BTreeMap<u32, AnnotationList>,
}

impl AnnotationIndex {
    fn page_range(words: &[Word], annotation: &Annotation) -> std::ops::RangeInclusive<u32> {
        let first = words[annotation.first_word.index()].page_id;
        let last = words[annotation.last_word.index()].page_id;
        first.min(last)..=first.max(last)
    }

    pub(crate) fn insert(&mut self, words: &[Word], annotations: &[Option<Annotation>], id: AnnotationId) {
        let Some(annotation) = annotations.get(id.index()).and_then(Option::as_ref) else {
            return;
        };
        let cmp = |a, b| compare_ids(words, annotations, a, b);
        self.by_uid.entry(annotation.uid.clone()).or_default().push(id);
        self.all.insert(id, cmp);
        self.by_type
            .entry(annotation.annotation_type.clone())
            .or_default()
            .insert(id, cmp);
        self.by_first.entry(annotation.first_word).or_default().insert(id, cmp);
        self.by_last.entry(annotation.last_word).or_default().insert(id, cmp);
        for page in Self::page_range(words, annotation) {
            self.by_page.entry(page).or_default().insert(id, cmp);
        }
    }

    pub(crate) fn remove(&mut self, words: &[Word], annotations: &[Option<Annotation>], id: AnnotationId) {
        let Some(annotation) = annotations.get(id.index()).and_then(Option::as_ref) else {
            return;
        };
        let cmp = |a, b| compare_ids(words, annotations, a, b);
        if let Some(bucket) = self.by_uid.get_mut(&annotation.uid) {
            bucket.retain(|other| *other != id);
            if bucket.is_empty() {
                self.by_uid.remove(&annotation.uid);
            }
        }
        self.all.remove(id, cmp);
        Self::remove_keyed(&mut self.by_type, &annotation.annotation_type, id, cmp);
        Self::remove_keyed_hash(&mut self.by_first, &annotation.first_word, id, cmp);
        Self::remove_keyed_hash(&mut self.by_last, &annotation.last_word, id, cmp);
        for page in Self::page_range(words, annotation) {
            Self::remove_keyed(&mut self.by_page, &page, id, cmp);
        }
    }

    fn remove_keyed<K, F>(map: &mut BTreeMap<K, AnnotationList>, key: &K, id: AnnotationId, cmp: F)
    where
        K: Ord,
        F: Fn(AnnotationId, AnnotationId) -> Ordering,
    {
        if let Some(list) = map.get_mut(key) {
            list.remove(id, cmp);
            if list.is_empty() {
                map.remove(key);
            }
        }
    }

    fn remove_keyed_hash<F>(map: &mut HashMap<WordId, AnnotationList>, key: &WordId, id: AnnotationId, cmp: F)
    where
        F: Fn(AnnotationId, AnnotationId) -> Ordering,
    {
        if let Some(list) = map.get_mut(key) {
            list.remove(id, cmp);
            if list.is_empty() {
                map.remove(key);
            }
        }
    }

    pub(crate) fn all(&self) -> &[AnnotationId] {
        self.all.as_slice()
    }

    pub(crate) fn len(&self) -> usize {
        self.all.len()
    }

    pub(crate) fn of_type(&self, annotation_type: &str) -> &[AnnotationId] {
        self.by_type.get(annotation_type).map(AnnotationList::as_slice).unwrap_or(&[])
    }

    pub(crate) fn starting_at(&self, word: WordId) -> &[AnnotationId] {
        self.by_first.get(&word).map(AnnotationList::as_slice).unwrap_or(&[])
    }

    pub(crate) fn ending_at(&self, word: WordId) -> &[AnnotationId] {
        self.by_last.get(&word).map(AnnotationList::as_slice).unwrap_or(&[])
    }

    pub(crate) fn on_page(&self, page_id: u32) -> &[AnnotationId] {
        self.by_page.get(&page_id).map(AnnotationList::as_slice).unwrap_or(&[])
    }

    pub(crate) fn with_uid(&self, uid: &str) -> &[AnnotationId] {
        self.by_uid.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    /// Uid buckets holding more than one annotation.
    pub(crate) fn duplicate_buckets(&self) -> Vec<Vec<AnnotationId>> {
        let mut buckets: Vec<Vec<AnnotationId>> = self
            .by_uid
            .values()
            .filter(|bucket| bucket.len() > 1)
            .cloned()
            .collect();
        buckets.sort_by_key(|bucket| bucket.iter().min().copied());
        buckets
    }

    /// Re-establish the order of every list.
    pub(crate) fn resort(&mut self, words: &[Word], annotations: &[Option<Annotation>]) {
        let cmp = |a, b| compare_ids(words, annotations, a, b);
        self.all.resort(cmp);
        for list in self.by_type.values_mut() {
            list.resort(cmp);
        }
        for list in self.by_first.values_mut().chain(self.by_last.values_mut()) {
            list.resort(cmp);
        }
        for list in self.by_page.values_mut() {
            list.resort(cmp);
        }
    }
}

impl Document {
    fn index_annotation(&mut self, id: AnnotationId) {
        let Document {
            annotation_index,
            words,
            annotations,
            ..
        } = self;
        annotation_index.insert(words, annotations, id);
    }

    fn unindex_annotation(&mut self, id: AnnotationId) {
        let Document {
            annotation_index,
            words,
            annotations,
            ..
        } = self;
        annotation_index.remove(words, annotations, id);
    }

    fn live_annotation(&self, id: AnnotationId) -> Result<&Annotation> {
        self.annotation(id).ok_or(Error::UnknownAnnotation(id))
    }

    fn uid_of(&self, annotation_type: &str, first: WordId, last: WordId) -> String {
        annotation_uid(
            annotation_type,
            &self.words[first.index()].local_id(),
            &self.words[last.index()].local_id(),
        )
    }

    fn same_stream(&self, a: WordId, b: WordId) -> bool {
        self.words[a.index()].stream_head == self.words[b.index()].stream_head
    }

    /// Annotate the words from `first` to `last` with a type.
    ///
    /// Endpoints given in reverse stream order are swapped. Endpoints in
    /// different text streams yield `Ok(None)` and leave the document as is.
    pub fn add_annotation(&mut self, first: WordId, last: WordId, annotation_type: &str) -> Result<Option<AnnotationId>> {
        self.check_word(first)?;
        self.check_word(last)?;
        if !self.same_stream(first, last) {
            log::debug!(
                "Not annotating {} to {} as '{}': different text streams",
                first,
                last,
                annotation_type
            );
            return Ok(None);
        }
        let (first, last) = match text_stream_order(&self.words, first, last) {
            Ordering::Greater => (last, first),
            _ => (first, last),
        };
        let id = AnnotationId(self.annotations.len() as u32);
        let created = self.next_created;
        self.next_created += 1;
        let uid = self.uid_of(annotation_type, first, last);
        self.annotations.push(Some(Annotation {
            id,
            annotation_type: annotation_type.to_string(),
            first_word: first,
            last_word: last,
            created,
            uid,
            attributes: Default::default(),
        }));
        self.index_annotation(id);
        self.emit(ChangeEvent::AnnotationAdded { annotation: id });
        self.flush_events();
        Ok(Some(id))
    }

    /// Remove an annotation; returns false when it was not live.
    pub fn remove_annotation(&mut self, id: AnnotationId) -> bool {
        if self.annotation(id).is_none() {
            return false;
        }
        self.unindex_annotation(id);
        let Some(annotation) = self.annotations[id.index()].take() else {
            return false;
        };
        self.emit(ChangeEvent::AnnotationRemoved {
            annotation: id,
            annotation_type: annotation.annotation_type,
        });
        self.flush_events();
        true
    }

    /// Live annotation by handle.
    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(id.index()).and_then(Option::as_ref)
    }

    /// Change the type of an annotation.
    pub fn set_annotation_type(&mut self, id: AnnotationId, annotation_type: &str) -> Result<()> {
        let annotation = self.live_annotation(id)?;
        if annotation.annotation_type == annotation_type {
            return Ok(());
        }
        let uid = self.uid_of(annotation_type, annotation.first_word, annotation.last_word);
        self.unindex_annotation(id);
        let mut old_type = String::new();
        if let Some(annotation) = self.annotations[id.index()].as_mut() {
            old_type = std::mem::replace(&mut annotation.annotation_type, annotation_type.to_string());
            annotation.uid = uid;
        }
        self.index_annotation(id);
        self.emit(ChangeEvent::TypeChanged {
            target: Target::Annotation(id),
            old_type,
        });
        self.flush_events();
        Ok(())
    }

    /// Move the first word of an annotation.
    ///
    /// Returns `Ok(false)` without changes when `word` lies in another text
    /// stream than the annotation's last word.
    pub fn set_annotation_first_word(&mut self, id: AnnotationId, word: WordId) -> Result<bool> {
        let last = self.live_annotation(id)?.last_word;
        self.set_annotation_words(id, word, last)
    }

    /// Move the last word of an annotation.
    ///
    /// Returns `Ok(false)` without changes when `word` lies in another text
    /// stream than the annotation's first word.
    pub fn set_annotation_last_word(&mut self, id: AnnotationId, word: WordId) -> Result<bool> {
        let first = self.live_annotation(id)?.first_word;
        self.set_annotation_words(id, first, word)
    }

    /// Move both endpoints of an annotation at once.
    ///
    /// Returns `Ok(false)` without changes when the endpoints lie in
    /// different text streams.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `first` follows `last`.
    pub fn set_annotation_words(&mut self, id: AnnotationId, first: WordId, last: WordId) -> Result<bool> {
        self.check_word(first)?;
        self.check_word(last)?;
        let annotation = self.live_annotation(id)?;
        let (old_first, old_last) = (annotation.first_word, annotation.last_word);
        if (old_first, old_last) == (first, last) {
            return Ok(true);
        }
        if !self.same_stream(first, last) {
            log::warn!("Ignoring endpoint change of {}: {} and {} are in different text streams", id, first, last);
            return Ok(false);
        }
        if text_stream_order(&self.words, first, last) == Ordering::Greater {
            return Err(Error::InvalidArgument(format!(
                "first word {} of {} would follow its last word {}",
                self.words[first.index()].local_id(),
                id,
                self.words[last.index()].local_id()
            )));
        }
        let uid = self.uid_of(&annotation.annotation_type, first, last);
        self.unindex_annotation(id);
        if let Some(annotation) = self.annotations[id.index()].as_mut() {
            annotation.first_word = first;
            annotation.last_word = last;
            annotation.uid = uid;
        }
        self.index_annotation(id);
        for (name, old, new) in [("firstWord", old_first, first), ("lastWord", old_last, last)] {
            if old != new {
                self.emit(ChangeEvent::AttributeChanged {
                    target: Target::Annotation(id),
                    name: name.to_string(),
                    old_value: Some(AttributeValue::from(self.words[old.index()].local_id())),
                });
            }
        }
        self.flush_events();
        Ok(true)
    }

    /// Merge annotations that share type and endpoints.
    ///
    /// In every group of duplicates the earliest created annotation survives
    /// and takes over the attributes of the others it does not have yet; the
    /// others are removed. Returns the number of removed annotations.
    pub fn cleanup_annotations(&mut self) -> usize {
        let mut removed = 0;
        for mut bucket in self.annotation_index.duplicate_buckets() {
            bucket.sort_by_key(|id| self.annotation(*id).map(|a| a.created));
            let Some((&survivor, losers)) = bucket.split_first() else {
                continue;
            };
            for &loser in losers {
                let attributes = match self.annotation(loser) {
                    Some(annotation) => annotation.attributes.clone(),
                    None => continue,
                };
                if let Some(annotation) = self.annotations[survivor.index()].as_mut() {
                    annotation.attributes.merge_missing(&attributes);
                }
                if self.remove_annotation(loser) {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            log::debug!("Merged {} duplicate annotations", removed);
        }
        removed
    }

    /// All live annotations in nesting order.
    pub fn annotations(&self) -> Vec<AnnotationId> {
        self.annotation_index.all().to_vec()
    }

    /// Number of live annotations.
    pub fn annotation_count(&self) -> usize {
        self.annotation_index.len()
    }

    /// Annotations of one type in nesting order.
    pub fn annotations_of_type(&self, annotation_type: &str) -> Vec<AnnotationId> {
        self.annotation_index.of_type(annotation_type).to_vec()
    }

    /// Annotations whose first word is `word`.
    pub fn annotations_starting_at(&self, word: WordId) -> Vec<AnnotationId> {
        self.annotation_index.starting_at(word).to_vec()
    }

    /// Annotations whose last word is `word`.
    pub fn annotations_ending_at(&self, word: WordId) -> Vec<AnnotationId> {
        self.annotation_index.ending_at(word).to_vec()
    }

    /// Annotations touching a page.
    pub fn annotations_on_page(&self, page_id: u32) -> Vec<AnnotationId> {
        self.annotation_index.on_page(page_id).to_vec()
    }

    /// Annotations with a composite uid (more than one until cleaned up).
    pub fn annotations_by_uid(&self, uid: &str) -> Vec<AnnotationId> {
        self.annotation_index.with_uid(uid).to_vec()
    }

    /// The earliest annotation with a composite uid.
    pub fn annotation_by_uid(&self, uid: &str) -> Option<AnnotationId> {
        self.annotation_index
            .with_uid(uid)
            .iter()
            .copied()
            .min_by_key(|id| self.annotation(*id).map(|a| a.created))
    }

    /// Annotation types in use, sorted.
    pub fn annotation_types(&self) -> Vec<String> {
        self.annotation_index.types().map(str::to_string).collect()
    }

    /// Words spanned by an annotation, first to last.
    pub fn annotation_words(&self, id: AnnotationId) -> Vec<WordId> {
        let Some(annotation) = self.annotation(id) else {
            return Vec::new();
        };
        let mut words = Vec::new();
        let mut current = Some(annotation.first_word);
        while let Some(w) = current {
            if words.len() > self.words.len() {
                break;
            }
            words.push(w);
            if w == annotation.last_word {
                break;
            }
            current = self.words[w.index()].next;
        }
        words
    }

    /// Text of an annotation, joining words by their next relations.
    pub fn annotation_value(&self, id: AnnotationId) -> String {
        let words = self.annotation_words(id);
        let mut value = String::new();
        for (i, w) in words.iter().enumerate() {
            let word = &self.words[w.index()];
            let is_last = i + 1 == words.len();
            match word.next_relation {
                NextRelation::Hyphenated if !is_last => {
                    value.push_str(HyphenationHandler::strip_hyphen(&word.string))
                },
                NextRelation::Continue => value.push_str(&word.string),
                _ => {
                    value.push_str(&word.string);
                    if !is_last {
                        value.push(' ');
                    }
                },
            }
        }
        value
    }

    /// Re-index every annotation anchored at one of the given words.
    pub(crate) fn reindex_annotations_for(&mut self, renumbered: &[WordId]) {
        if renumbered.is_empty() {
            return;
        }
        let mut affected: Vec<AnnotationId> = Vec::new();
        for &word in renumbered {
            for &id in self
                .annotation_index
                .starting_at(word)
                .iter()
                .chain(self.annotation_index.ending_at(word))
            {
                if !affected.contains(&id) {
                    affected.push(id);
                }
            }
        }
        for &id in &affected {
            self.unindex_annotation(id);
        }
        for &id in &affected {
            self.index_annotation(id);
        }
    }

    /// Restore the order of every annotation list.
    pub fn resort_annotations(&mut self) {
        let Document {
            annotation_index,
            words,
            annotations,
            ..
        } = self;
        annotation_index.resort(words, annotations);
    }
}
